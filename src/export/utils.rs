//! Utility functions for export generation

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::Result;

/// Convert a title to a file-name-safe slug
///
/// - Converts to lowercase
/// - Keeps letters and digits from any script (CJK titles stay readable)
/// - Replaces spaces, punctuation and path separators with hyphens
/// - Removes consecutive hyphens
/// - Trims leading/trailing hyphens
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // Start true to trim leading hyphens

    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug = "untitled".to_string();
    }

    slug
}

/// Pick a file name for `title`, appending the note id on collision
pub fn unique_filename(title: &str, id: &str, used: &mut HashSet<String>) -> String {
    let slug = slugify(title);

    if used.insert(slug.clone()) {
        format!("{}.md", slug)
    } else {
        let unique = format!("{}-{}", slug, id);
        used.insert(unique.clone());
        format!("{}.md", unique)
    }
}

/// Remove the export directory if it exists
pub fn clear_export_dir(export_dir: &Path) -> Result<()> {
    if !export_dir.exists() {
        return Ok(());
    }

    fs::remove_dir_all(export_dir)?;
    Ok(())
}

/// Write content to a file, creating parent directories if needed
pub fn write_export_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Format a DateTime as YYYY-MM-DD for frontmatter
pub fn format_date(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Format a DateTime as full timestamp
pub fn format_timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
