//! Markdown snapshot of the whole collection.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::entity::Note;
use crate::storage::NoteStore;
use crate::Result;

use super::utils::{clear_export_dir, format_date, unique_filename, write_export_file};
use super::{current_timestamp, yaml_frontmatter};

/// Statistics about a generated export
#[derive(Debug, Default)]
pub struct ExportStats {
    pub notes: usize,
    pub files_generated: Vec<String>,
}

#[derive(Serialize)]
struct NoteFrontmatter<'a> {
    id: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "String::is_empty")]
    category: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    created: String,
    updated: String,
}

impl<'a> NoteFrontmatter<'a> {
    fn from_note(note: &'a Note) -> Self {
        Self {
            id: &note.id,
            title: &note.title,
            category: note.category.clone(),
            tags: note.tags.clone(),
            created: format_date(&note.created()),
            updated: format_date(&note.updated()),
        }
    }
}

/// Write one Markdown file per note plus a `README.md` index.
///
/// The directory is cleared first. `author` is credited in the README footer.
pub fn export_markdown(
    store: &NoteStore,
    export_dir: &Path,
    author: Option<&str>,
) -> Result<ExportStats> {
    let mut notes = store.list_notes()?;
    // Oldest first so collision suffixes land on the newer note
    notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    clear_export_dir(export_dir)?;
    std::fs::create_dir_all(export_dir)?;

    let mut stats = ExportStats::default();
    let mut used = HashSet::new();
    let mut entries = Vec::with_capacity(notes.len());

    for note in &notes {
        let frontmatter = yaml_frontmatter(&NoteFrontmatter::from_note(note))?;
        let content = format!("{}\n{}", frontmatter, note.resolve_attachments());

        let filename = unique_filename(&note.title, &note.id, &mut used);
        write_export_file(&export_dir.join(&filename), &content)?;

        entries.push((note, filename.clone()));
        stats.files_generated.push(filename);
        stats.notes += 1;
    }

    write_readme(export_dir, &entries, author)?;
    stats.files_generated.push("README.md".to_string());

    tracing::info!(notes = stats.notes, dir = %export_dir.display(), "exported markdown");
    Ok(stats)
}

fn write_readme(export_dir: &Path, entries: &[(&Note, String)], author: Option<&str>) -> Result<()> {
    let mut content = String::from("# Notes\n\n");
    content.push_str("> Auto-generated by notelink. Do not edit directly.\n\n");

    if entries.is_empty() {
        content.push_str("*No notes yet. Use `notelink add` to create your first note.*\n\n");
    } else {
        let mut by_category: BTreeMap<&str, Vec<&(&Note, String)>> = BTreeMap::new();
        let mut uncategorized = Vec::new();
        for entry in entries {
            if entry.0.category.is_empty() {
                uncategorized.push(entry);
            } else {
                by_category.entry(&entry.0.category).or_default().push(entry);
            }
        }

        for (category, notes) in by_category {
            content.push_str(&format!("## {}\n\n", category));
            push_links(&mut content, &notes);
        }
        if !uncategorized.is_empty() {
            content.push_str("## Uncategorized\n\n");
            push_links(&mut content, &uncategorized);
        }
    }

    content.push_str("---\n\n");
    match author {
        Some(name) => content.push_str(&format!(
            "*Generated: {} by {}*\n",
            current_timestamp(),
            name
        )),
        None => content.push_str(&format!("*Generated: {}*\n", current_timestamp())),
    }

    write_export_file(&export_dir.join("README.md"), &content)
}

fn push_links(content: &mut String, notes: &[&(&Note, String)]) {
    for (note, filename) in notes {
        let tags = if note.tags.is_empty() {
            String::new()
        } else {
            format!(" `{}`", note.tags.join("` `"))
        };
        content.push_str(&format!(
            "- [{}]({}){}\n",
            note.display_title(),
            filename,
            tags
        ));
    }
    content.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn add(store: &NoteStore, id: &str, title: &str, category: &str, created_at: i64) {
        let mut note = Note::new(id.to_string(), title.to_string());
        note.category = category.to_string();
        note.created_at = created_at;
        note.content = format!("Body of {}", title);
        store.add_note(&note).unwrap();
    }

    #[test]
    fn test_export_empty_store() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();
        let out = tmp.path().join("export");

        let stats = export_markdown(&store, &out, None).unwrap();

        assert_eq!(stats.notes, 0);
        assert_eq!(stats.files_generated, vec!["README.md".to_string()]);
        let readme = std::fs::read_to_string(out.join("README.md")).unwrap();
        assert!(readme.contains("No notes yet"));
    }

    #[test]
    fn test_export_writes_frontmatter_and_body() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();
        add(&store, "100000001", "Reading List", "books", 0);

        let out = tmp.path().join("export");
        export_markdown(&store, &out, None).unwrap();

        let file = std::fs::read_to_string(out.join("reading-list.md")).unwrap();
        assert!(file.starts_with("---\n"));
        assert!(file.contains("id: "));
        assert!(file.contains("100000001"));
        assert!(file.contains("category: books"));
        assert!(file.contains("created: 1970-01-01"));
        assert!(file.ends_with("Body of Reading List"));
    }

    #[test]
    fn test_export_slug_collision_uses_id() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();
        add(&store, "100000001", "Ideas", "", 1);
        add(&store, "100000002", "ideas", "", 2);

        let out = tmp.path().join("export");
        export_markdown(&store, &out, None).unwrap();

        assert!(out.join("ideas.md").exists());
        assert!(out.join("ideas-100000002.md").exists());
    }

    #[test]
    fn test_export_chinese_titles_keep_their_names() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();
        add(&store, "100000001", "学习笔记", "学习", 1);
        add(&store, "100000002", "会议记录", "", 2);

        let out = tmp.path().join("export");
        export_markdown(&store, &out, None).unwrap();

        assert!(out.join("学习笔记.md").exists());
        assert!(out.join("会议记录.md").exists());
        let readme = std::fs::read_to_string(out.join("README.md")).unwrap();
        assert!(readme.contains("- [学习笔记](学习笔记.md)"));
    }

    #[test]
    fn test_readme_groups_by_category() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();
        add(&store, "100000001", "Plan", "work", 1);
        add(&store, "100000002", "Loose", "", 2);

        let out = tmp.path().join("export");
        export_markdown(&store, &out, None).unwrap();

        let readme = std::fs::read_to_string(out.join("README.md")).unwrap();
        let work = readme.find("## work").unwrap();
        let none = readme.find("## Uncategorized").unwrap();
        assert!(work < none);
        assert!(readme.contains("- [Plan](plan.md)"));
        assert!(readme.contains("- [Loose](loose.md)"));
    }

    #[test]
    fn test_readme_credits_author() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        let out = tmp.path().join("export");
        export_markdown(&store, &out, Some("Ada")).unwrap();

        let readme = std::fs::read_to_string(out.join("README.md")).unwrap();
        assert!(readme.contains(" by Ada*"));
    }

    #[test]
    fn test_export_clears_existing() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();
        let out = tmp.path().join("export");

        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("stale.md"), "old content").unwrap();

        export_markdown(&store, &out, None).unwrap();
        assert!(!out.join("stale.md").exists());
    }
}
