//! Export and import of the note collection.
//!
//! Two formats are supported: a Markdown snapshot meant for browsing (one
//! file per note plus an index) and a JSON backup that round-trips through
//! `import`.

mod backup;
mod markdown;
pub mod utils;

use chrono::Utc;

use crate::Result;

pub use self::backup::{
    export_json, import_notes, parse_backup, Backup, ImportReport, ImportStrategy,
    BACKUP_VERSION,
};
pub use self::markdown::{export_markdown, ExportStats};
pub use self::utils::{format_date, format_timestamp, slugify};

/// Generate YAML frontmatter block
pub fn yaml_frontmatter<T: serde::Serialize>(data: &T) -> Result<String> {
    let yaml = serde_yaml::to_string(data).map_err(|e| {
        crate::error::NotelinkError::Storage(format!("YAML serialization failed: {}", e))
    })?;
    Ok(format!("---\n{}---\n", yaml))
}

/// Get current timestamp for "generated" footers
pub fn current_timestamp() -> String {
    format_timestamp(&Utc::now())
}
