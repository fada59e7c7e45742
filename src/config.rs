use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::search::{SortBy, SortOrder};

const CONFIG_FILE: &str = "config.json";

/// Project settings stored in `.notelink/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Author name recorded in exports
    pub user_name: Option<String>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    /// Characters of each referenced note included by `context`
    pub context_snippet_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_name: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            context_snippet_chars: 1000,
        }
    }
}

impl Config {
    /// Load settings from `notelink_dir`.
    ///
    /// A missing file yields defaults. So does a malformed one, with a
    /// warning logged.
    pub fn load(notelink_dir: &Path) -> Self {
        let path = notelink_dir.join(CONFIG_FILE);

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                Self::default()
            }
        }
    }

    pub fn save(&self, notelink_dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(notelink_dir.join(CONFIG_FILE), json)?;
        Ok(())
    }
}
