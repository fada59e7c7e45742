// src/entity/note.rs
use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize};

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// A Markdown note.
///
/// Serialized with camelCase keys so JSON backups stay compatible with
/// exports from the desktop app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Epoch milliseconds
    #[serde(default)]
    pub created_at: i64,
    /// Epoch milliseconds
    #[serde(default)]
    pub updated_at: i64,
    /// Attachment id -> data URL, referenced from content as `attachment:<id>`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attachments: BTreeMap<String, String>,
}

/// Word/character counts shown alongside a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoteStats {
    pub words: usize,
    pub chars: usize,
    /// Minutes, at 300 words per minute
    pub reading_time: usize,
}

const ATTACHMENT_PATTERN: &str = r"!\[([^\]]*)\]\(attachment:([^)]+)\)";
// One CJK ideograph or one ASCII word counts as a word.
const WORD_PATTERN: &str = r"[\x{4e00}-\x{9fa5}]|[A-Za-z0-9_]+";
const WORDS_PER_MINUTE: usize = 300;

impl Note {
    pub fn new(id: String, title: String) -> Self {
        let now = now_millis();
        Self {
            id,
            title,
            content: String::new(),
            category: String::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            attachments: BTreeMap::new(),
        }
    }

    /// Refresh `updated_at` after a mutation.
    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    pub fn created(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.created_at).unwrap_or_default()
    }

    pub fn updated(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.updated_at).unwrap_or_default()
    }

    /// Display title, falling back for untitled notes.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    pub fn stats(&self) -> NoteStats {
        static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
        let word_regex = WORD_REGEX.get_or_init(|| Regex::new(WORD_PATTERN).unwrap());

        let text: String = self
            .content
            .chars()
            .filter(|c| !matches!(c, '#' | '*' | '`' | '>'))
            .collect();
        let words = word_regex.find_iter(&text).count();

        NoteStats {
            words,
            chars: text.chars().count(),
            reading_time: words.div_ceil(WORDS_PER_MINUTE),
        }
    }

    /// Content with `![alt](attachment:<id>)` images replaced by their data
    /// URLs. Unknown attachment ids are left as written.
    pub fn resolve_attachments(&self) -> String {
        if self.attachments.is_empty() {
            return self.content.clone();
        }

        static ATTACHMENT_REGEX: OnceLock<Regex> = OnceLock::new();
        let attachment_regex =
            ATTACHMENT_REGEX.get_or_init(|| Regex::new(ATTACHMENT_PATTERN).unwrap());

        attachment_regex
            .replace_all(&self.content, |caps: &Captures| {
                match self.attachments.get(&caps[2]) {
                    Some(data_url) => format!("![{}]({})", &caps[1], data_url),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

// Older exports carry numeric ids.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
