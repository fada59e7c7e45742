//! Query parsing, list filtering and sorting over note snapshots.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Note;

/// Category value that selects uncategorized notes.
pub const UNCATEGORIZED: &str = "none";

/// Parsed search filter from query string.
///
/// Filters can be specified in the query string using prefixes:
/// - `tag:important` - Filter by tag (can specify multiple)
/// - `category:work` - Filter by category (`category:none` for uncategorized)
/// - `created:>2025-01-01` - Created after date
/// - `created:<2025-12-31` - Created before date
#[derive(Debug, Default, Clone)]
pub struct SearchFilter {
    /// Tag filters (note must have all specified tags)
    pub tags: Vec<String>,
    pub category: Option<String>,
    /// Created after this date/time
    pub created_after: Option<DateTime<Utc>>,
    /// Created before this date/time
    pub created_before: Option<DateTime<Utc>>,
}

impl SearchFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if filter has any constraints.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
            && self.category.is_none()
            && self.created_after.is_none()
            && self.created_before.is_none()
    }

    pub fn matches(&self, note: &Note) -> bool {
        if !self.tags.iter().all(|t| note.tags.contains(t)) {
            return false;
        }

        match self.category.as_deref() {
            Some(UNCATEGORIZED) if !note.category.is_empty() => return false,
            Some(UNCATEGORIZED) | None => {}
            Some(category) if note.category != category => return false,
            Some(_) => {}
        }

        if let Some(after) = self.created_after {
            if note.created() <= after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if note.created() >= before {
                return false;
            }
        }

        true
    }
}

/// Parse a raw query string into (remaining query text, filters).
///
/// # Examples
///
/// ```
/// use notelink::search::parse_query;
///
/// let (query, filter) = parse_query("tag:rust category:work borrow checker");
/// assert_eq!(query, "borrow checker");
/// assert_eq!(filter.tags, vec!["rust".to_string()]);
/// assert_eq!(filter.category, Some("work".to_string()));
/// ```
pub fn parse_query(raw: &str) -> (String, SearchFilter) {
    let mut filter = SearchFilter::default();
    let mut remaining = Vec::new();

    for token in raw.split_whitespace() {
        if let Some(value) = token.strip_prefix("tag:") {
            filter.tags.push(value.to_string());
        } else if let Some(value) = token.strip_prefix("category:") {
            filter.category = Some(value.to_string());
        } else if let Some(value) = token.strip_prefix("created:>") {
            filter.created_after = parse_date(value);
        } else if let Some(value) = token.strip_prefix("created:<") {
            filter.created_before = parse_date(value);
        } else {
            remaining.push(token);
        }
    }

    (remaining.join(" "), filter)
}

/// Parse a date string into DateTime<Utc>.
/// Supports ISO 8601 date format (YYYY-MM-DD) or full datetime.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    // Try full datetime first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Try date only (YYYY-MM-DD) - set to midnight UTC
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let datetime = date.and_hms_opt(0, 0, 0)?;
        return Some(DateTime::from_naive_utc_and_offset(datetime, Utc));
    }

    None
}

/// Notes matching `text` and `filter`, in input order.
///
/// `text` is matched case-insensitively as a substring of the title, the
/// content or any tag. Empty text matches everything.
pub fn filter_notes<'a>(notes: &'a [Note], text: &str, filter: &SearchFilter) -> Vec<&'a Note> {
    let needle = text.trim().to_lowercase();

    notes
        .iter()
        .filter(|note| filter.matches(note))
        .filter(|note| {
            needle.is_empty()
                || note.title.to_lowercase().contains(&needle)
                || note.content.to_lowercase().contains(&needle)
                || note.tags.iter().any(|t| t.to_lowercase().contains(&needle))
        })
        .collect()
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    Updated,
    Created,
    Title,
    Category,
    TagCount,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Sort in place. Ties fall back to id so output is deterministic.
pub fn sort_notes(notes: &mut [&Note], by: SortBy, order: SortOrder) {
    notes.sort_by(|a, b| {
        let primary = match by {
            SortBy::Updated => a.updated_at.cmp(&b.updated_at),
            SortBy::Created => a.created_at.cmp(&b.created_at),
            SortBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortBy::Category => a.category.cmp(&b.category),
            SortBy::TagCount => a.tags.len().cmp(&b.tags.len()),
        };
        let primary = match order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        match primary {
            Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        }
    });
}

/// Category counts for the sidebar view.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    /// Non-empty categories, sorted by name
    pub categories: BTreeMap<String, usize>,
    pub uncategorized: usize,
}

pub fn categories(notes: &[Note]) -> CategorySummary {
    let mut summary = CategorySummary::default();
    for note in notes {
        if note.category.is_empty() {
            summary.uncategorized += 1;
        } else {
            *summary.categories.entry(note.category.clone()).or_insert(0) += 1;
        }
    }
    summary
}
