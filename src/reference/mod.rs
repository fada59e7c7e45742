//! Note reference grammar.
//!
//! A note refers to another note by embedding its id in one of two forms:
//!
//! - `note://123456789` anywhere in the text
//! - a Markdown link whose target is the bare id, e.g. `[Intro](123456789)`
//!
//! Ids are 9 or 10 ASCII digits. Every other module (scanner, backlinks,
//! link resolver) asks this module what counts as a reference, so the rule
//! lives in exactly one place.

mod backlinks;
mod context;
mod scanner;

use std::sync::OnceLock;

use regex::Regex;

pub use backlinks::backlinks;
pub use context::build_note_context;
pub use scanner::{referenced_notes, resolve_references, scan_references, References};

/// URL scheme prefix for internal note links.
pub const NOTE_SCHEME: &str = "note://";

/// Shortest accepted id length.
pub const MIN_ID_LEN: usize = 9;
/// Longest accepted id length.
pub const MAX_ID_LEN: usize = 10;

// Capture group 1: the full digit run following either surface syntax.
// The run is captured maximally and length-checked afterwards so an id is
// never matched as the prefix of a longer number.
const REFERENCE_PATTERN: &str = r"(?:note://|\]\()([0-9]+)";

fn reference_regex() -> &'static Regex {
    static REFERENCE_REGEX: OnceLock<Regex> = OnceLock::new();
    REFERENCE_REGEX.get_or_init(|| Regex::new(REFERENCE_PATTERN).unwrap())
}

/// Check whether `s` is a well-formed note id (9 or 10 ASCII digits).
pub fn is_note_id(s: &str) -> bool {
    (MIN_ID_LEN..=MAX_ID_LEN).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// How an href relates to the note reference syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Href<'a> {
    /// `note://<id>` or a bare id, with a well-formed id.
    Note(&'a str),
    /// `note://` followed by something that is not a valid id.
    MalformedNote(&'a str),
    /// Anything else.
    Other,
}

/// Classify an href against the reference grammar.
pub fn parse_href(href: &str) -> Href<'_> {
    if let Some(rest) = href.strip_prefix(NOTE_SCHEME) {
        if is_note_id(rest) {
            Href::Note(rest)
        } else {
            Href::MalformedNote(rest)
        }
    } else if is_note_id(href) {
        Href::Note(href)
    } else {
        Href::Other
    }
}

/// Extract the referenced id from a link href, if it is a note reference.
///
/// ```
/// use notelink::reference::parse_reference;
/// assert_eq!(parse_reference("note://123456789"), Some("123456789"));
/// assert_eq!(parse_reference("1234567890"), Some("1234567890"));
/// assert_eq!(parse_reference("12345678"), None);
/// assert_eq!(parse_reference("https://example.com"), None);
/// ```
pub fn parse_reference(href: &str) -> Option<&str> {
    match parse_href(href) {
        Href::Note(id) => Some(id),
        _ => None,
    }
}

/// Check whether an href is a note reference.
pub fn is_reference(href: &str) -> bool {
    parse_reference(href).is_some()
}

/// Canonical `note://<id>` form of a reference.
pub fn note_url(id: &str) -> String {
    format!("{}{}", NOTE_SCHEME, id)
}

/// Iterate over every reference id embedded in `content`, in order of
/// appearance, duplicates included.
pub fn reference_ids(content: &str) -> impl Iterator<Item = &str> + '_ {
    reference_regex()
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .filter(|id| is_note_id(id))
}

/// Check whether `content` contains a reference to `target_id`.
pub fn references_target(content: &str, target_id: &str) -> bool {
    reference_ids(content).any(|id| id == target_id)
}
