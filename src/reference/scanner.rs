//! Reference scanning: which notes does a note point at?

use std::collections::HashSet;

use crate::entity::Note;

use super::reference_ids;

/// Collect the distinct reference ids in `content`, keeping the order in
/// which each id first appears.
///
/// Unknown ids are kept; whether a target exists is decided later, against
/// a snapshot of the collection.
pub fn scan_references(content: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    reference_ids(content).filter(|id| seen.insert(*id)).collect()
}

/// References of a note split by whether the target still exists.
#[derive(Debug, Default)]
pub struct References<'a> {
    /// Target notes found in the snapshot, in discovery order.
    pub found: Vec<&'a Note>,
    /// Referenced ids with no matching note.
    pub missing: Vec<&'a str>,
}

/// Resolve every reference in `note` against `notes`.
///
/// Self-references are dropped.
pub fn resolve_references<'a>(note: &'a Note, notes: &'a [Note]) -> References<'a> {
    let mut refs = References::default();

    for id in scan_references(&note.content) {
        if id == note.id {
            continue;
        }
        match notes.iter().find(|n| n.id == id) {
            Some(target) => refs.found.push(target),
            None => refs.missing.push(id),
        }
    }

    refs
}

/// Notes referenced by `note` that exist in `notes`, excluding `note` itself.
pub fn referenced_notes<'a>(note: &'a Note, notes: &'a [Note]) -> Vec<&'a Note> {
    resolve_references(note, notes).found
}
