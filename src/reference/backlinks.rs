//! Backlinks: which notes point at a given note?

use crate::entity::Note;

use super::references_target;

/// Return every note other than `target_id` whose content references it.
///
/// Results keep the order of `notes`. Computed from scratch on each call.
pub fn backlinks<'a>(target_id: &str, notes: &'a [Note]) -> Vec<&'a Note> {
    notes
        .iter()
        .filter(|n| n.id != target_id)
        .filter(|n| references_target(&n.content, target_id))
        .collect()
}
