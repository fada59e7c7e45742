// src/entity/id.rs
use crate::reference::is_note_id;

/// Smallest id the generator hands out.
pub const MIN_ID: u64 = 100_000_000;
/// Largest id before the counter wraps back to [`MIN_ID`].
pub const MAX_ID: u64 = 999_999_999;

/// Monotonic note id counter.
///
/// The counter value is persisted by the store; when no value has been
/// persisted yet it is seeded from the largest existing numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdGenerator {
    seq: u64,
}

impl IdGenerator {
    /// Resume from a persisted counter value.
    pub fn new(seq: u64) -> Self {
        Self { seq }
    }

    /// Seed from the ids already in the collection. Ids that are not
    /// well-formed note ids are ignored.
    pub fn seeded_from<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let seq = ids
            .into_iter()
            .filter(|id| is_note_id(id))
            .filter_map(|id| id.parse::<u64>().ok())
            .max()
            .unwrap_or(MIN_ID - 1);
        Self { seq }
    }

    /// Last value handed out (or the seed).
    pub fn current(&self) -> u64 {
        self.seq
    }

    /// Produce the next id, wrapping to [`MIN_ID`] past [`MAX_ID`].
    pub fn next_id(&mut self) -> String {
        let mut next = self.seq + 1;
        if next > MAX_ID {
            next = MIN_ID;
        }
        self.seq = next;
        next.to_string()
    }
}
