//! Threshold warnings for large collections.
//!
//! Backlink lookup scans every note, so very large collections slow down
//! `backlinks` and `refs`.

/// Note count above which a warning is shown.
pub const NOTE_WARNING_THRESHOLD: usize = 5000;
/// loro.db size in bytes above which a warning is shown.
pub const LORO_SIZE_WARNING_THRESHOLD: u64 = 10 * 1024 * 1024;

/// A warning about potential performance issues.
#[derive(Debug, Clone)]
pub enum Warning {
    /// Note count exceeds recommended threshold.
    HighNoteCount { count: usize, threshold: usize },
    /// loro.db file size exceeds recommended threshold.
    LargeLoroDb { size_mb: f64, threshold_mb: f64 },
}

/// Check thresholds and return any warnings.
///
/// # Arguments
/// * `note_count` - Number of notes in the store
/// * `loro_size` - Size of loro.db file in bytes
pub fn check_thresholds(note_count: usize, loro_size: u64) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if note_count > NOTE_WARNING_THRESHOLD {
        warnings.push(Warning::HighNoteCount {
            count: note_count,
            threshold: NOTE_WARNING_THRESHOLD,
        });
    }

    if loro_size > LORO_SIZE_WARNING_THRESHOLD {
        warnings.push(Warning::LargeLoroDb {
            size_mb: loro_size as f64 / (1024.0 * 1024.0),
            threshold_mb: LORO_SIZE_WARNING_THRESHOLD as f64 / (1024.0 * 1024.0),
        });
    }

    warnings
}

/// Format a warning for display.
pub fn format_warning(warning: &Warning) -> String {
    match warning {
        Warning::HighNoteCount { count, threshold } => {
            format!(
                "Warning: {} notes exceeds recommended {} - backlink lookup may slow down",
                count, threshold
            )
        }
        Warning::LargeLoroDb {
            size_mb,
            threshold_mb,
        } => {
            format!(
                "Warning: loro.db size ({:.1}MB) exceeds recommended {:.0}MB",
                size_mb, threshold_mb
            )
        }
    }
}
