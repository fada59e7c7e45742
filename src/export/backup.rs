//! JSON backup export and import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::entity::{now_millis, Note};
use crate::error::{NotelinkError, Result};
use crate::reference::is_note_id;
use crate::storage::NoteStore;

pub const BACKUP_VERSION: u32 = 1;
const IMPORTED_SUFFIX: &str = " (Imported)";

/// A full collection backup, optionally with the project settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Config>,
}

impl Backup {
    pub fn new(notes: Vec<Note>) -> Self {
        Self {
            version: BACKUP_VERSION,
            exported_at: Utc::now(),
            notes,
            config: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }
}

/// How incoming notes with an id already in the collection are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ImportStrategy {
    /// Replace the existing note
    Overwrite,
    /// Keep both; the incoming note gets a new id and a title suffix
    #[default]
    KeepBoth,
    /// Leave the existing note and drop the incoming one
    Skip,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub added: usize,
    pub overwritten: usize,
    pub renamed: usize,
    pub skipped: usize,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.added + self.overwritten + self.renamed + self.skipped
    }
}

/// Serialize `notes` (and `config`, when given) as a pretty-printed backup
/// document.
pub fn export_json(notes: Vec<Note>, config: Option<&Config>) -> Result<String> {
    let backup = match config {
        Some(config) => Backup::new(notes).with_config(config.clone()),
        None => Backup::new(notes),
    };
    Ok(serde_json::to_string_pretty(&backup)?)
}

/// Parse a backup document.
///
/// Accepts a full backup object or a bare array of notes. A bare array has
/// no settings and is stamped with the current time.
pub fn parse_backup(text: &str) -> Result<Backup> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawBackup {
        Full(Backup),
        Notes(Vec<Note>),
    }

    match serde_json::from_str::<RawBackup>(text) {
        Ok(RawBackup::Full(backup)) => {
            if backup.version > BACKUP_VERSION {
                return Err(NotelinkError::InvalidBackup(format!(
                    "unsupported backup version {}",
                    backup.version
                )));
            }
            Ok(backup)
        }
        Ok(RawBackup::Notes(notes)) => Ok(Backup::new(notes)),
        Err(e) => Err(NotelinkError::InvalidBackup(e.to_string())),
    }
}

/// Merge `notes` into the store according to `strategy`.
///
/// Incoming notes whose id is not a well-formed note id always get a fresh
/// one. Does not save; the caller persists the store.
pub fn import_notes(
    store: &NoteStore,
    notes: Vec<Note>,
    strategy: ImportStrategy,
) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for mut note in notes {
        if note.created_at == 0 {
            note.created_at = now_millis();
        }
        if note.updated_at == 0 {
            note.updated_at = note.created_at;
        }

        if !is_note_id(&note.id) {
            tracing::debug!(id = %note.id, "assigning fresh id to imported note");
            note.id = store.next_id()?;
            store.add_note(&note)?;
            report.added += 1;
            continue;
        }

        if !store.contains(&note.id) {
            store.add_note(&note)?;
            report.added += 1;
            continue;
        }

        match strategy {
            ImportStrategy::Overwrite => {
                store.put_note(&note)?;
                report.overwritten += 1;
            }
            ImportStrategy::KeepBoth => {
                note.id = store.next_id()?;
                note.title.push_str(IMPORTED_SUFFIX);
                store.add_note(&note)?;
                report.renamed += 1;
            }
            ImportStrategy::Skip => {
                report.skipped += 1;
            }
        }
    }

    tracing::info!(
        added = report.added,
        overwritten = report.overwritten,
        renamed = report.renamed,
        skipped = report.skipped,
        "imported notes"
    );
    Ok(report)
}
