use std::path::{Path, PathBuf};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::entity::Note;
use crate::error::{NotelinkError, Result};

const CACHE_DB: &str = "cache.db";
/// Bumped whenever the table layout or tokenizer changes; a mismatch drops
/// and rebuilds the cache.
const SCHEMA_VERSION: &str = "2";
/// The trigram tokenizer cannot match terms shorter than this.
const MIN_TRIGRAM_CHARS: usize = 3;

/// SQLite cache for full-text search over notes
pub struct SqliteCache {
    conn: Connection,
    #[allow(dead_code)]
    path: PathBuf,
}

impl SqliteCache {
    /// Open or create the cache database
    pub fn open(notelink_dir: &Path) -> Result<Self> {
        let path = notelink_dir.join(CACHE_DB);
        let conn = Connection::open(&path)?;

        let cache = Self { conn, path };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        // Metadata table for version tracking
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        let schema: Option<String> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'schema'", [], |row| {
                row.get(0)
            })
            .optional()?;
        if schema.as_deref() != Some(SCHEMA_VERSION) {
            tracing::debug!(from = ?schema, to = SCHEMA_VERSION, "rebuilding cache schema");
            self.conn.execute_batch(
                "
                DROP TRIGGER IF EXISTS notes_ai;
                DROP TRIGGER IF EXISTS notes_ad;
                DROP TRIGGER IF EXISTS notes_au;
                DROP TABLE IF EXISTS notes_fts;
                DROP TABLE IF EXISTS notes;
                DELETE FROM meta;
                ",
            )?;
            self.conn.execute(
                "INSERT INTO meta (key, value) VALUES ('schema', ?1)",
                [SCHEMA_VERSION],
            )?;
        }

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT,
                category TEXT,
                tags TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE VIRTUAL TABLE IF NOT EXISTS notes_fts USING fts5(
                id,
                title,
                content,
                category,
                tags,
                content='notes',
                content_rowid='rowid',
                tokenize='trigram'
            )",
            [],
        )?;

        // Keep FTS in sync with the notes table
        self.conn.execute_batch(
            "
            CREATE TRIGGER IF NOT EXISTS notes_ai AFTER INSERT ON notes BEGIN
                INSERT INTO notes_fts(rowid, id, title, content, category, tags)
                VALUES (new.rowid, new.id, new.title, new.content, new.category, new.tags);
            END;

            CREATE TRIGGER IF NOT EXISTS notes_ad AFTER DELETE ON notes BEGIN
                INSERT INTO notes_fts(notes_fts, rowid, id, title, content, category, tags)
                VALUES ('delete', old.rowid, old.id, old.title, old.content, old.category, old.tags);
            END;

            CREATE TRIGGER IF NOT EXISTS notes_au AFTER UPDATE ON notes BEGIN
                INSERT INTO notes_fts(notes_fts, rowid, id, title, content, category, tags)
                VALUES ('delete', old.rowid, old.id, old.title, old.content, old.category, old.tags);
                INSERT INTO notes_fts(rowid, id, title, content, category, tags)
                VALUES (new.rowid, new.id, new.title, new.content, new.category, new.tags);
            END;
            ",
        )?;

        Ok(())
    }

    /// Get the stored Loro version hash
    pub fn get_loro_version(&self) -> Result<Option<String>> {
        let result: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'loro_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    /// Set the stored Loro version hash
    pub fn set_loro_version(&self, version: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('loro_version', ?1)",
            [version],
        )?;
        Ok(())
    }

    /// Index a note in the cache
    pub fn index_note(&self, note: &Note) -> Result<()> {
        let tags_str = note.tags.join(", ");

        // REPLACE would delete then insert and skip the update trigger
        self.conn
            .execute("DELETE FROM notes WHERE id = ?1", [&note.id])?;
        self.conn.execute(
            "INSERT INTO notes (id, title, content, category, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                note.id,
                note.title,
                note.content,
                note.category,
                tags_str,
                note.created_at,
                note.updated_at,
            ],
        )?;

        Ok(())
    }

    /// Remove a note from the cache
    pub fn remove_note(&self, id: &str) -> Result<()> {
        self.conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Clear all cached data (for full rebuild)
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM notes", [])?;
        self.conn
            .execute("DELETE FROM meta WHERE key = 'loro_version'", [])?;
        Ok(())
    }

    /// Full-text search over notes.
    ///
    /// Terms are matched as substrings of title, content, category and tags,
    /// so text without word boundaries (Chinese, Japanese) is searchable.
    /// Each whitespace-separated term is quoted, so user input never reaches
    /// the FTS5 query syntax. All terms must match.
    pub fn search_notes(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let terms: Vec<&str> = query.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        if terms
            .iter()
            .any(|term| term.chars().count() < MIN_TRIGRAM_CHARS)
        {
            return self.search_notes_like(&terms, limit);
        }

        let mut stmt = self.conn.prepare(
            "SELECT n.id, n.title, n.category,
                    highlight(notes_fts, 1, '<mark>', '</mark>') as title_highlight,
                    snippet(notes_fts, 2, '<mark>', '</mark>', '...', 32) as content_snippet
             FROM notes_fts f
             JOIN notes n ON n.id = f.id
             WHERE notes_fts MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )?;

        let results = stmt
            .query_map(params![fts_query(&terms), limit as i64], |row| {
                Ok(SearchResult {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    category: row.get(2)?,
                    title_highlight: row.get(3)?,
                    content_snippet: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }

    /// Substring scan for queries with terms too short for the trigram index.
    fn search_notes_like(&self, terms: &[&str], limit: usize) -> Result<Vec<SearchResult>> {
        let clauses: Vec<String> = (1..=terms.len())
            .map(|i| {
                format!(
                    "(title LIKE ?{i} ESCAPE '\\' OR content LIKE ?{i} ESCAPE '\\' \
                     OR category LIKE ?{i} ESCAPE '\\' OR tags LIKE ?{i} ESCAPE '\\')"
                )
            })
            .collect();
        let sql = format!(
            "SELECT id, title, category FROM notes WHERE {} \
             ORDER BY updated_at DESC, id LIMIT {}",
            clauses.join(" AND "),
            limit
        );
        let patterns: Vec<String> = terms.iter().map(|term| like_pattern(term)).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let results = stmt
            .query_map(params_from_iter(patterns.iter()), |row| {
                Ok(SearchResult {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    category: row.get(2)?,
                    title_highlight: None,
                    content_snippet: None,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }

    /// Sync the cache with the Loro store
    /// Returns true if a full reindex was performed
    pub fn sync_from_loro(&self, notes: &[Note], loro_version: &str) -> Result<bool> {
        let stored_version = self.get_loro_version()?;

        // If versions match, cache is up to date
        if stored_version.as_deref() == Some(loro_version) {
            return Ok(false);
        }

        self.clear()?;

        for note in notes {
            self.index_note(note)?;
        }

        self.set_loro_version(loro_version)?;
        tracing::debug!(count = notes.len(), "reindexed search cache");

        Ok(true)
    }
}

fn fts_query(terms: &[&str]) -> String {
    terms
        .iter()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Search result from full-text search
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    pub title_highlight: Option<String>,
    pub content_snippet: Option<String>,
}

impl From<rusqlite::Error> for NotelinkError {
    fn from(e: rusqlite::Error) -> Self {
        NotelinkError::Storage(format!("SQLite error: {}", e))
    }
}
