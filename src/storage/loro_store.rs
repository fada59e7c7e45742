use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use loro::{LoroDoc, LoroList, LoroMap, LoroValue, ValueOrContainer};

use crate::cache::SqliteCache;
use crate::entity::{IdGenerator, Note};
use crate::error::{NotelinkError, Result};

pub const NOTELINK_DIR: &str = ".notelink";
const LORO_DB: &str = "loro.db";

/// Update payload for a note
#[derive(Default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    /// Attachments to add or replace, keyed by attachment id
    pub attachments: BTreeMap<String, String>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.add_tags.is_empty()
            && self.remove_tags.is_empty()
            && self.attachments.is_empty()
    }
}

/// Owner of the note collection.
///
/// All mutation goes through this type; readers work on `Vec<Note>`
/// snapshots returned by [`NoteStore::list_notes`].
pub struct NoteStore {
    doc: LoroDoc,
    dir: PathBuf,
    path: PathBuf,
}

impl NoteStore {
    /// Initialize a new notelink project
    pub fn init(root: &Path) -> Result<Self> {
        let dir = root.join(NOTELINK_DIR);

        if dir.exists() {
            return Err(NotelinkError::AlreadyInitialized);
        }

        fs::create_dir_all(&dir)?;

        let path = dir.join(LORO_DB);
        let store = Self {
            doc: LoroDoc::new(),
            dir,
            path,
        };
        store.save()?;

        tracing::info!(path = %store.path.display(), "initialized note store");
        Ok(store)
    }

    /// Open an existing notelink project
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(NOTELINK_DIR);
        let path = dir.join(LORO_DB);

        if !path.exists() {
            return Err(NotelinkError::NotInitialized);
        }

        let bytes = fs::read(&path)?;
        let doc = LoroDoc::new();
        doc.import(&bytes)?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "opened note store");
        Ok(Self { doc, dir, path })
    }

    /// Save the document to disk
    pub fn save(&self) -> Result<()> {
        let bytes = self.doc.export(loro::ExportMode::Snapshot)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// The `.notelink` directory
    pub fn notelink_dir(&self) -> &Path {
        &self.dir
    }

    /// Size of the persisted document in bytes
    pub fn file_size(&self) -> Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    /// Get a version hash for the current document state
    /// This is used for cache invalidation
    pub fn version_hash(&self) -> String {
        let vv = self.doc.oplog_vv();
        format!("{:?}", vv)
    }

    /// Sync the SQLite cache with the current document state
    /// Returns true if the cache was rebuilt
    pub fn sync_cache(&self, cache: &SqliteCache) -> Result<bool> {
        let notes = self.list_notes()?;
        let version = self.version_hash();

        cache.sync_from_loro(&notes, &version)
    }

    /// Issue the next note id and persist the counter.
    ///
    /// Skips ids already present in the collection, which can only happen
    /// after the counter wraps or after an import.
    pub fn next_id(&self) -> Result<String> {
        let meta = self.doc.get_map("_meta");

        let mut generator = match meta.get("id_seq") {
            Some(ValueOrContainer::Value(LoroValue::I64(n))) => IdGenerator::new(n as u64),
            _ => {
                let notes = self.list_notes()?;
                IdGenerator::seeded_from(notes.iter().map(|n| n.id.as_str()))
            }
        };

        let mut id = generator.next_id();
        while self.contains(&id) {
            id = generator.next_id();
        }

        meta.insert("id_seq", generator.current() as i64)?;
        self.doc.commit();
        Ok(id)
    }

    /// Check whether a note with this exact id exists
    pub fn contains(&self, id: &str) -> bool {
        self.doc.get_map("notes").get(id).is_some()
    }

    /// Add a note. Fails if the id is already taken.
    pub fn add_note(&self, note: &Note) -> Result<()> {
        if self.contains(&note.id) {
            return Err(NotelinkError::Storage(format!(
                "Note id already exists: {}",
                note.id
            )));
        }
        self.put_note(note)
    }

    /// Insert a note, replacing any existing note with the same id
    pub fn put_note(&self, note: &Note) -> Result<()> {
        let notes = self.doc.get_map("notes");
        let entity_map = notes.insert_container(&note.id, LoroMap::new())?;

        entity_map.insert("id", note.id.clone())?;
        entity_map.insert("title", note.title.clone())?;
        entity_map.insert("content", note.content.clone())?;
        entity_map.insert("category", note.category.clone())?;
        entity_map.insert("created_at", note.created_at)?;
        entity_map.insert("updated_at", note.updated_at)?;

        let tags_list = entity_map.insert_container("tags", LoroList::new())?;
        for tag in &note.tags {
            tags_list.push(tag.clone())?;
        }

        let attachments_map = entity_map.insert_container("attachments", LoroMap::new())?;
        for (k, v) in &note.attachments {
            attachments_map.insert(k, v.clone())?;
        }

        self.doc.commit();
        tracing::debug!(id = %note.id, "stored note");
        Ok(())
    }

    /// Get a note by exact id
    pub fn get_note(&self, id: &str) -> Result<Option<Note>> {
        let notes_map = self.doc.get_map("notes");

        let json = notes_map.get_deep_value();
        if let LoroValue::Map(map) = json {
            if let Some(LoroValue::Map(entity_map)) = map.get(id) {
                return Ok(parse_note_from_map(entity_map));
            }
        }
        Ok(None)
    }

    /// Find a note by exact id or unique id prefix
    pub fn find_note(&self, id_or_prefix: &str) -> Result<Note> {
        if let Some(note) = self.get_note(id_or_prefix)? {
            return Ok(note);
        }

        let mut matches: Vec<Note> = self
            .list_notes()?
            .into_iter()
            .filter(|n| n.id.starts_with(id_or_prefix))
            .collect();

        match matches.len() {
            0 => Err(NotelinkError::NoteNotFound(id_or_prefix.to_string())),
            1 => Ok(matches.remove(0)),
            n => Err(NotelinkError::AmbiguousId(id_or_prefix.to_string(), n)),
        }
    }

    /// List all notes, most recently updated first
    pub fn list_notes(&self) -> Result<Vec<Note>> {
        let notes_map = self.doc.get_map("notes");
        let mut notes = Vec::new();

        let json = notes_map.get_deep_value();
        if let LoroValue::Map(map) = json {
            for (_, entity_value) in map.iter() {
                if let LoroValue::Map(entity_map) = entity_value {
                    if let Some(note) = parse_note_from_map(entity_map) {
                        notes.push(note);
                    }
                }
            }
        }

        notes.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(notes)
    }

    /// Ids of every note currently in the collection
    pub fn note_ids(&self) -> Result<HashSet<String>> {
        Ok(self.list_notes()?.into_iter().map(|n| n.id).collect())
    }

    /// Update an existing note
    pub fn update_note(&self, id: &str, updates: NoteUpdate) -> Result<()> {
        let notes_map = self.doc.get_map("notes");

        let entity_map = match notes_map.get(id) {
            Some(ValueOrContainer::Container(loro::Container::Map(map))) => map,
            _ => return Err(NotelinkError::NoteNotFound(id.to_string())),
        };
        let mut note = self
            .get_note(id)?
            .ok_or_else(|| NotelinkError::NoteNotFound(id.to_string()))?;

        note.touch();
        entity_map.insert("updated_at", note.updated_at)?;

        if let Some(title) = updates.title {
            entity_map.insert("title", title)?;
        }

        if let Some(content) = updates.content {
            entity_map.insert("content", content)?;
        }

        if let Some(category) = updates.category {
            entity_map.insert("category", category)?;
        }

        if !updates.add_tags.is_empty() || !updates.remove_tags.is_empty() {
            // existing + add - remove, keeping order
            let mut new_tags: Vec<String> = note
                .tags
                .into_iter()
                .filter(|t| !updates.remove_tags.contains(t))
                .collect();
            for tag in updates.add_tags {
                if !new_tags.contains(&tag) {
                    new_tags.push(tag);
                }
            }

            let tags_list = entity_map.get_or_create_container("tags", LoroList::new())?;
            while tags_list.len() > 0 {
                tags_list.delete(0, 1)?;
            }
            for tag in new_tags {
                tags_list.push(tag)?;
            }
        }

        if !updates.attachments.is_empty() {
            let attachments_map =
                entity_map.get_or_create_container("attachments", LoroMap::new())?;
            for (k, v) in updates.attachments {
                attachments_map.insert(&k, v)?;
            }
        }

        self.doc.commit();
        tracing::debug!(id, "updated note");
        Ok(())
    }

    /// Delete a note by id
    pub fn delete_note(&self, id: &str) -> Result<()> {
        let notes_map = self.doc.get_map("notes");

        if notes_map.get(id).is_none() {
            return Err(NotelinkError::NoteNotFound(id.to_string()));
        }

        notes_map.delete(id)?;
        self.doc.commit();
        tracing::debug!(id, "deleted note");
        Ok(())
    }
}

fn parse_note_from_map(map: &loro::LoroMapValue) -> Option<Note> {
    let id = match map.get("id")? {
        LoroValue::String(s) => s.to_string(),
        _ => return None,
    };
    let created_at = match map.get("created_at")? {
        LoroValue::I64(n) => *n,
        _ => return None,
    };
    let updated_at = match map.get("updated_at")? {
        LoroValue::I64(n) => *n,
        _ => return None,
    };
    let string_field = |key: &str| {
        map.get(key)
            .and_then(|v| match v {
                LoroValue::String(s) => Some(s.to_string()),
                _ => None,
            })
            .unwrap_or_default()
    };
    let tags = map
        .get("tags")
        .and_then(|v| match v {
            LoroValue::List(list) => Some(
                list.iter()
                    .filter_map(|item| match item {
                        LoroValue::String(s) => Some(s.to_string()),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
        .unwrap_or_default();
    let attachments = map
        .get("attachments")
        .and_then(|v| match v {
            LoroValue::Map(entries) => Some(
                entries
                    .iter()
                    .filter_map(|(k, v)| match v {
                        LoroValue::String(s) => Some((k.to_string(), s.to_string())),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
        .unwrap_or_default();

    Some(Note {
        id,
        title: string_field("title"),
        content: string_field("content"),
        category: string_field("category"),
        tags,
        created_at,
        updated_at,
        attachments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn note(id: &str, title: &str, updated_at: i64) -> Note {
        let mut n = Note::new(id.to_string(), title.to_string());
        n.updated_at = updated_at;
        n
    }

    #[test]
    fn test_init_creates_notelink_directory() {
        let tmp = TempDir::new().unwrap();
        let _store = NoteStore::init(tmp.path()).unwrap();

        assert!(tmp.path().join(".notelink").exists());
        assert!(tmp.path().join(".notelink/loro.db").exists());
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let tmp = TempDir::new().unwrap();
        NoteStore::init(tmp.path()).unwrap();

        let result = NoteStore::init(tmp.path());
        assert!(matches!(result, Err(NotelinkError::AlreadyInitialized)));
    }

    #[test]
    fn test_open_fails_if_not_initialized() {
        let tmp = TempDir::new().unwrap();

        let result = NoteStore::open(tmp.path());
        assert!(matches!(result, Err(NotelinkError::NotInitialized)));
    }

    #[test]
    fn test_add_and_list_note_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        let mut n = Note::new("100000001".to_string(), "Intro".to_string());
        n.content = "See note://100000002".to_string();
        n.category = "work".to_string();
        n.tags = vec!["a".to_string(), "b".to_string()];
        n.attachments
            .insert("img".to_string(), "data:image/png;base64,AAAA".to_string());

        store.add_note(&n).unwrap();
        store.save().unwrap();

        let store2 = NoteStore::open(tmp.path()).unwrap();
        let notes = store2.list_notes().unwrap();

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0], n);
    }

    #[test]
    fn test_add_duplicate_id_fails() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        store.add_note(&note("100000001", "A", 1)).unwrap();
        let result = store.add_note(&note("100000001", "B", 2));
        assert!(matches!(result, Err(NotelinkError::Storage(_))));
    }

    #[test]
    fn test_put_note_replaces() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        let mut n = note("100000001", "A", 1);
        n.tags = vec!["old".to_string()];
        store.add_note(&n).unwrap();

        let replacement = note("100000001", "B", 2);
        store.put_note(&replacement).unwrap();

        let got = store.get_note("100000001").unwrap().unwrap();
        assert_eq!(got.title, "B");
        assert!(got.tags.is_empty());
    }

    #[test]
    fn test_list_orders_by_updated_desc() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        store.add_note(&note("100000001", "old", 10)).unwrap();
        store.add_note(&note("100000002", "new", 30)).unwrap();
        store.add_note(&note("100000003", "mid", 20)).unwrap();

        let titles: Vec<String> = store
            .list_notes()
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_update_note() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        let mut n = note("100000001", "Draft", 1);
        n.tags = vec!["keep".to_string(), "drop".to_string()];
        store.add_note(&n).unwrap();

        let mut updates = NoteUpdate::default();
        updates.title = Some("Final".to_string());
        updates.content = Some("body".to_string());
        updates.category = Some("work".to_string());
        updates.add_tags = vec!["new".to_string(), "keep".to_string()];
        updates.remove_tags = vec!["drop".to_string()];
        store.update_note("100000001", updates).unwrap();

        let got = store.get_note("100000001").unwrap().unwrap();
        assert_eq!(got.title, "Final");
        assert_eq!(got.content, "body");
        assert_eq!(got.category, "work");
        assert_eq!(got.tags, vec!["keep", "new"]);
        assert!(got.updated_at > 1);
    }

    #[test]
    fn test_update_refreshes_updated_at_only() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();
        let original = note("100000001", "Draft", 5);
        store.add_note(&original).unwrap();

        let before = crate::entity::now_millis();
        let mut updates = NoteUpdate::default();
        updates.title = Some("Final".to_string());
        store.update_note("100000001", updates).unwrap();

        let got = store.get_note("100000001").unwrap().unwrap();
        assert!(got.updated_at >= before);
        assert_eq!(got.created_at, original.created_at);
    }

    #[test]
    fn test_update_missing_note_fails() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        let result = store.update_note("100000001", NoteUpdate::default());
        assert!(matches!(result, Err(NotelinkError::NoteNotFound(_))));
    }

    #[test]
    fn test_delete_note() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        store.add_note(&note("100000001", "A", 1)).unwrap();
        store.delete_note("100000001").unwrap();

        assert!(store.get_note("100000001").unwrap().is_none());
        assert!(!store.contains("100000001"));
    }

    #[test]
    fn test_delete_nonexistent_note_fails() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        let result = store.delete_note("100000001");
        assert!(matches!(result, Err(NotelinkError::NoteNotFound(_))));
    }

    #[test]
    fn test_next_id_seeds_from_existing_notes() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        store.add_note(&note("100000041", "A", 1)).unwrap();
        store.add_note(&note("legacy", "B", 1)).unwrap();

        assert_eq!(store.next_id().unwrap(), "100000042");
        assert_eq!(store.next_id().unwrap(), "100000043");
    }

    #[test]
    fn test_next_id_persists_counter() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        assert_eq!(store.next_id().unwrap(), "100000000");
        store.save().unwrap();

        let store2 = NoteStore::open(tmp.path()).unwrap();
        assert_eq!(store2.next_id().unwrap(), "100000001");
    }

    #[test]
    fn test_next_id_skips_taken_ids() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        assert_eq!(store.next_id().unwrap(), "100000000");
        store.add_note(&note("100000001", "imported", 1)).unwrap();
        assert_eq!(store.next_id().unwrap(), "100000002");
    }

    #[test]
    fn test_find_note_by_prefix() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        store.add_note(&note("100000001", "A", 1)).unwrap();
        store.add_note(&note("200000001", "B", 1)).unwrap();
        store.add_note(&note("200000002", "C", 1)).unwrap();

        assert_eq!(store.find_note("1000").unwrap().title, "A");
        assert_eq!(store.find_note("200000002").unwrap().title, "C");
        assert!(matches!(
            store.find_note("2000"),
            Err(NotelinkError::AmbiguousId(_, 2))
        ));
        assert!(matches!(
            store.find_note("3"),
            Err(NotelinkError::NoteNotFound(_))
        ));
    }

    #[test]
    fn test_sync_cache_rebuilds_on_change() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();
        let cache = SqliteCache::open(store.notelink_dir()).unwrap();

        store.add_note(&note("100000001", "Searchable", 1)).unwrap();
        assert!(store.sync_cache(&cache).unwrap());
        assert!(!store.sync_cache(&cache).unwrap());
        assert_eq!(cache.search_notes("searchable", 10).unwrap().len(), 1);

        store.delete_note("100000001").unwrap();
        assert!(store.sync_cache(&cache).unwrap());
        assert!(cache.search_notes("searchable", 10).unwrap().is_empty());
    }

    #[test]
    fn test_note_ids() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::init(tmp.path()).unwrap();

        store.add_note(&note("100000001", "A", 1)).unwrap();
        store.add_note(&note("100000002", "B", 1)).unwrap();

        let ids = store.note_ids().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("100000001"));
    }
}
