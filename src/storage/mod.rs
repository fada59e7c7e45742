mod loro_store;

pub use loro_store::{NoteStore, NoteUpdate, NOTELINK_DIR};
