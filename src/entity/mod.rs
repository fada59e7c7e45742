mod id;
mod note;

pub use id::{IdGenerator, MAX_ID, MIN_ID};
pub use note::{now_millis, Note, NoteStats};
