use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotelinkError {
    #[error("Not in a notelink project. Run 'notelink init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .notelink/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Ambiguous note id '{0}' matches {1} notes")]
    AmbiguousId(String, usize),

    #[error("Invalid note id: {0}")]
    InvalidId(String),

    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Loro error: {0}")]
    Loro(#[from] loro::LoroError),

    #[error("Loro encode error: {0}")]
    LoroEncode(#[from] loro::LoroEncodeError),
}

pub type Result<T> = std::result::Result<T, NotelinkError>;
