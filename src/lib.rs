pub mod cache;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod export;
pub mod mcp;
pub mod reference;
pub mod render;
pub mod resolver;
pub mod search;
pub mod storage;
pub mod warnings;

pub use cache::SqliteCache;
pub use entity::Note;
pub use error::{NotelinkError, Result};
pub use mcp::NotelinkServer;
pub use storage::NoteStore;
