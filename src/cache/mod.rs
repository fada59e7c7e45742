mod sqlite_cache;

pub use sqlite_cache::{SearchResult, SqliteCache};
