//! PolicyQA Store: read access to document blocks (paragraphs and tables)
//! behind the `BlockStore` trait, with an SQLite FTS5 implementation.

pub mod block_store;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use block_store::{escape_like, BlockStore};
pub use sqlite::SqliteStore;
pub use types::*;
