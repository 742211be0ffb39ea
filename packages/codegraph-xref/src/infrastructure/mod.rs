//! Infrastructure layer
//!
//! SQLite store, schema, and index source adapters.

pub mod index_source;
pub mod schema;
pub mod sqlite_store;

pub use index_source::{JsonIndexSource, MemoryIndexSource, JSON_INDEX_SUFFIX};
pub use sqlite_store::XrefDatabase;
