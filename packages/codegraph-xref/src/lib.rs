//! codegraph-xref - cross-reference database for compiled-source entity graphs
//!
//! Ingests per-compilation-unit entity/reference records emitted by a
//! compiler into SQLite and answers navigation queries over them:
//! declarations, references, callers and callees, type hierarchies,
//! overriding, renaming and generic instantiation.
//!
//! ## Core Principles
//!
//! 1. **Kinds are data**: reference and entity kinds are rows, so a new
//!    compiler kind is a new row, not a code change
//! 2. **Absence is not an error**: lookups return null values, fuzzy
//!    matches or empty cursors; only storage failures are `Err`
//! 3. **One bad unit never blocks the rest**: it goes to the error hook
//!
//! ## Usage
//!
//! ```rust,ignore
//! use codegraph_xref::{ClosureFlags, IngestOptions, JsonIndexSource, XrefDatabase};
//!
//! let mut db = XrefDatabase::open("project.xdb")?;
//! db.update(&JsonIndexSource::new("obj"), IngestOptions::new())?;
//!
//! // Go to declaration
//! let r = db.resolve_entity("Draw", "shapes.ads", Some(12), Some(14))?;
//! if r.is_fuzzy() {
//!     // index is stale relative to the source
//! }
//!
//! // Everything reachable through calls, including dispatching overriders
//! let flags = ClosureFlags { from_overriding: true, ..Default::default() };
//! for callee in db.recursive(r.entity, XrefDatabase::calls, flags) {
//!     println!("{}", db.get_declaration(callee)?.name);
//! }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod features;
pub mod infrastructure;
mod shared;

#[cfg(test)]
mod test_fixtures;

pub use config::XrefConfig;
pub use domain::{
    Entity, EntityDeclaration, EntityFlags, EntityKey, EntityRecord, ErrorReporter, IndexSource,
    Location, ParameterKind, Reference, ReferenceKind, ReferenceKindAttrs, ReferenceRecord,
    RelationRecord, SourceFile, UnitIndex, UnitStamp, XrefStats,
};
pub use error::{ErrorKind, Result, XrefError};
pub use features::closure::{ClosureElement, ClosureFlags, RecursiveCursor};
pub use features::cursor::{
    Cursor, EntityCursor, FileCursor, ParameterCursor, ReferenceCursor, ResultCursor,
};
pub use features::ingestion::{IngestOptions, IngestStats};
pub use features::resolution::{to_byte_column, to_visible_column};
pub use infrastructure::{JsonIndexSource, MemoryIndexSource, XrefDatabase};
