//! Domain layer
//!
//! - `models`: entity, reference, declaration and kind value types
//! - `records`: what an index source supplies per compilation unit
//! - `ports`: `IndexSource` and `ErrorReporter`

pub mod models;
pub mod ports;
pub mod records;

pub use models::{
    relation_kinds, Entity, EntityDeclaration, EntityFlags, ParameterKind, Reference,
    ReferenceKind, ReferenceKindAttrs, SourceFile, XrefStats, BODY_KIND_IDS,
    DECLARATION_KIND_ID, FILE_DEPENDENCY_KIND,
};
pub use ports::{ErrorReporter, IndexSource, TracingReporter};
pub use records::{
    EntityKey, EntityRecord, Location, ReferenceRecord, RelationRecord, UnitIndex, UnitStamp,
};
