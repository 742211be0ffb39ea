//! Query and ingestion features
//!
//! Each feature adds methods to `XrefDatabase` in its own `impl` block:
//! - cursor/     - forward-only result cursors
//! - classifier/ - reference kind predicates
//! - resolution/ - name + location lookup, exact then fuzzy
//! - relations/  - one-step entity and file relations
//! - closure/    - transitive closure of any one-step relation
//! - ingestion/  - unit ingestion with in-memory staging

pub mod classifier;
pub mod closure;
pub mod cursor;
pub mod ingestion;
pub mod relations;
pub mod resolution;
