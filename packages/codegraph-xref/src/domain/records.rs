//! Ingestion boundary records
//!
//! What an index source hands over per compilation unit. Entities are named
//! by `EntityKey` (name plus declaration location) because a unit refers to
//! entities declared in other units before their ids exist.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::models::{EntityFlags, ParameterKind};

/// A source position; `column` is a visible column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    pub line: i32,
    pub column: i32,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: i32, column: i32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.line >= 1 && self.column >= 1 && !self.file.as_os_str().is_empty()
    }
}

/// Cross-unit entity identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub name: String,
    /// None for predefined entities
    #[serde(default)]
    pub decl: Option<Location>,
}

impl EntityKey {
    pub fn new(name: impl Into<String>, decl: Location) -> Self {
        Self {
            name: name.into(),
            decl: Some(decl),
        }
    }

    pub fn predefined(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decl: None,
        }
    }
}

/// (entity, declaration-location, flags)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub decl: Option<Location>,
    #[serde(default)]
    pub flags: EntityFlags,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, decl: Location) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            decl: Some(decl),
            flags: EntityFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: EntityFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn key(&self) -> EntityKey {
        EntityKey {
            name: self.name.clone(),
            decl: self.decl.clone(),
        }
    }
}

/// (reference, kind, scope)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub entity: EntityKey,
    pub location: Location,
    pub kind_id: char,
    #[serde(default)]
    pub scope: Option<EntityKey>,
}

/// Entity-to-entity relation (parent type, override, parameter, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub from: EntityKey,
    pub to: EntityKey,
    /// One of `relation_kinds`, or any new tag
    pub kind: String,
    /// Source order among siblings (parameters, fields, literals)
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub parameter_kind: Option<ParameterKind>,
}

/// Freshness descriptor of one unit's index record, available without parsing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStamp {
    pub index_file: PathBuf,
    pub stamp: i64,
    #[serde(default)]
    pub checksum: Option<String>,
}

/// Everything one compilation unit contributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitIndex {
    /// Path of the compiler's index record for this unit
    pub index_file: PathBuf,
    pub stamp: i64,
    pub checksum: Option<String>,
    /// Source files that belong to the unit (spec, body, subunits)
    pub source_files: Vec<PathBuf>,
    /// Files the unit statically depends on
    pub dependencies: Vec<PathBuf>,
    pub entities: Vec<EntityRecord>,
    pub references: Vec<ReferenceRecord>,
    pub relations: Vec<RelationRecord>,
}

impl UnitIndex {
    pub fn new(index_file: impl Into<PathBuf>, stamp: i64) -> Self {
        Self {
            index_file: index_file.into(),
            stamp,
            ..Default::default()
        }
    }

    pub fn unit_stamp(&self) -> UnitStamp {
        UnitStamp {
            index_file: self.index_file.clone(),
            stamp: self.stamp,
            checksum: self.checksum.clone(),
        }
    }
}
