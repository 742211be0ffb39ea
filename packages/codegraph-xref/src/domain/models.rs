//! Entity & Reference model
//!
//! Value types only. Identity, comparison and ordering; no behavior that
//! needs the database.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

/// Kind id of the declaration pseudo-reference (also carried by the null reference)
pub const DECLARATION_KIND_ID: char = 'D';

/// Kind ids whose references mark a body or completion of an entity
pub const BODY_KIND_IDS: [char; 2] = ['b', 'c'];

/// Open-ended entity-to-entity relation tags stored in `e2e.kind`
pub mod relation_kinds {
    pub const PARENT_TYPE: &str = "parent_type";
    pub const OVERRIDES: &str = "overrides";
    pub const RENAMES: &str = "renames";
    pub const HAS_PRIMITIVE: &str = "has_primitive";
    pub const HAS_PARAMETER: &str = "has_parameter";
    pub const HAS_FIELD: &str = "has_field";
    pub const HAS_DISCRIMINANT: &str = "has_discriminant";
    pub const HAS_LITERAL: &str = "has_literal";
    pub const INSTANCE_OF: &str = "instance_of";
    pub const POINTED_TYPE: &str = "pointed_type";
    pub const COMPONENT_TYPE: &str = "component_type";
}

/// Tag of the file-to-file dependency rows stored in `f2f.kind`
pub const FILE_DEPENDENCY_KIND: &str = "depends_on";

/// Opaque entity handle
///
/// Unique within one database instance. Equality and ordering only look at
/// the id; comparing entities from two databases is meaningless. A handle
/// to a deleted row is still safe to pass to queries (they return nothing),
/// and the id may be reused by a later insertion: long-lived holders should
/// also record `XrefDatabase::generation()`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Entity {
    id: i64,
    fuzzy: bool,
}

impl Entity {
    /// The null entity
    pub const NONE: Entity = Entity {
        id: -1,
        fuzzy: false,
    };

    pub fn from_raw(id: i64) -> Self {
        Self { id, fuzzy: false }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn is_none(&self) -> bool {
        self.id < 0
    }

    /// True when this entity was returned as an approximation
    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    pub(crate) fn into_fuzzy(self) -> Self {
        Self {
            id: self.id,
            fuzzy: true,
        }
    }

    pub(crate) fn from_nullable(id: Option<i64>) -> Self {
        id.map(Self::from_raw).unwrap_or(Self::NONE)
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NONE
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

/// A source file known to the database
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceFile {
    /// Canonical, slash-separated path
    pub path: PathBuf,
    pub id: i64,
}

/// Fixed attribute set of a declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityFlags {
    pub is_subprogram: bool,
    pub is_container: bool,
    pub is_abstract: bool,
    pub is_generic: bool,
    pub is_access: bool,
    pub is_type: bool,
    pub is_array: bool,
    pub is_printable: bool,
    pub is_global: bool,
    pub is_static_local: bool,
    pub has_methods: bool,
    pub body_is_full_declaration: bool,
}

impl EntityFlags {
    /// Declaration attributes packed as one integer column; `is_global` and
    /// `is_static_local` are stored separately
    pub(crate) fn kind_bits(&self) -> i64 {
        [
            self.is_subprogram,
            self.is_container,
            self.is_abstract,
            self.is_generic,
            self.is_access,
            self.is_type,
            self.is_array,
            self.is_printable,
            self.has_methods,
            self.body_is_full_declaration,
        ]
        .iter()
        .enumerate()
        .fold(0, |bits, (i, set)| if *set { bits | (1 << i) } else { bits })
    }

    pub(crate) fn with_kind_bits(mut self, bits: i64) -> Self {
        let bit = |i: u32| bits & (1 << i) != 0;
        self.is_subprogram = bit(0);
        self.is_container = bit(1);
        self.is_abstract = bit(2);
        self.is_generic = bit(3);
        self.is_access = bit(4);
        self.is_type = bit(5);
        self.is_array = bit(6);
        self.is_printable = bit(7);
        self.has_methods = bit(8);
        self.body_is_full_declaration = bit(9);
        self
    }
}

/// A located mention of an entity
///
/// `column` is a visible column (tabs expanded), both `line` and `column`
/// are 1-based. The null reference carries `Entity::NONE`, position -1 and
/// the declaration kind id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub entity: Entity,
    pub file: Option<SourceFile>,
    pub line: i32,
    pub column: i32,
    /// Display name of the kind; several kind ids may share one
    pub kind: String,
    pub kind_id: char,
    /// Enclosing entity the reference is attributed to
    pub scope: Entity,
    pub is_end_of_scope: bool,
}

impl Reference {
    pub fn null() -> Self {
        Self {
            entity: Entity::NONE,
            file: None,
            line: -1,
            column: -1,
            kind: String::new(),
            kind_id: DECLARATION_KIND_ID,
            scope: Entity::NONE,
            is_end_of_scope: false,
        }
    }

    pub fn is_null(&self) -> bool {
        self.entity.is_none()
    }

    pub fn is_fuzzy(&self) -> bool {
        self.entity.is_fuzzy()
    }

    pub(crate) fn into_fuzzy(mut self) -> Self {
        self.entity = self.entity.into_fuzzy();
        self
    }

    /// Position first; the remaining fields only break ties so that
    /// `cmp` agrees with `==`
    #[allow(clippy::type_complexity)]
    fn sort_key(&self) -> (Option<&PathBuf>, i32, i32, char, Entity, Entity, Option<i64>, &str, bool) {
        (
            self.file.as_ref().map(|f| &f.path),
            self.line,
            self.column,
            self.kind_id,
            self.entity,
            self.scope,
            self.file.as_ref().map(|f| f.id),
            &self.kind,
            self.is_end_of_scope,
        )
    }
}

impl PartialOrd for Reference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Reference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Declaration of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDeclaration {
    pub name: String,
    /// Open kind tag ("procedure", "record type", ...)
    pub kind: String,
    pub location: Reference,
    pub flags: EntityFlags,
}

impl EntityDeclaration {
    pub fn none() -> Self {
        Self {
            name: String::new(),
            kind: String::new(),
            location: Reference::null(),
            flags: EntityFlags::default(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.location.is_null()
    }

    /// Built-in entity without a real source location; only the name is meaningful
    pub fn is_predefined(&self) -> bool {
        !self.is_none() && self.location.file.is_none()
    }
}

/// Mode of a formal parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    In,
    Out,
    InOut,
    Access,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::In => "in",
            ParameterKind::Out => "out",
            ParameterKind::InOut => "in_out",
            ParameterKind::Access => "access",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(ParameterKind::In),
            "out" => Some(ParameterKind::Out),
            "in_out" => Some(ParameterKind::InOut),
            "access" => Some(ParameterKind::Access),
            _ => None,
        }
    }
}

/// Row-level attributes of a reference kind; unknown kinds get all-false
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceKindAttrs {
    pub is_real: bool,
    pub is_read: bool,
    pub is_write: bool,
    pub is_end: bool,
    pub is_implicit: bool,
    pub is_dispatching: bool,
    pub show_in_callgraph: bool,
}

/// A reference kind as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceKind {
    pub id: char,
    pub display: String,
    pub attrs: ReferenceKindAttrs,
}

/// Row counts of a database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XrefStats {
    pub units: usize,
    pub files: usize,
    pub entities: usize,
    pub references: usize,
    pub relations: usize,
}
