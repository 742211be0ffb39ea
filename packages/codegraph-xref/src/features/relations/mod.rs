//! Direct relation queries
//!
//! One-step navigation from an entity: declaration, references, bodies,
//! call graph edges, type hierarchy, overriding, renaming, generic
//! instantiation and record/subprogram components. Every query orders its
//! rows deterministically, and a stale or null entity yields empty results.
//!
//! `e2e` rows read `from_entity -> to_entity`:
//!
//! | kind             | from         | to         |
//! |------------------|--------------|------------|
//! | parent_type      | derived type | parent     |
//! | overrides        | overriding   | overridden |
//! | renames          | renaming     | renamed    |
//! | has_primitive    | type         | method     |
//! | has_parameter    | subprogram   | parameter  |
//! | instance_of      | instance     | generic    |
//! | pointed_type     | access type  | designated |
//! | component_type   | array type   | component  |

mod files;

use rusqlite::{params, OptionalExtension, Params};
use std::path::PathBuf;

use crate::domain::{
    relation_kinds, Entity, EntityDeclaration, EntityFlags, ParameterKind, Reference, SourceFile,
};
use crate::error::Result;
use crate::features::cursor::{EntityCursor, ParameterCursor, ReferenceCursor};
use crate::infrastructure::XrefDatabase;
use crate::shared::rows::{reference_from_row, DECLARATION_SELECT, REFERENCE_SELECT};

const DECLARATION_DETAILS: &str = "
    SELECT e.id, e.decl_file, f.path, e.decl_line, e.decl_column,
           e.name, e.kind, e.is_global, e.is_static_local, e.kind_flags,
           COALESCE(k.display, 'declaration')
    FROM entities e
    LEFT JOIN files f ON f.id = e.decl_file
    LEFT JOIN reference_kinds k ON k.id = 'D'
    WHERE e.id = ?1";

fn declaration_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntityDeclaration> {
    let file_id: Option<i64> = row.get(1)?;
    let path: Option<String> = row.get(2)?;

    let mut location = Reference::null();
    location.entity = Entity::from_raw(row.get(0)?);
    location.file = match (file_id, path) {
        (Some(id), Some(path)) => Some(SourceFile {
            path: PathBuf::from(path),
            id,
        }),
        _ => None,
    };
    location.line = row.get(3)?;
    location.column = row.get(4)?;
    location.kind = row.get(10)?;

    Ok(EntityDeclaration {
        name: row.get(5)?,
        kind: row.get(6)?,
        location,
        flags: EntityFlags {
            is_global: row.get(7)?,
            is_static_local: row.get(8)?,
            ..Default::default()
        }
        .with_kind_bits(row.get(9)?),
    })
}

impl XrefDatabase {
    pub(crate) fn entity_rows<P: Params>(&self, sql: &str, params: P) -> Result<EntityCursor<'_>> {
        let mut stmt = self.conn().prepare_cached(sql)?;
        let rows = stmt
            .query_map(params, |row| row.get::<_, i64>(0))?
            .map(|id| id.map(Entity::from_raw))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(EntityCursor::new(rows))
    }

    pub(crate) fn reference_rows<P: Params>(&self, sql: &str, params: P) -> Result<ReferenceCursor<'_>> {
        let mut stmt = self.conn().prepare_cached(sql)?;
        let rows = stmt
            .query_map(params, reference_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ReferenceCursor::new(rows))
    }

    /// Targets of `kind` edges leaving `entity`, in source order
    fn related_from(&self, entity: Entity, kind: &str) -> Result<EntityCursor<'_>> {
        self.entity_rows(
            "SELECT to_entity FROM e2e
             WHERE from_entity = ?1 AND kind = ?2
             GROUP BY to_entity
             ORDER BY MIN(order_by), to_entity",
            params![entity.id(), kind],
        )
    }

    /// Sources of `kind` edges arriving at `entity`
    fn related_to(&self, entity: Entity, kind: &str) -> Result<EntityCursor<'_>> {
        self.entity_rows(
            "SELECT DISTINCT from_entity FROM e2e
             WHERE to_entity = ?1 AND kind = ?2
             ORDER BY from_entity",
            params![entity.id(), kind],
        )
    }

    fn first_related_from(&self, entity: Entity, kind: &str) -> Result<Entity> {
        Ok(self.related_from(entity, kind)?.next().unwrap_or(Entity::NONE))
    }

    /// Declaration of `entity`; `EntityDeclaration::none()` when unknown
    pub fn get_declaration(&self, entity: Entity) -> Result<EntityDeclaration> {
        let found = self
            .conn()
            .query_row(DECLARATION_DETAILS, params![entity.id()], declaration_from_row)
            .optional()?;
        Ok(found.unwrap_or_else(EntityDeclaration::none))
    }

    /// Every reference to `entity`, including its declaration, ordered by
    /// file path, line, column and kind id
    pub fn references(&self, entity: Entity) -> Result<ReferenceCursor<'_>> {
        let sql = format!(
            "{} WHERE r.entity = ?1
             UNION ALL
             {} WHERE e.id = ?1 AND e.decl_file IS NOT NULL
             ORDER BY 3, 4, 5, 6, 1",
            REFERENCE_SELECT, DECLARATION_SELECT
        );
        self.reference_rows(&sql, params![entity.id()])
    }

    /// Body and completion references of `entity`
    pub fn bodies(&self, entity: Entity) -> Result<ReferenceCursor<'_>> {
        let sql = format!(
            "{} WHERE r.entity = ?1 AND r.kind_id IN ('b', 'c')
             ORDER BY f.path, r.line, r.col",
            REFERENCE_SELECT
        );
        self.reference_rows(&sql, params![entity.id()])
    }

    /// Entities called from within `entity`
    pub fn calls(&self, entity: Entity) -> Result<EntityCursor<'_>> {
        self.entity_rows(
            "SELECT DISTINCT r.entity FROM entity_refs r
             JOIN reference_kinds k ON k.id = r.kind_id
             WHERE r.scope = ?1 AND k.show_in_callgraph = 1
             ORDER BY r.entity",
            params![entity.id()],
        )
    }

    /// Call sites within `entity`
    pub fn call_sites(&self, entity: Entity) -> Result<ReferenceCursor<'_>> {
        let sql = format!(
            "{} WHERE r.scope = ?1 AND k.show_in_callgraph = 1
             ORDER BY f.path, r.line, r.col, r.entity",
            REFERENCE_SELECT
        );
        self.reference_rows(&sql, params![entity.id()])
    }

    /// Entities whose bodies call `entity`
    pub fn callers(&self, entity: Entity) -> Result<EntityCursor<'_>> {
        self.entity_rows(
            "SELECT DISTINCT r.scope FROM entity_refs r
             JOIN reference_kinds k ON k.id = r.kind_id
             WHERE r.entity = ?1 AND r.scope IS NOT NULL AND k.show_in_callgraph = 1
             ORDER BY r.scope",
            params![entity.id()],
        )
    }

    pub fn parent_types(&self, entity: Entity) -> Result<EntityCursor<'_>> {
        self.related_from(entity, relation_kinds::PARENT_TYPE)
    }

    pub fn child_types(&self, entity: Entity) -> Result<EntityCursor<'_>> {
        self.related_to(entity, relation_kinds::PARENT_TYPE)
    }

    /// The primitive operation `entity` overrides, or `Entity::NONE`
    pub fn overrides(&self, entity: Entity) -> Result<Entity> {
        self.first_related_from(entity, relation_kinds::OVERRIDES)
    }

    pub fn overridden_by(&self, entity: Entity) -> Result<EntityCursor<'_>> {
        self.related_to(entity, relation_kinds::OVERRIDES)
    }

    /// The entity `entity` renames, or `Entity::NONE`
    pub fn renaming_of(&self, entity: Entity) -> Result<Entity> {
        self.first_related_from(entity, relation_kinds::RENAMES)
    }

    /// Generic `entity` is an instantiation of, or `Entity::NONE`
    pub fn instance_of(&self, entity: Entity) -> Result<Entity> {
        self.first_related_from(entity, relation_kinds::INSTANCE_OF)
    }

    pub fn instantiations(&self, entity: Entity) -> Result<EntityCursor<'_>> {
        self.related_to(entity, relation_kinds::INSTANCE_OF)
    }

    /// Primitive operations of a type
    pub fn methods(&self, entity: Entity) -> Result<EntityCursor<'_>> {
        self.related_from(entity, relation_kinds::HAS_PRIMITIVE)
    }

    pub fn fields(&self, entity: Entity) -> Result<EntityCursor<'_>> {
        self.related_from(entity, relation_kinds::HAS_FIELD)
    }

    pub fn discriminants(&self, entity: Entity) -> Result<EntityCursor<'_>> {
        self.related_from(entity, relation_kinds::HAS_DISCRIMINANT)
    }

    pub fn literals(&self, entity: Entity) -> Result<EntityCursor<'_>> {
        self.related_from(entity, relation_kinds::HAS_LITERAL)
    }

    /// Formal parameters of a subprogram, in declaration order
    pub fn formal_parameters(&self, entity: Entity) -> Result<ParameterCursor<'_>> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT to_entity, parameter_kind FROM e2e
             WHERE from_entity = ?1 AND kind = ?2
             ORDER BY order_by, to_entity",
        )?;
        let rows = stmt
            .query_map(params![entity.id(), relation_kinds::HAS_PARAMETER], |row| {
                let kind: Option<String> = row.get(1)?;
                Ok((
                    Entity::from_raw(row.get(0)?),
                    kind.as_deref()
                        .and_then(ParameterKind::parse)
                        .unwrap_or(ParameterKind::In),
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ParameterCursor::new(rows))
    }

    /// Subprogram declaring the parameter `entity`, or `Entity::NONE`
    pub fn parameter_of(&self, entity: Entity) -> Result<Entity> {
        Ok(self
            .related_to(entity, relation_kinds::HAS_PARAMETER)?
            .next()
            .unwrap_or(Entity::NONE))
    }

    /// Designated type of an access type, or `Entity::NONE`
    pub fn pointed_type(&self, entity: Entity) -> Result<Entity> {
        self.first_related_from(entity, relation_kinds::POINTED_TYPE)
    }

    /// Component type of an array type, or `Entity::NONE`
    pub fn component_type(&self, entity: Entity) -> Result<Entity> {
        self.first_related_from(entity, relation_kinds::COMPONENT_TYPE)
    }

    /// Every entity declared with this exact name
    pub fn entities_named(&self, name: &str) -> Result<EntityCursor<'_>> {
        self.entity_rows(
            "SELECT id FROM entities WHERE name = ?1 ORDER BY id",
            params![name],
        )
    }
}
