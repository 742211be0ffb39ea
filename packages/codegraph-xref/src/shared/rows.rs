//! SQL fragments and row mappers shared by the query modules

use rusqlite::Row;
use std::path::PathBuf;

use crate::domain::{Entity, Reference, SourceFile, DECLARATION_KIND_ID};

/// Columns: entity, file id, path, line, col, kind id, display, is_end, scope
pub const REFERENCE_SELECT: &str = "
    SELECT r.entity, r.file, f.path, r.line, r.col, r.kind_id,
           COALESCE(k.display, r.kind_id), COALESCE(k.is_end, 0), r.scope
    FROM entity_refs r
    JOIN files f ON f.id = r.file
    LEFT JOIN reference_kinds k ON k.id = r.kind_id";

/// Declarations shaped like `REFERENCE_SELECT`; kind id 'D' is `DECLARATION_KIND_ID`
pub const DECLARATION_SELECT: &str = "
    SELECT e.id, e.decl_file, f.path, e.decl_line, e.decl_column, 'D',
           COALESCE(k.display, 'declaration'), 0, NULL
    FROM entities e
    LEFT JOIN files f ON f.id = e.decl_file
    LEFT JOIN reference_kinds k ON k.id = 'D'";

pub fn kind_char(raw: &str) -> char {
    raw.chars().next().unwrap_or(DECLARATION_KIND_ID)
}

pub fn reference_from_row(row: &Row<'_>) -> rusqlite::Result<Reference> {
    let file_id: Option<i64> = row.get(1)?;
    let path: Option<String> = row.get(2)?;
    let kind_id: String = row.get(5)?;

    Ok(Reference {
        entity: Entity::from_raw(row.get(0)?),
        file: match (file_id, path) {
            (Some(id), Some(path)) => Some(SourceFile {
                path: PathBuf::from(path),
                id,
            }),
            _ => None,
        },
        line: row.get(3)?,
        column: row.get(4)?,
        kind: row.get(6)?,
        kind_id: kind_char(&kind_id),
        scope: Entity::from_nullable(row.get(8)?),
        is_end_of_scope: row.get(7)?,
    })
}

pub fn file_from_row(row: &Row<'_>) -> rusqlite::Result<SourceFile> {
    let path: String = row.get(1)?;
    Ok(SourceFile {
        path: PathBuf::from(path),
        id: row.get(0)?,
    })
}
