//! File-level queries: known files, dependencies, entities referenced in a file

use rusqlite::{params, OptionalExtension};
use std::path::Path;

use crate::domain::{SourceFile, FILE_DEPENDENCY_KIND};
use crate::error::Result;
use crate::features::cursor::{EntityCursor, FileCursor};
use crate::infrastructure::XrefDatabase;
use crate::shared::paths::canonical_path;
use crate::shared::rows::file_from_row;

impl XrefDatabase {
    fn file_rows(&self, sql: &str, file: &SourceFile) -> Result<FileCursor<'_>> {
        let mut stmt = self.conn().prepare_cached(sql)?;
        let rows = stmt
            .query_map(params![file.id, FILE_DEPENDENCY_KIND], file_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(FileCursor::new(rows))
    }

    /// Every known file, ordered by path
    pub fn all_files(&self) -> Result<FileCursor<'_>> {
        let mut stmt = self
            .conn()
            .prepare_cached("SELECT id, path FROM files ORDER BY path")?;
        let rows = stmt
            .query_map([], file_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(FileCursor::new(rows))
    }

    /// The file stored under the canonical form of `path`
    pub fn file(&self, path: impl AsRef<Path>) -> Result<Option<SourceFile>> {
        let canonical = canonical_path(path.as_ref());
        Ok(self
            .conn()
            .query_row(
                "SELECT id, path FROM files WHERE path = ?1",
                params![canonical],
                file_from_row,
            )
            .optional()?)
    }

    /// Files `file` directly depends on
    pub fn imports(&self, file: &SourceFile) -> Result<FileCursor<'_>> {
        self.file_rows(
            "SELECT DISTINCT f.id, f.path FROM f2f d
             JOIN files f ON f.id = d.to_file
             WHERE d.from_file = ?1 AND d.kind = ?2
             ORDER BY f.path",
            file,
        )
    }

    /// Files directly depending on `file`
    pub fn imported_by(&self, file: &SourceFile) -> Result<FileCursor<'_>> {
        self.file_rows(
            "SELECT DISTINCT f.id, f.path FROM f2f d
             JOIN files f ON f.id = d.from_file
             WHERE d.to_file = ?1 AND d.kind = ?2
             ORDER BY f.path",
            file,
        )
    }

    /// Transitive dependencies of `file`, excluding `file` itself
    pub fn depends_on(&self, file: &SourceFile) -> Result<FileCursor<'_>> {
        // UNION (not UNION ALL) drops revisited rows, so cycles terminate
        self.file_rows(
            "WITH RECURSIVE deps(id) AS (
                 SELECT to_file FROM f2f WHERE from_file = ?1 AND kind = ?2
                 UNION
                 SELECT d.to_file FROM f2f d
                 JOIN deps ON d.from_file = deps.id
                 WHERE d.kind = ?2
             )
             SELECT f.id, f.path FROM files f
             JOIN deps ON deps.id = f.id
             WHERE f.id != ?1
             ORDER BY f.path",
            file,
        )
    }

    /// Entities referenced or declared in `file`, optionally only those named `name`
    pub fn referenced_in(&self, file: &SourceFile, name: Option<&str>) -> Result<EntityCursor<'_>> {
        self.entity_rows(
            "SELECT r.entity FROM entity_refs r
             JOIN entities e ON e.id = r.entity
             WHERE r.file = ?1 AND (?2 IS NULL OR e.name = ?2)
             UNION
             SELECT e.id FROM entities e
             WHERE e.decl_file = ?1 AND (?2 IS NULL OR e.name = ?2)
             ORDER BY 1",
            params![file.id, name],
        )
    }
}
