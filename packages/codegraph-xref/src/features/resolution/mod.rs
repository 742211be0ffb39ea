//! Entity Resolution
//!
//! `resolve_entity` returns the best reference for a name at a place:
//!
//! 1. exact: a reference (or the declaration) of that name at the requested
//!    file/line/column; without a column, the leftmost one on the line;
//!    without a line, the declaration in that file
//! 2. nearby: the closest reference of that name in the matched files,
//!    marked fuzzy
//! 3. name only: the declaration with the lowest id, marked fuzzy
//!
//! Nothing found is `Reference::null()`, never an error.

mod path_match;
mod visible_column;

pub use visible_column::{to_byte_column, to_visible_column};

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::domain::{Reference, DECLARATION_KIND_ID};
use crate::error::Result;
use crate::infrastructure::XrefDatabase;
use crate::shared::rows::{reference_from_row, DECLARATION_SELECT, REFERENCE_SELECT};
use path_match::file_ids_json;

impl XrefDatabase {
    pub fn resolve_entity(
        &self,
        name: &str,
        file: &str,
        line: Option<i32>,
        column: Option<i32>,
    ) -> Result<Reference> {
        if name.is_empty() {
            return Ok(Reference::null());
        }

        let files: Vec<_> = self.files_matching(file)?.collect();
        if !files.is_empty() {
            let candidates = self.candidates_in_files(name, &file_ids_json(&files))?;

            let found = match line {
                Some(line) => pick_by_position(candidates, line, column),
                None => candidates
                    .into_iter()
                    .find(|r| r.kind_id == DECLARATION_KIND_ID),
            };
            if let Some(found) = found {
                return Ok(found);
            }
        }

        debug!("No match for {} in {:?}, falling back to name search", name, file);
        self.lookup_by_name(name)
    }

    /// References and declarations named `name` in the given files, sorted
    fn candidates_in_files(&self, name: &str, file_ids: &str) -> Result<Vec<Reference>> {
        let mut candidates = Vec::new();

        let refs_sql = format!(
            "{} JOIN entities e ON e.id = r.entity
             WHERE e.name = ?1 AND r.file IN (SELECT value FROM json_each(?2))",
            REFERENCE_SELECT
        );
        let decls_sql = format!(
            "{} WHERE e.name = ?1 AND e.decl_file IN (SELECT value FROM json_each(?2))",
            DECLARATION_SELECT
        );

        for sql in [refs_sql, decls_sql] {
            let mut stmt = self.conn().prepare_cached(&sql)?;
            let rows = stmt.query_map(params![name, file_ids], reference_from_row)?;
            for row in rows {
                candidates.push(row?);
            }
        }

        candidates.sort();
        Ok(candidates)
    }

    /// Name-only fallback: the lowest-id declaration of `name`, fuzzy
    fn lookup_by_name(&self, name: &str) -> Result<Reference> {
        let sql = format!("{} WHERE e.name = ?1 ORDER BY e.id LIMIT 1", DECLARATION_SELECT);
        let found = self
            .conn()
            .query_row(&sql, params![name], reference_from_row)
            .optional()?;

        Ok(found
            .map(Reference::into_fuzzy)
            .unwrap_or_else(Reference::null))
    }
}

/// Exact hit at (line, column), else the nearest candidate marked fuzzy.
/// `candidates` must be sorted.
fn pick_by_position(candidates: Vec<Reference>, line: i32, column: Option<i32>) -> Option<Reference> {
    let exact = candidates
        .iter()
        .position(|r| r.line == line && column.map_or(true, |c| r.column == c));
    if let Some(index) = exact {
        return candidates.into_iter().nth(index);
    }

    let wanted_column = column.unwrap_or(1);
    candidates
        .into_iter()
        .filter(|r| r.line > 0)
        .min_by_key(|r| {
            (
                (r.line - line).abs(),
                (r.column - wanted_column).abs(),
                r.line,
                r.column,
                r.entity,
            )
        })
        .map(Reference::into_fuzzy)
}
