//! Reference-Kind Classifier
//!
//! Kinds live in the `reference_kinds` table. Predicates look up the row for
//! a reference's kind id and never fail: a missing row or a storage error
//! yields all-false attributes.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::domain::{Reference, ReferenceKind, ReferenceKindAttrs};
use crate::error::Result;
use crate::infrastructure::XrefDatabase;
use crate::shared::rows::kind_char;

const KIND_COLUMNS: &str = "id, display, is_real, is_read, is_write, is_end, \
                            is_implicit, is_dispatching, show_in_callgraph";

fn kind_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferenceKind> {
    let id: String = row.get(0)?;
    Ok(ReferenceKind {
        id: kind_char(&id),
        display: row.get(1)?,
        attrs: ReferenceKindAttrs {
            is_real: row.get(2)?,
            is_read: row.get(3)?,
            is_write: row.get(4)?,
            is_end: row.get(5)?,
            is_implicit: row.get(6)?,
            is_dispatching: row.get(7)?,
            show_in_callgraph: row.get(8)?,
        },
    })
}

impl XrefDatabase {
    /// Attributes of a kind id; all-false for unknown kinds
    pub fn reference_kind_attrs(&self, kind_id: char) -> ReferenceKindAttrs {
        let sql = format!("SELECT {} FROM reference_kinds WHERE id = ?1", KIND_COLUMNS);
        let found = self
            .conn()
            .query_row(&sql, params![kind_id.to_string()], kind_from_row)
            .optional();

        match found {
            Ok(Some(kind)) => kind.attrs,
            Ok(None) => ReferenceKindAttrs::default(),
            Err(e) => {
                debug!("reference kind {:?} lookup failed: {}", kind_id, e);
                ReferenceKindAttrs::default()
            }
        }
    }

    /// The name actually appears at this location
    pub fn is_real_reference(&self, reference: &Reference) -> bool {
        self.reference_kind_attrs(reference.kind_id).is_real
    }

    pub fn is_read_reference(&self, reference: &Reference) -> bool {
        self.reference_kind_attrs(reference.kind_id).is_read
    }

    pub fn is_write_reference(&self, reference: &Reference) -> bool {
        self.reference_kind_attrs(reference.kind_id).is_write
    }

    pub fn is_read_or_write_reference(&self, reference: &Reference) -> bool {
        let attrs = self.reference_kind_attrs(reference.kind_id);
        attrs.is_read || attrs.is_write
    }

    pub fn is_implicit_reference(&self, reference: &Reference) -> bool {
        self.reference_kind_attrs(reference.kind_id).is_implicit
    }

    pub fn is_dispatching_call(&self, reference: &Reference) -> bool {
        self.reference_kind_attrs(reference.kind_id).is_dispatching
    }

    pub fn show_in_callgraph(&self, reference: &Reference) -> bool {
        self.reference_kind_attrs(reference.kind_id).show_in_callgraph
    }

    /// All known kinds, ordered by kind id
    pub fn reference_kinds(&self) -> Result<Vec<ReferenceKind>> {
        let sql = format!("SELECT {} FROM reference_kinds ORDER BY id", KIND_COLUMNS);
        let mut stmt = self.conn().prepare(&sql)?;
        let kinds = stmt
            .query_map([], kind_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(kinds)
    }

    /// Real-reference kinds, one entry per kind id even when display names collide
    pub fn real_reference_kinds(&self) -> Result<Vec<ReferenceKind>> {
        let sql = format!(
            "SELECT {} FROM reference_kinds WHERE is_real = 1 ORDER BY display, id",
            KIND_COLUMNS
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let kinds = stmt
            .query_map([], kind_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(kinds)
    }

    /// Add or replace a kind row. New front ends register their kinds here.
    pub fn register_reference_kind(&self, kind: &ReferenceKind) -> Result<()> {
        let a = &kind.attrs;
        self.conn().execute(
            "INSERT INTO reference_kinds
             (id, display, is_real, is_read, is_write, is_end, is_implicit, is_dispatching, show_in_callgraph)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                display = excluded.display,
                is_real = excluded.is_real,
                is_read = excluded.is_read,
                is_write = excluded.is_write,
                is_end = excluded.is_end,
                is_implicit = excluded.is_implicit,
                is_dispatching = excluded.is_dispatching,
                show_in_callgraph = excluded.show_in_callgraph",
            params![
                kind.id.to_string(),
                kind.display,
                a.is_real,
                a.is_read,
                a.is_write,
                a.is_end,
                a.is_implicit,
                a.is_dispatching,
                a.show_in_callgraph
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_of_kind(kind_id: char) -> Reference {
        let mut r = Reference::null();
        r.kind_id = kind_id;
        r
    }

    #[test]
    fn test_standard_kinds() {
        let db = XrefDatabase::in_memory().unwrap();

        let call = reference_of_kind('s');
        assert!(db.is_real_reference(&call));
        assert!(db.is_read_reference(&call));
        assert!(db.show_in_callgraph(&call));
        assert!(!db.is_dispatching_call(&call));

        let dispatch = reference_of_kind('R');
        assert!(db.is_dispatching_call(&dispatch));

        let write = reference_of_kind('m');
        assert!(db.is_write_reference(&write));
        assert!(!db.is_read_reference(&write));
        assert!(db.is_read_or_write_reference(&write));

        let implicit = reference_of_kind('i');
        assert!(db.is_implicit_reference(&implicit));
        assert!(!db.is_real_reference(&implicit));
    }

    #[test]
    fn test_unknown_kind_is_all_false() {
        let db = XrefDatabase::in_memory().unwrap();
        let unknown = reference_of_kind('!');

        assert_eq!(db.reference_kind_attrs('!'), ReferenceKindAttrs::default());
        assert!(!db.is_real_reference(&unknown));
        assert!(!db.is_read_or_write_reference(&unknown));
        assert!(!db.show_in_callgraph(&unknown));
    }

    #[test]
    fn test_duplicate_display_names_listed_separately() {
        let db = XrefDatabase::in_memory().unwrap();
        db.register_reference_kind(&ReferenceKind {
            id: 'Q',
            display: "reference".to_string(),
            attrs: ReferenceKindAttrs {
                is_real: true,
                is_read: true,
                ..Default::default()
            },
        })
        .unwrap();

        let named_reference: Vec<char> = db
            .real_reference_kinds()
            .unwrap()
            .into_iter()
            .filter(|k| k.display == "reference")
            .map(|k| k.id)
            .collect();
        assert_eq!(named_reference, vec!['Q', 'r']);
        assert!(db.is_read_reference(&reference_of_kind('Q')));
    }

    #[test]
    fn test_real_kinds_exclude_implicit() {
        let db = XrefDatabase::in_memory().unwrap();
        let kinds = db.real_reference_kinds().unwrap();
        assert!(kinds.iter().all(|k| k.attrs.is_real));
        assert!(!kinds.iter().any(|k| k.id == 'i'));
        assert!(db.reference_kinds().unwrap().len() > kinds.len());
    }
}
