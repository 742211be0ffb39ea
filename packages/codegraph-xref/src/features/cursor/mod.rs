//! Cursor abstraction
//!
//! Forward-only, single-pass views over query results: `has_element`,
//! `element`, `advance`. No rewind, no random access.
//!
//! A cursor borrows the `XrefDatabase` that produced it, so the borrow
//! checker rejects any use after the database is dropped. Rows are fetched
//! when the query runs: a rusqlite `Rows` borrows its `Statement`, which
//! cannot be returned alongside it, so each cursor owns its fetched rows
//! and releases them on drop.
//!
//! Every cursor is also an `Iterator`, so `for`, `collect` and adapters work.
//!
//! ```rust,ignore
//! let mut refs = db.references(entity)?;
//! while refs.has_element() {
//!     let r = refs.element().unwrap();
//!     println!("{}:{}", r.line, r.column);
//!     refs.advance();
//! }
//! ```

use std::marker::PhantomData;

use crate::domain::{Entity, ParameterKind, Reference, SourceFile};
use crate::infrastructure::XrefDatabase;

/// Forward-only iteration protocol
pub trait Cursor {
    type Element;

    fn has_element(&self) -> bool;

    /// Current element, None once exhausted
    fn element(&self) -> Option<&Self::Element>;

    fn advance(&mut self);
}

/// Cursor over a query's result rows
pub struct ResultCursor<'db, T> {
    current: Option<T>,
    rest: std::vec::IntoIter<T>,
    _db: PhantomData<&'db XrefDatabase>,
}

impl<'db, T> ResultCursor<'db, T> {
    pub(crate) fn new(rows: Vec<T>) -> Self {
        let mut rest = rows.into_iter();
        Self {
            current: rest.next(),
            rest,
            _db: PhantomData,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Elements not yet consumed, including the current one
    pub fn remaining(&self) -> usize {
        usize::from(self.current.is_some()) + self.rest.len()
    }
}

impl<'db, T> Cursor for ResultCursor<'db, T> {
    type Element = T;

    fn has_element(&self) -> bool {
        self.current.is_some()
    }

    fn element(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn advance(&mut self) {
        self.current = self.rest.next();
    }
}

impl<'db, T> Iterator for ResultCursor<'db, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let current = self.current.take();
        self.current = self.rest.next();
        current
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl<'db, T> ExactSizeIterator for ResultCursor<'db, T> {}

impl<'db, T: std::fmt::Debug> std::fmt::Debug for ResultCursor<'db, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCursor")
            .field("current", &self.current)
            .field("remaining", &self.remaining())
            .finish()
    }
}

pub type ReferenceCursor<'db> = ResultCursor<'db, Reference>;
pub type EntityCursor<'db> = ResultCursor<'db, Entity>;
/// Formal parameters, in declaration order
pub type ParameterCursor<'db> = ResultCursor<'db, (Entity, ParameterKind)>;
pub type FileCursor<'db> = ResultCursor<'db, SourceFile>;
