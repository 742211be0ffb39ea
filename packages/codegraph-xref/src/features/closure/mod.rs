//! Recursive Closure Engine
//!
//! Turns a one-step relation (`compute`: entity -> cursor over its direct
//! relation) into a cursor over the transitive closure from a seed.
//!
//! State:
//! - `visited`: entities already expanded (compute called on them)
//! - `to_visit`: discovered, not yet expanded; popped in id order
//! - `emitted`: elements already yielded
//!
//! An entity is expanded at most once, so cycles in call or override graphs
//! terminate. The seed itself is yielded only if the relation reaches it.
//! `ClosureFlags` add the seed-side override/renaming neighbours of every
//! expanded entity to the frontier; they share the single `visited` set.

use std::collections::BTreeSet;
use tracing::debug;

use crate::domain::{Entity, ParameterKind, Reference};
use crate::error::Result;
use crate::features::cursor::{Cursor, ResultCursor};
use crate::infrastructure::XrefDatabase;

/// Extra neighbours expanded along with each entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureFlags {
    /// Also expand the subprograms overriding each entity
    pub from_overriding: bool,
    /// Also expand the subprogram each entity overrides
    pub from_overridden: bool,
    /// Also expand the entity each entity renames
    pub from_renames: bool,
}

impl ClosureFlags {
    pub fn all() -> Self {
        Self {
            from_overriding: true,
            from_overridden: true,
            from_renames: true,
        }
    }
}

/// Element of a closure: whatever it is, it points at the next entity to expand
pub trait ClosureElement: Clone + Ord {
    fn target(&self) -> Entity;
}

impl ClosureElement for Entity {
    fn target(&self) -> Entity {
        *self
    }
}

impl ClosureElement for Reference {
    fn target(&self) -> Entity {
        self.entity
    }
}

impl ClosureElement for (Entity, ParameterKind) {
    fn target(&self) -> Entity {
        self.0
    }
}

/// Transitive closure cursor; see the module docs
pub struct RecursiveCursor<'db, T, F>
where
    T: ClosureElement,
    F: FnMut(&'db XrefDatabase, Entity) -> Result<ResultCursor<'db, T>>,
{
    db: &'db XrefDatabase,
    compute: F,
    flags: ClosureFlags,
    direct: ResultCursor<'db, T>,
    visited: BTreeSet<Entity>,
    to_visit: BTreeSet<Entity>,
    emitted: BTreeSet<T>,
    current: Option<T>,
}

impl<'db, T, F> RecursiveCursor<'db, T, F>
where
    T: ClosureElement,
    F: FnMut(&'db XrefDatabase, Entity) -> Result<ResultCursor<'db, T>>,
{
    fn new(db: &'db XrefDatabase, seed: Entity, compute: F, flags: ClosureFlags) -> Self {
        let mut to_visit = BTreeSet::new();
        if !seed.is_none() {
            to_visit.insert(seed);
        }

        let mut cursor = Self {
            db,
            compute,
            flags,
            direct: ResultCursor::empty(),
            visited: BTreeSet::new(),
            to_visit,
            emitted: BTreeSet::new(),
            current: None,
        };
        cursor.settle();
        cursor
    }

    /// Entities expanded so far
    pub fn visited(&self) -> &BTreeSet<Entity> {
        &self.visited
    }

    fn schedule(&mut self, entity: Entity) {
        if !entity.is_none() && !self.visited.contains(&entity) {
            self.to_visit.insert(entity);
        }
    }

    fn report(&self, entity: Entity, err: &crate::error::XrefError) {
        self.db
            .report_error(&format!("closure: expanding entity {}: {}", entity.id(), err));
    }

    fn expand(&mut self, entity: Entity) {
        debug_assert!(!self.visited.contains(&entity), "entity expanded twice");
        self.visited.insert(entity);
        let db = self.db;

        if self.flags.from_overriding {
            match db.overridden_by(entity) {
                Ok(overriding) => overriding.for_each(|e| self.schedule(e)),
                Err(err) => self.report(entity, &err),
            }
        }
        if self.flags.from_overridden {
            match db.overrides(entity) {
                Ok(parent) => self.schedule(parent),
                Err(err) => self.report(entity, &err),
            }
        }
        if self.flags.from_renames {
            match db.renaming_of(entity) {
                Ok(renamed) => self.schedule(renamed),
                Err(err) => self.report(entity, &err),
            }
        }

        self.direct = match (self.compute)(db, entity) {
            Ok(direct) => direct,
            Err(err) => {
                self.report(entity, &err);
                ResultCursor::empty()
            }
        };
    }

    /// Move to the next element not yet emitted, expanding the frontier as needed
    fn settle(&mut self) {
        loop {
            if let Some(element) = self.direct.next() {
                if self.emitted.contains(&element) {
                    continue;
                }
                self.schedule(element.target());
                self.emitted.insert(element.clone());
                self.current = Some(element);
                return;
            }

            match self.to_visit.pop_first() {
                Some(next) => self.expand(next),
                None => {
                    debug!(
                        "Closure done: {} expanded, {} emitted",
                        self.visited.len(),
                        self.emitted.len()
                    );
                    self.current = None;
                    return;
                }
            }
        }
    }
}

impl<'db, T, F> Cursor for RecursiveCursor<'db, T, F>
where
    T: ClosureElement,
    F: FnMut(&'db XrefDatabase, Entity) -> Result<ResultCursor<'db, T>>,
{
    type Element = T;

    fn has_element(&self) -> bool {
        self.current.is_some()
    }

    fn element(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn advance(&mut self) {
        if self.current.is_some() {
            self.settle();
        }
    }
}

impl<'db, T, F> Iterator for RecursiveCursor<'db, T, F>
where
    T: ClosureElement,
    F: FnMut(&'db XrefDatabase, Entity) -> Result<ResultCursor<'db, T>>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let current = self.current.take()?;
        self.settle();
        Some(current)
    }
}

impl XrefDatabase {
    /// Transitive closure of `compute` from `seed`
    ///
    /// ```rust,ignore
    /// let reachable: Vec<Entity> = db
    ///     .recursive(main, XrefDatabase::calls, ClosureFlags::default())
    ///     .collect();
    /// ```
    pub fn recursive<'db, T, F>(
        &'db self,
        seed: Entity,
        compute: F,
        flags: ClosureFlags,
    ) -> RecursiveCursor<'db, T, F>
    where
        T: ClosureElement,
        F: FnMut(&'db XrefDatabase, Entity) -> Result<ResultCursor<'db, T>>,
    {
        RecursiveCursor::new(self, seed, compute, flags)
    }
}
