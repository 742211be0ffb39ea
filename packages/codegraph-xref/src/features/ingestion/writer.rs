//! Per-unit writer
//!
//! Replaces one unit's rows inside a single transaction: the unit's
//! references, relations and file dependencies are deleted and reinserted.
//! Entities are matched by key (name plus declaration location) so ids
//! survive re-ingestion. A unit owns the entities declared in its own
//! source files; entities it only mentions become ownerless stubs until
//! their declaring unit arrives.

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::domain::{
    EntityKey, EntityRecord, Location, UnitIndex, FILE_DEPENDENCY_KIND,
};
use crate::error::{Result, XrefError};
use crate::shared::paths::canonical_path;

/// Write `unit` into `conn`, replacing whatever it contributed before
pub(crate) fn write_unit(conn: &Connection, unit: &UnitIndex) -> Result<()> {
    validate(unit)?;

    let tx = conn.unchecked_transaction()?;
    UnitWriter::new(&tx, unit)
        .and_then(|mut writer| writer.write(unit))
        .map_err(|err| unit_error(unit, err))?;
    tx.commit()?;

    debug!(
        "Wrote unit {} ({} entities, {} references)",
        unit.index_file.display(),
        unit.entities.len(),
        unit.references.len()
    );
    Ok(())
}

/// Insert an entity outside any unit; returns the existing id if the key is known
pub(crate) fn write_dynamic_entity(conn: &Connection, record: &EntityRecord) -> Result<i64> {
    validate_entity(record).map_err(|msg| XrefError::source_defect("<dynamic>", msg))?;

    let tx = conn.unchecked_transaction()?;
    let mut files = FileIds::default();
    let decl = match &record.decl {
        Some(loc) => Some((files.get(&tx, &loc.file)?, loc.line, loc.column)),
        None => None,
    };

    let id = match find_entity(&tx, &record.name, decl)? {
        Some((id, _)) => id,
        None => {
            let (file, line, column) = split_decl(decl);
            tx.execute(
                "INSERT INTO entities
                 (name, kind, decl_file, decl_line, decl_column, is_global, is_static_local,
                  kind_flags, unit, dynamic)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, 1)",
                params![
                    record.name,
                    record.kind,
                    file,
                    line,
                    column,
                    record.flags.is_global,
                    record.flags.is_static_local,
                    record.flags.kind_bits()
                ],
            )?;
            tx.last_insert_rowid()
        }
    };
    tx.commit()?;
    Ok(id)
}

/// Delete stubs nothing points at any more
pub(crate) fn purge_orphans(conn: &Connection) -> Result<usize> {
    let purged = conn.execute(
        "DELETE FROM entities
         WHERE unit IS NULL AND dynamic = 0
           AND NOT EXISTS (SELECT 1 FROM entity_refs r WHERE r.entity = entities.id OR r.scope = entities.id)
           AND NOT EXISTS (SELECT 1 FROM e2e WHERE e2e.from_entity = entities.id OR e2e.to_entity = entities.id)",
        [],
    )?;
    Ok(purged)
}

fn unit_error(unit: &UnitIndex, err: rusqlite::Error) -> XrefError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => {
            XrefError::source_defect(unit.index_file.display(), err.to_string())
        }
        _ => err.into(),
    }
}

fn validate(unit: &UnitIndex) -> Result<()> {
    let defect = |msg: String| XrefError::source_defect(unit.index_file.display(), msg);

    if unit.index_file.as_os_str().is_empty() {
        return Err(defect("unit has no index file".to_string()));
    }
    for record in &unit.entities {
        validate_entity(record).map_err(defect)?;
    }
    for r in &unit.references {
        validate_key(&r.entity).map_err(defect)?;
        if let Some(scope) = &r.scope {
            validate_key(scope).map_err(defect)?;
        }
        if !r.location.is_valid() {
            return Err(defect(format!(
                "reference to {} has invalid location {:?}",
                r.entity.name, r.location
            )));
        }
        if r.kind_id.is_whitespace() || r.kind_id.is_control() {
            return Err(defect(format!("reference to {} has no kind", r.entity.name)));
        }
    }
    for rel in &unit.relations {
        validate_key(&rel.from).map_err(defect)?;
        validate_key(&rel.to).map_err(defect)?;
        if rel.kind.is_empty() {
            return Err(defect(format!("relation from {} has no kind", rel.from.name)));
        }
    }
    Ok(())
}

fn validate_entity(record: &EntityRecord) -> std::result::Result<(), String> {
    validate_key(&record.key())
}

fn validate_key(key: &EntityKey) -> std::result::Result<(), String> {
    if key.name.is_empty() {
        return Err("entity with empty name".to_string());
    }
    match &key.decl {
        Some(loc) if !loc.is_valid() => Err(format!(
            "entity {} has invalid declaration {:?}",
            key.name, loc
        )),
        _ => Ok(()),
    }
}

type Decl = Option<(i64, i32, i32)>;

fn split_decl(decl: Decl) -> (Option<i64>, i32, i32) {
    match decl {
        Some((file, line, column)) => (Some(file), line, column),
        None => (None, -1, -1),
    }
}

/// (id, kind) of the entity with this name and declaration
fn find_entity(conn: &Connection, name: &str, decl: Decl) -> rusqlite::Result<Option<(i64, String)>> {
    let (file, line, column) = split_decl(decl);
    conn.prepare_cached(
        "SELECT id, kind FROM entities
         WHERE name = ?1 AND decl_file IS ?2 AND decl_line = ?3 AND decl_column = ?4
         ORDER BY id LIMIT 1",
    )?
    .query_row(params![name, file, line, column], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })
    .optional()
}

/// Path -> file id, inserting unknown paths
#[derive(Default)]
struct FileIds {
    cache: HashMap<String, i64>,
}

impl FileIds {
    fn get(&mut self, conn: &Connection, path: &Path) -> rusqlite::Result<i64> {
        let canonical = canonical_path(path);
        if let Some(id) = self.cache.get(&canonical) {
            return Ok(*id);
        }

        conn.prepare_cached("INSERT OR IGNORE INTO files (path) VALUES (?1)")?
            .execute(params![canonical])?;
        let id: i64 = conn
            .prepare_cached("SELECT id FROM files WHERE path = ?1")?
            .query_row(params![canonical], |row| row.get(0))?;
        self.cache.insert(canonical, id);
        Ok(id)
    }
}

struct UnitWriter<'c> {
    conn: &'c Connection,
    unit_id: i64,
    files: FileIds,
    source_files: HashSet<i64>,
    entities: HashMap<EntityKey, i64>,
    previously_owned: BTreeSet<i64>,
    kept: BTreeSet<i64>,
}

impl<'c> UnitWriter<'c> {
    fn new(conn: &'c Connection, unit: &UnitIndex) -> rusqlite::Result<Self> {
        let unit_id: i64 = conn.query_row(
            "INSERT INTO units (index_file, stamp, checksum) VALUES (?1, ?2, ?3)
             ON CONFLICT(index_file) DO UPDATE
             SET stamp = excluded.stamp, checksum = excluded.checksum, from_baseline = 0
             RETURNING id",
            params![
                unit.index_file.to_string_lossy(),
                unit.stamp,
                unit.checksum
            ],
            |row| row.get(0),
        )?;

        let previously_owned = conn
            .prepare_cached("SELECT id FROM entities WHERE unit = ?1")?
            .query_map(params![unit_id], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<i64>>>()?;

        Ok(Self {
            conn,
            unit_id,
            files: FileIds::default(),
            source_files: HashSet::new(),
            entities: HashMap::new(),
            previously_owned,
            kept: BTreeSet::new(),
        })
    }

    fn write(&mut self, unit: &UnitIndex) -> rusqlite::Result<()> {
        for table in ["entity_refs", "e2e", "f2f"] {
            self.conn
                .execute(&format!("DELETE FROM {} WHERE unit = ?1", table), params![self.unit_id])?;
        }

        for path in &unit.source_files {
            let id = self.files.get(self.conn, path)?;
            self.source_files.insert(id);
        }

        for record in &unit.entities {
            self.upsert_entity(record)?;
        }
        for r in &unit.references {
            self.insert_reference(r)?;
        }
        for rel in &unit.relations {
            let from = self.entity_id(&rel.from)?;
            let to = self.entity_id(&rel.to)?;
            self.conn
                .prepare_cached(
                    "INSERT INTO e2e (from_entity, to_entity, kind, order_by, parameter_kind, unit)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?
                .execute(params![
                    from,
                    to,
                    rel.kind,
                    rel.order,
                    rel.parameter_kind.map(|k| k.as_str()),
                    self.unit_id
                ])?;
        }
        self.insert_dependencies(unit)?;

        let dropped: Vec<i64> = self.previously_owned.difference(&self.kept).copied().collect();
        if !dropped.is_empty() {
            let ids = serde_json::Value::from(dropped.clone()).to_string();
            self.conn.execute(
                "DELETE FROM entities WHERE id IN (SELECT value FROM json_each(?1))",
                params![ids],
            )?;
            debug!("Unit {} dropped {} entities", unit.index_file.display(), dropped.len());
        }
        Ok(())
    }

    fn decl_of(&mut self, decl: &Option<Location>) -> rusqlite::Result<Decl> {
        Ok(match decl {
            Some(loc) => Some((self.files.get(self.conn, &loc.file)?, loc.line, loc.column)),
            None => None,
        })
    }

    fn upsert_entity(&mut self, record: &EntityRecord) -> rusqlite::Result<()> {
        let decl = self.decl_of(&record.decl)?;
        let owned = decl.is_some_and(|(file, _, _)| self.source_files.contains(&file));
        let unit = owned.then_some(self.unit_id);

        let id = match find_entity(self.conn, &record.name, decl)? {
            Some((id, kind)) => {
                if owned || kind.is_empty() {
                    self.conn
                        .prepare_cached(
                            "UPDATE entities
                             SET kind = ?2, is_global = ?3, is_static_local = ?4,
                                 kind_flags = ?5,
                                 unit = COALESCE(?6, unit),
                                 dynamic = CASE WHEN ?6 IS NULL THEN dynamic ELSE 0 END
                             WHERE id = ?1",
                        )?
                        .execute(params![
                            id,
                            record.kind,
                            record.flags.is_global,
                            record.flags.is_static_local,
                            record.flags.kind_bits(),
                            unit
                        ])?;
                }
                id
            }
            None => {
                let (file, line, column) = split_decl(decl);
                self.conn
                    .prepare_cached(
                        "INSERT INTO entities
                         (name, kind, decl_file, decl_line, decl_column, is_global, is_static_local,
                          kind_flags, unit)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    )?
                    .execute(params![
                        record.name,
                        record.kind,
                        file,
                        line,
                        column,
                        record.flags.is_global,
                        record.flags.is_static_local,
                        record.flags.kind_bits(),
                        unit
                    ])?;
                self.conn.last_insert_rowid()
            }
        };

        if owned {
            self.kept.insert(id);
        }
        self.entities.insert(record.key(), id);
        Ok(())
    }

    /// Id for a key, creating an ownerless stub when the entity is unknown
    fn entity_id(&mut self, key: &EntityKey) -> rusqlite::Result<i64> {
        if let Some(id) = self.entities.get(key) {
            return Ok(*id);
        }

        let decl = self.decl_of(&key.decl)?;
        let id = match find_entity(self.conn, &key.name, decl)? {
            Some((id, _)) => id,
            None => {
                let (file, line, column) = split_decl(decl);
                self.conn
                    .prepare_cached(
                        "INSERT INTO entities (name, decl_file, decl_line, decl_column)
                         VALUES (?1, ?2, ?3, ?4)",
                    )?
                    .execute(params![key.name, file, line, column])?;
                self.conn.last_insert_rowid()
            }
        };

        // A stub for an entity this unit declares is still owned by it
        if decl.is_some_and(|(file, _, _)| self.source_files.contains(&file))
            && self.previously_owned.contains(&id)
        {
            self.kept.insert(id);
        }
        self.entities.insert(key.clone(), id);
        Ok(id)
    }

    fn insert_reference(&mut self, r: &crate::domain::ReferenceRecord) -> rusqlite::Result<()> {
        let entity = self.entity_id(&r.entity)?;
        let scope = match &r.scope {
            Some(scope) => Some(self.entity_id(scope)?),
            None => None,
        };
        let file = self.files.get(self.conn, &r.location.file)?;

        self.conn
            .prepare_cached(
                "INSERT INTO entity_refs (entity, file, line, col, kind_id, scope, unit)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?
            .execute(params![
                entity,
                file,
                r.location.line,
                r.location.column,
                r.kind_id.to_string(),
                scope,
                self.unit_id
            ])?;
        Ok(())
    }

    fn insert_dependencies(&mut self, unit: &UnitIndex) -> rusqlite::Result<()> {
        let mut sources: Vec<i64> = self.source_files.iter().copied().collect();
        sources.sort_unstable();

        for dep in &unit.dependencies {
            let to = self.files.get(self.conn, dep)?;
            for &from in &sources {
                if from == to {
                    continue;
                }
                self.conn
                    .prepare_cached(
                        "INSERT INTO f2f (from_file, to_file, kind, unit) VALUES (?1, ?2, ?3, ?4)",
                    )?
                    .execute(params![from, to, FILE_DEPENDENCY_KIND, self.unit_id])?;
            }
        }
        Ok(())
    }
}
