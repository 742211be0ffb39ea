//! Database schema
//!
//! Reference kinds are rows, not code: `reference_kinds` carries the
//! attributes the query layer interprets, so a new front end only adds rows.
//! Declaration attributes live on each entity (`kind_flags` bitmask).
//! Entity ids are `INTEGER PRIMARY KEY` rowids and may be reused after the
//! entity they named is deleted.

use rusqlite::{params, Connection};

pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS units (
    id INTEGER PRIMARY KEY,
    index_file TEXT NOT NULL UNIQUE,
    stamp INTEGER NOT NULL,
    checksum TEXT,
    from_baseline INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY,
    path TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS reference_kinds (
    id TEXT PRIMARY KEY,
    display TEXT NOT NULL,
    is_real INTEGER NOT NULL DEFAULT 0,
    is_read INTEGER NOT NULL DEFAULT 0,
    is_write INTEGER NOT NULL DEFAULT 0,
    is_end INTEGER NOT NULL DEFAULT 0,
    is_implicit INTEGER NOT NULL DEFAULT 0,
    is_dispatching INTEGER NOT NULL DEFAULT 0,
    show_in_callgraph INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS entities (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT '',
    decl_file INTEGER REFERENCES files(id),
    decl_line INTEGER NOT NULL DEFAULT -1,
    decl_column INTEGER NOT NULL DEFAULT -1,
    is_global INTEGER NOT NULL DEFAULT 0,
    is_static_local INTEGER NOT NULL DEFAULT 0,
    kind_flags INTEGER NOT NULL DEFAULT 0,
    unit INTEGER REFERENCES units(id) ON DELETE CASCADE,
    dynamic INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS entity_refs (
    entity INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
    file INTEGER NOT NULL REFERENCES files(id),
    line INTEGER NOT NULL,
    col INTEGER NOT NULL,
    kind_id TEXT NOT NULL,
    scope INTEGER REFERENCES entities(id) ON DELETE SET NULL,
    unit INTEGER REFERENCES units(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS e2e (
    from_entity INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
    to_entity INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    order_by INTEGER NOT NULL DEFAULT 0,
    parameter_kind TEXT,
    unit INTEGER REFERENCES units(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS f2f (
    from_file INTEGER NOT NULL REFERENCES files(id),
    to_file INTEGER NOT NULL REFERENCES files(id),
    kind TEXT NOT NULL,
    unit INTEGER REFERENCES units(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_entities_name ON entities(name);
CREATE INDEX IF NOT EXISTS idx_entities_decl ON entities(decl_file, decl_line, decl_column);
CREATE INDEX IF NOT EXISTS idx_entities_unit ON entities(unit);
CREATE INDEX IF NOT EXISTS idx_refs_entity ON entity_refs(entity);
CREATE INDEX IF NOT EXISTS idx_refs_file ON entity_refs(file, line);
CREATE INDEX IF NOT EXISTS idx_refs_scope ON entity_refs(scope);
CREATE INDEX IF NOT EXISTS idx_refs_unit ON entity_refs(unit);
CREATE INDEX IF NOT EXISTS idx_e2e_from ON e2e(from_entity, kind);
CREATE INDEX IF NOT EXISTS idx_e2e_to ON e2e(to_entity, kind);
CREATE INDEX IF NOT EXISTS idx_e2e_unit ON e2e(unit);
CREATE INDEX IF NOT EXISTS idx_f2f_from ON f2f(from_file, kind);
CREATE INDEX IF NOT EXISTS idx_f2f_to ON f2f(to_file, kind);
CREATE INDEX IF NOT EXISTS idx_f2f_unit ON f2f(unit);
"#;

/// (id, display, real, read, write, end, implicit, dispatching, callgraph)
type KindRow = (char, &'static str, bool, bool, bool, bool, bool, bool, bool);

/// Standard reference kinds emitted by the compiler's cross-reference output
const REFERENCE_KINDS: &[KindRow] = &[
    ('D', "declaration", true, false, false, false, false, false, false),
    ('b', "body", true, false, false, false, false, false, false),
    ('c', "full declaration", true, false, false, false, false, false, false),
    ('e', "end of spec", true, false, false, true, false, false, false),
    ('t', "end of body", true, false, false, true, false, false, false),
    ('l', "label on end line", true, false, false, true, false, false, false),
    ('i', "implicit reference", false, true, false, false, true, false, false),
    ('k', "parent unit", true, false, false, false, false, false, false),
    ('m', "write reference", true, false, true, false, false, false, false),
    ('r', "reference", true, true, false, false, false, false, false),
    ('s', "static call", true, true, false, false, false, false, true),
    ('R', "dispatching call", true, true, false, false, false, true, true),
    ('w', "with line", true, false, false, false, false, false, false),
    ('x', "type extension", true, false, false, false, false, false, false),
    ('z', "generic formal parameter", true, false, false, false, false, false, false),
    ('p', "primitive operation", true, false, false, false, false, false, false),
    ('P', "overriding primitive operation", true, false, false, false, false, false, false),
    ('o', "own variable reference", true, true, false, false, false, false, false),
    ('>', "in parameter", true, false, false, false, false, false, false),
    ('<', "out parameter", true, false, false, false, false, false, false),
    ('=', "in out parameter", true, false, false, false, false, false, false),
    ('^', "access parameter", true, false, false, false, false, false, false),
];

/// Per-connection settings; must run on every handle, including staging stores
pub fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "on")
}

/// Create tables and seed kind rows (idempotent)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)?;

    {
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO reference_kinds
             (id, display, is_real, is_read, is_write, is_end, is_implicit, is_dispatching, show_in_callgraph)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for (id, display, real, read, write, end, implicit, dispatching, callgraph) in REFERENCE_KINDS {
            stmt.execute(params![
                id.to_string(),
                display,
                real,
                read,
                write,
                end,
                implicit,
                dispatching,
                callgraph
            ])?;
        }
    }

    conn.execute(
        "INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        params![SCHEMA_VERSION.to_string()],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO metadata (key, value) VALUES ('generation', '0')",
        [],
    )?;

    Ok(())
}

/// Bump the database version counter after a write
pub fn bump_generation(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE metadata SET value = CAST(CAST(value AS INTEGER) + 1 AS TEXT)
         WHERE key = 'generation'",
        [],
    )?;
    Ok(())
}

pub fn generation(conn: &Connection) -> rusqlite::Result<u64> {
    let value: i64 = conn.query_row(
        "SELECT CAST(value AS INTEGER) FROM metadata WHERE key = 'generation'",
        [],
        |row| row.get(0),
    )?;
    Ok(value.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        configure(&conn).unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_schema_creates_tables() {
        let conn = open();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for table in [
            "e2e",
            "entities",
            "entity_refs",
            "f2f",
            "files",
            "metadata",
            "reference_kinds",
            "units",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {}", table);
        }
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = open();
        init_schema(&conn).unwrap();

        let kinds: i64 = conn
            .query_row("SELECT COUNT(*) FROM reference_kinds", [], |row| row.get(0))
            .unwrap();
        assert_eq!(kinds as usize, REFERENCE_KINDS.len());
        assert_eq!(generation(&conn).unwrap(), 0);
    }

    #[test]
    fn test_generation_counter() {
        let conn = open();
        bump_generation(&conn).unwrap();
        bump_generation(&conn).unwrap();
        assert_eq!(generation(&conn).unwrap(), 2);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open();
        let fk: i32 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
