//! SQLite Xref Store
//!
//! One `XrefDatabase` owns one SQLite connection (file-backed or in-memory).
//! A handle is not meant to be shared between threads: the connection is
//! `!Sync`, so embedding applications use one handle per worker or their own
//! lock. Cursors borrow the handle and cannot outlive it.

use rusqlite::backup::{Backup, StepResult};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::schema;
use crate::config::XrefConfig;
use crate::domain::{ErrorReporter, TracingReporter, XrefStats};
use crate::error::{Result, XrefError};

/// Cross-reference database handle
pub struct XrefDatabase {
    conn: Connection,
    path: Option<PathBuf>,
    config: XrefConfig,
    reporter: Box<dyn ErrorReporter>,
}

impl std::fmt::Debug for XrefDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XrefDatabase")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl XrefDatabase {
    /// Open (or create) a database file with the default configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, XrefConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: XrefConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        schema::configure(&conn)?;
        schema::init_schema(&conn)?;
        info!("Opened xref database {}", path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
            config,
            reporter: Box::new(TracingReporter),
        })
    }

    /// Transient in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::in_memory_with_config(XrefConfig::default())
    }

    pub fn in_memory_with_config(config: XrefConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            conn: open_memory_connection()?,
            path: None,
            config,
            reporter: Box::new(TracingReporter),
        })
    }

    /// File backing this database; None for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn config(&self) -> &XrefConfig {
        &self.config
    }

    /// Replace the recoverable-failure hook
    pub fn set_error_reporter(&mut self, reporter: impl ErrorReporter + 'static) {
        self.reporter = Box::new(reporter);
    }

    pub fn report_error(&self, message: &str) {
        self.reporter.report(message);
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub(crate) fn reporter(&self) -> &dyn ErrorReporter {
        self.reporter.as_ref()
    }

    /// Version counter bumped by every write; pair it with long-lived entity ids
    pub fn generation(&self) -> Result<u64> {
        Ok(schema::generation(&self.conn)?)
    }

    /// True when nothing was ever ingested or inserted
    pub fn is_empty(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM units) + (SELECT COUNT(*) FROM entities)",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 0)
    }

    pub fn stats(&self) -> Result<XrefStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(XrefStats {
            units: count("SELECT COUNT(*) FROM units")?,
            files: count("SELECT COUNT(*) FROM files")?,
            entities: count("SELECT COUNT(*) FROM entities")?,
            references: count("SELECT COUNT(*) FROM entity_refs")?,
            relations: count("SELECT COUNT(*) FROM e2e")?,
        })
    }

    /// Overwrite `dest` with the whole contents of this database
    pub fn copy_to(&self, dest: &mut XrefDatabase) -> Result<()> {
        let pages = self.config.backup_pages_per_step;
        copy_store(&self.conn, &mut dest.conn, pages)
    }

    /// Overwrite this database with the whole contents of `src`
    pub fn copy_from(&mut self, src: &XrefDatabase) -> Result<()> {
        let pages = self.config.backup_pages_per_step;
        copy_store(&src.conn, &mut self.conn, pages)
    }

    /// Write the whole database to a file, replacing its contents
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut dest = Connection::open(path)?;
        copy_store(&self.conn, &mut dest, self.config.backup_pages_per_step)?;
        info!("Saved xref database to {}", path.display());
        Ok(())
    }

    /// Replace this database with the contents of a file, opened read-only
    pub(crate) fn load_from_file(&mut self, path: &Path) -> Result<()> {
        let src = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        copy_store(&src, &mut self.conn, self.config.backup_pages_per_step)?;
        // The baseline may predate the current schema.
        schema::init_schema(&self.conn)?;
        Ok(())
    }

    /// Close explicitly, surfacing errors that `Drop` would swallow
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}

/// New in-memory connection with schema, used for databases and staging stores
pub(crate) fn open_memory_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    schema::configure(&conn)?;
    schema::init_schema(&conn)?;
    Ok(conn)
}

/// Whole-store copy through the SQLite online backup API.
///
/// `pages_per_step` of -1 copies every page in one step. A busy or locked
/// source is a storage failure, never retried.
pub(crate) fn copy_store(from: &Connection, to: &mut Connection, pages_per_step: i32) -> Result<()> {
    let backup = Backup::new(from, to)?;
    let mut steps = 0usize;
    loop {
        steps += 1;
        match backup.step(pages_per_step)? {
            StepResult::Done => break,
            StepResult::More => continue,
            StepResult::Busy => return Err(XrefError::database("store copy failed: database busy")),
            StepResult::Locked => return Err(XrefError::database("store copy failed: database locked")),
            _ => return Err(XrefError::database("store copy failed: unexpected backup state")),
        }
    }
    debug!("Copied store in {} step(s) ({} pages per step)", steps, pages_per_step);
    Ok(())
}

/// Whether two paths name the same physical store
pub(crate) fn same_store(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
