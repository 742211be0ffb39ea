//! Ingestion & Staging Pipeline
//!
//! `XrefDatabase::update` brings the database up to date with an
//! `IndexSource`:
//!
//! 1. An empty database is first seeded from a baseline database, if given
//!    and not the same store
//! 2. Units whose stored freshness matches the source are skipped
//! 3. With fewer stale units than `staging_threshold`, units are written
//!    straight into the database, one transaction each. Otherwise the whole
//!    database is copied into a private in-memory store, updated there and
//!    copied back in one pass.
//! 4. Units the source no longer offers are pruned. Units that arrived with
//!    a baseline copy are kept until the source re-ingests them, so a
//!    source covering part of the project does not empty the baseline.
//! 5. The result is copied to a distinct output path, if given
//!
//! A unit that cannot be loaded or written is reported through the error
//! hook and skipped. Storage failures abort the update.

mod writer;

use rusqlite::{params, Connection};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::{Entity, EntityRecord, ErrorReporter, IndexSource, UnitStamp};
use crate::error::Result;
use crate::infrastructure::schema;
use crate::infrastructure::sqlite_store::{copy_store, open_memory_connection, same_store};
use crate::infrastructure::XrefDatabase;

/// Per-call ingestion options
#[derive(Default)]
pub struct IngestOptions<'a> {
    /// Database copied into an empty target before ingesting
    pub baseline: Option<PathBuf>,
    /// Where to write the result, in addition to this database
    pub output: Option<PathBuf>,
    /// Re-ingest every unit, ignoring stored freshness
    pub force: bool,
    /// Called after each offered unit with (units done, units offered)
    pub progress: Option<&'a mut dyn FnMut(usize, usize)>,
}

impl<'a> IngestOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline(mut self, path: impl Into<PathBuf>) -> Self {
        self.baseline = Some(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn progress(mut self, callback: &'a mut dyn FnMut(usize, usize)) -> Self {
        self.progress = Some(callback);
        self
    }
}

impl std::fmt::Debug for IngestOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestOptions")
            .field("baseline", &self.baseline)
            .field("output", &self.output)
            .field("force", &self.force)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// What one `update` call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub offered: usize,
    pub ingested: usize,
    pub skipped: usize,
    pub failed: usize,
    pub pruned: usize,
    /// Updates ran in the in-memory staging store
    pub staged: bool,
    pub baseline_copied: bool,
    pub output_written: bool,
}

type StoredStamps = HashMap<String, (i64, Option<String>)>;

fn stored_stamps(conn: &Connection) -> Result<StoredStamps> {
    let mut stmt = conn.prepare("SELECT index_file, stamp, checksum FROM units")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, (row.get(1)?, row.get(2)?))))?
        .collect::<rusqlite::Result<StoredStamps>>()?;
    Ok(rows)
}

/// Units the local source has written, i.e. candidates for pruning
fn local_units(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT index_file FROM units WHERE from_baseline = 0 ORDER BY index_file")?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(rows)
}

fn unit_key(unit: &UnitStamp) -> String {
    unit.index_file.to_string_lossy().into_owned()
}

/// Checksums decide when both sides have one; otherwise a stamp no newer
/// than the stored one means up to date
fn is_up_to_date(unit: &UnitStamp, stored: Option<&(i64, Option<String>)>) -> bool {
    match stored {
        None => false,
        Some((stamp, checksum)) => match (&unit.checksum, checksum) {
            (Some(offered), Some(stored)) => offered == stored,
            _ => unit.stamp <= *stamp,
        },
    }
}

struct Pass<'s, 'p, 'a> {
    source: &'s dyn IndexSource,
    offered: &'s [UnitStamp],
    stale: &'s HashSet<usize>,
    missing: &'s [String],
    reporter: &'s dyn ErrorReporter,
    progress: &'p mut Option<&'a mut dyn FnMut(usize, usize)>,
}

impl Pass<'_, '_, '_> {
    /// Apply all writes to `conn`; returns whether anything was written
    fn run(&mut self, conn: &Connection, stats: &mut IngestStats) -> Result<bool> {
        let total = self.offered.len();
        let mut wrote = false;

        for (index, unit) in self.offered.iter().enumerate() {
            if self.stale.contains(&index) {
                let outcome = self
                    .source
                    .load(unit)
                    .and_then(|loaded| writer::write_unit(conn, &loaded));
                match outcome {
                    Ok(()) => {
                        stats.ingested += 1;
                        wrote = true;
                    }
                    Err(err) if err.is_storage_failure() => return Err(err),
                    Err(err) => {
                        stats.failed += 1;
                        self.reporter.report(&err.to_string());
                    }
                }
            } else {
                debug!("Unit {} is up to date", unit.index_file.display());
            }

            if let Some(progress) = self.progress.as_mut() {
                progress(index + 1, total);
            }
        }

        for index_file in self.missing {
            let deleted = conn.execute("DELETE FROM units WHERE index_file = ?1", params![index_file])?;
            if deleted > 0 {
                debug!("Pruned unit {}", index_file);
                stats.pruned += deleted;
                wrote = true;
            }
        }

        if wrote {
            let purged = writer::purge_orphans(conn)?;
            if purged > 0 {
                debug!("Purged {} orphan entities", purged);
            }
            schema::bump_generation(conn)?;
        }
        Ok(wrote)
    }
}

impl XrefDatabase {
    /// Bring this database up to date with `source`
    pub fn update(&mut self, source: &dyn IndexSource, mut options: IngestOptions<'_>) -> Result<IngestStats> {
        let mut stats = IngestStats::default();

        if let Some(baseline) = options.baseline.as_deref() {
            stats.baseline_copied = self.seed_from_baseline(baseline)?;
        }

        let offered = source.units()?;
        let stored = stored_stamps(self.conn())?;
        let stale: HashSet<usize> = offered
            .iter()
            .enumerate()
            .filter(|(_, unit)| options.force || !is_up_to_date(unit, stored.get(&unit_key(unit))))
            .map(|(index, _)| index)
            .collect();

        let missing: Vec<String> = if self.config().prune_missing_units {
            let offered_keys: HashSet<String> = offered.iter().map(unit_key).collect();
            local_units(self.conn())?
                .into_iter()
                .filter(|key| !offered_keys.contains(key))
                .collect()
        } else {
            Vec::new()
        };

        stats.offered = offered.len();
        stats.skipped = offered.len() - stale.len();
        stats.staged = stale.len() >= self.config().staging_threshold;
        info!(
            "Updating xref database: {} units offered, {} stale, {} missing{}",
            offered.len(),
            stale.len(),
            missing.len(),
            if stats.staged { " (staged in memory)" } else { "" }
        );

        let pages = self.config().backup_pages_per_step;
        let mut pass = Pass {
            source,
            offered: &offered,
            stale: &stale,
            missing: &missing,
            reporter: self.reporter(),
            progress: &mut options.progress,
        };

        if stats.staged {
            let mut staging = open_memory_connection()?;
            copy_store(self.conn(), &mut staging, pages)?;
            let wrote = pass.run(&staging, &mut stats)?;
            drop(pass);
            if wrote {
                copy_store(&staging, self.conn_mut(), pages)?;
                info!("Flushed staged update ({} units)", stats.ingested);
            }
        } else {
            pass.run(self.conn(), &mut stats)?;
        }

        if let Some(output) = options.output.as_deref() {
            stats.output_written = self.write_output(output)?;
        }

        info!(
            "Update done: {} ingested, {} skipped, {} failed, {} pruned",
            stats.ingested, stats.skipped, stats.failed, stats.pruned
        );
        Ok(stats)
    }

    fn seed_from_baseline(&mut self, baseline: &Path) -> Result<bool> {
        if !self.is_empty()? {
            return Ok(false);
        }
        if self.path().is_some_and(|target| same_store(target, baseline)) {
            debug!("Baseline {} is the target itself", baseline.display());
            return Ok(false);
        }
        if !baseline.is_file() {
            self.report_error(&format!("baseline database {} not found", baseline.display()));
            return Ok(false);
        }

        info!("Copying baseline database {}", baseline.display());
        self.load_from_file(baseline)?;
        let seeded = self.conn().execute("UPDATE units SET from_baseline = 1", [])?;
        debug!("Baseline brought {} units", seeded);
        Ok(true)
    }

    fn write_output(&self, output: &Path) -> Result<bool> {
        if self.path().is_some_and(|target| same_store(target, output)) {
            return Ok(false);
        }

        let writable = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(output);
        if let Err(err) = writable {
            self.report_error(&format!("output {} is not writable: {}", output.display(), err));
            return Ok(false);
        }

        self.save_as(output)?;
        Ok(true)
    }

    /// Record an entity the compiler index does not know yet (editor-only
    /// edits). Returns the existing entity when the key is already present.
    pub fn insert_entity(&mut self, record: &EntityRecord) -> Result<Entity> {
        let id = writer::write_dynamic_entity(self.conn(), record)?;
        schema::bump_generation(self.conn())?;
        Ok(Entity::from_raw(id))
    }
}
