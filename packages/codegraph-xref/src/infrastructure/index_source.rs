//! Index source adapters
//!
//! `MemoryIndexSource` holds already-built `UnitIndex` values (tests and
//! embedders that parse records themselves). `JsonIndexSource` reads one
//! serialized `UnitIndex` per `*.xref.json` file below a directory.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::{IndexSource, UnitIndex, UnitStamp};
use crate::error::{Result, XrefError};

/// Suffix of the files picked up by `JsonIndexSource`
pub const JSON_INDEX_SUFFIX: &str = ".xref.json";

/// In-memory unit records keyed by index file
#[derive(Debug, Clone, Default)]
pub struct MemoryIndexSource {
    units: BTreeMap<PathBuf, std::result::Result<UnitIndex, String>>,
}

impl MemoryIndexSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a unit
    pub fn insert(&mut self, unit: UnitIndex) {
        self.units.insert(unit.index_file.clone(), Ok(unit));
    }

    /// Register a unit whose record cannot be parsed
    pub fn insert_unreadable(&mut self, index_file: impl Into<PathBuf>, reason: impl Into<String>) {
        self.units.insert(index_file.into(), Err(reason.into()));
    }

    pub fn remove(&mut self, index_file: impl AsRef<Path>) {
        self.units.remove(index_file.as_ref());
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl FromIterator<UnitIndex> for MemoryIndexSource {
    fn from_iter<I: IntoIterator<Item = UnitIndex>>(iter: I) -> Self {
        let mut source = Self::new();
        for unit in iter {
            source.insert(unit);
        }
        source
    }
}

impl IndexSource for MemoryIndexSource {
    fn units(&self) -> Result<Vec<UnitStamp>> {
        Ok(self
            .units
            .iter()
            .map(|(index_file, unit)| match unit {
                Ok(unit) => unit.unit_stamp(),
                Err(_) => UnitStamp {
                    index_file: index_file.clone(),
                    stamp: i64::MAX,
                    checksum: None,
                },
            })
            .collect())
    }

    fn load(&self, unit: &UnitStamp) -> Result<UnitIndex> {
        match self.units.get(&unit.index_file) {
            Some(Ok(index)) => Ok(index.clone()),
            Some(Err(reason)) => Err(XrefError::source_defect(
                unit.index_file.display(),
                reason.clone(),
            )),
            None => Err(XrefError::source_defect(
                unit.index_file.display(),
                "unit no longer available",
            )),
        }
    }
}

/// Directory of serialized unit records
#[derive(Debug, Clone)]
pub struct JsonIndexSource {
    root: PathBuf,
}

impl JsonIndexSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn stamp_of(path: &Path) -> std::io::Result<UnitStamp> {
        let content = std::fs::read(path)?;
        let mtime = std::fs::metadata(path)?
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Ok(UnitStamp {
            index_file: path.to_path_buf(),
            stamp: mtime,
            checksum: Some(format!("{:x}", Sha256::digest(&content))),
        })
    }

    /// Descriptor for an index file that cannot be read. It never looks up
    /// to date, so `load` runs and reports the defect for this unit alone.
    fn unreadable(path: &Path) -> UnitStamp {
        UnitStamp {
            index_file: path.to_path_buf(),
            stamp: i64::MAX,
            checksum: None,
        }
    }

    fn is_index_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(JSON_INDEX_SUFFIX))
    }
}

impl IndexSource for JsonIndexSource {
    fn units(&self) -> Result<Vec<UnitStamp>> {
        if !self.root.is_dir() {
            return Err(XrefError::io(format!(
                "index directory {} not found",
                self.root.display()
            )));
        }

        let mut stamps = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    match err.path() {
                        Some(path) if Self::is_index_file(path) => stamps.push(Self::unreadable(path)),
                        _ => warn!("Skipping unreadable entry below {}: {}", self.root.display(), err),
                    }
                    continue;
                }
            };
            if !entry.file_type().is_file() || !Self::is_index_file(entry.path()) {
                continue;
            }
            match Self::stamp_of(entry.path()) {
                Ok(stamp) => stamps.push(stamp),
                Err(err) => {
                    debug!("Cannot stamp {}: {}", entry.path().display(), err);
                    stamps.push(Self::unreadable(entry.path()));
                }
            }
        }

        Ok(stamps)
    }

    fn load(&self, unit: &UnitStamp) -> Result<UnitIndex> {
        let content = std::fs::read_to_string(&unit.index_file)
            .map_err(|e| XrefError::source_defect(unit.index_file.display(), e.to_string()))?;
        let mut index: UnitIndex = serde_json::from_str(&content)
            .map_err(|e| XrefError::source_defect(unit.index_file.display(), e.to_string()))?;

        // The descriptor is authoritative for identity and freshness.
        index.index_file = unit.index_file.clone();
        index.stamp = unit.stamp;
        index.checksum = unit.checksum.clone();
        Ok(index)
    }
}
