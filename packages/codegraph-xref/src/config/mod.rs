//! Xref database configuration
//!
//! Settings are plain data with serde defaults so a partial YAML file only
//! overrides what it names:
//!
//! ```yaml
//! staging_threshold: 250
//! tab_width: 8
//! ```

pub mod error;

pub use error::{ConfigError, ConfigResult};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of stale units at which ingestion stages in memory
pub const DEFAULT_STAGING_THRESHOLD: usize = 100;

/// Default tab stop for visible columns
pub const DEFAULT_TAB_WIDTH: u32 = 8;

/// Runtime settings for an `XrefDatabase`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XrefConfig {
    /// Units needing re-ingestion at or above which the update is staged
    /// in a transient in-memory store (1..=usize::MAX)
    pub staging_threshold: usize,

    /// Pages copied per backup step; -1 copies the whole store in one step
    pub backup_pages_per_step: i32,

    /// Delete units whose index record the source no longer offers
    pub prune_missing_units: bool,

    /// Tab stop used for visible columns (1..=64)
    pub tab_width: u32,
}

impl Default for XrefConfig {
    fn default() -> Self {
        Self {
            staging_threshold: DEFAULT_STAGING_THRESHOLD,
            backup_pages_per_step: -1,
            prune_missing_units: true,
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }
}

impl XrefConfig {
    /// Builder-style override of the staging threshold
    pub fn staging_threshold(mut self, threshold: usize) -> Self {
        self.staging_threshold = threshold;
        self
    }

    /// Builder-style override of unit pruning
    pub fn prune_missing_units(mut self, prune: bool) -> Self {
        self.prune_missing_units = prune;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.staging_threshold == 0 {
            return Err(ConfigError::range_with_hint(
                "staging_threshold",
                self.staging_threshold,
                1,
                usize::MAX,
                "Use 1 to always stage, or a large value to never stage",
            ));
        }

        if self.backup_pages_per_step == 0
            || self.backup_pages_per_step < -1
            || self.backup_pages_per_step > 100_000
        {
            return Err(ConfigError::range_with_hint(
                "backup_pages_per_step",
                self.backup_pages_per_step,
                -1,
                100_000,
                "Use -1 to copy in a single step (0 is not allowed)",
            ));
        }

        if self.tab_width == 0 || self.tab_width > 64 {
            return Err(ConfigError::range_with_hint(
                "tab_width",
                self.tab_width,
                1,
                64,
                "Use 8 for standard tab stops",
            ));
        }

        Ok(())
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
