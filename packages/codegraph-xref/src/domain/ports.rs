//! Ports at the edges of the core: where index records come from and where
//! recoverable failures go.

use super::records::{UnitIndex, UnitStamp};
use crate::error::Result;

/// Supplier of per-unit index records (the compiler output parser)
pub trait IndexSource {
    /// Units currently available, with freshness only. Must not parse records.
    fn units(&self) -> Result<Vec<UnitStamp>>;

    /// Parse one unit's record. Errors are reported and the unit is skipped.
    fn load(&self, unit: &UnitStamp) -> Result<UnitIndex>;
}

/// Single override point for recoverable failures (bad unit, malformed
/// record, I/O failure during copy)
pub trait ErrorReporter {
    fn report(&self, message: &str);
}

/// Default reporter: a `tracing` warning
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, message: &str) {
        tracing::warn!("xref: {}", message);
    }
}

impl<F> ErrorReporter for F
where
    F: Fn(&str),
{
    fn report(&self, message: &str) {
        self(message)
    }
}
