//! Error types for codegraph-xref
//!
//! Absence is not an error here: lookups return null references, null
//! entities or empty cursors. `XrefError` is reserved for failures of the
//! store itself (SQLite, I/O during copy) and for defects in a single
//! unit's index record, which ingestion reports and skips.

use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// Xref error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Database errors (SQLite)
    Database,
    /// Serialization/deserialization errors
    Serialization,
    /// I/O errors (copy, backup, reading index records)
    IO,
    /// Configuration errors
    Config,
    /// Malformed or unreadable per-unit index record
    SourceDefect,
    /// Broken internal invariant
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Database => "database",
            ErrorKind::Serialization => "serialization",
            ErrorKind::IO => "io",
            ErrorKind::Config => "config",
            ErrorKind::SourceDefect => "source_defect",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Xref error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct XrefError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl XrefError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IO, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn source_defect(index_file: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::SourceDefect,
            format!("{}: {}", index_file, message.into()),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Storage-level failures abort the current operation; everything else
    /// is recoverable at unit granularity.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::Database | ErrorKind::IO)
    }
}

impl From<rusqlite::Error> for XrefError {
    fn from(err: rusqlite::Error) -> Self {
        XrefError::database(format!("SQLite error: {}", err)).with_source(err)
    }
}

impl From<serde_json::Error> for XrefError {
    fn from(err: serde_json::Error) -> Self {
        XrefError::serialization(format!("JSON error: {}", err)).with_source(err)
    }
}

impl From<std::io::Error> for XrefError {
    fn from(err: std::io::Error) -> Self {
        XrefError::io(format!("I/O error: {}", err)).with_source(err)
    }
}

impl From<ConfigError> for XrefError {
    fn from(err: ConfigError) -> Self {
        XrefError::config(err.to_string()).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, XrefError>;
