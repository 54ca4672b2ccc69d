//! Storage traits and error types
//!
//! This module defines the trait interface for the two append-only stores
//! a run writes to and their associated error type.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Writer lock poisoned for {0}")]
    Poisoned(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record of IDs that reached a terminal classification
///
/// Implementations must serialize concurrent appends so that no ID is lost
/// or written over another one.
pub trait ResumeLedger: Send + Sync {
    /// Appends one finished ID
    fn mark_done(&self, id: u64) -> StorageResult<()>;
}

/// Append-only store of accepted titles
///
/// Implementations must serialize concurrent appends so that lines never
/// interleave and no accepted title is dropped.
pub trait ResultSink: Send + Sync {
    /// Appends one title as a single line
    fn append(&self, title: &str) -> StorageResult<()>;
}
