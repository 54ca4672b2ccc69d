//! Output store for accepted titles

use crate::storage::append::AppendFile;
use crate::storage::{ResultSink, StorageResult};
use std::path::Path;

/// File-backed result sink, one title per line
#[derive(Debug)]
pub struct FileSink {
    log: AppendFile,
}

impl FileSink {
    /// Opens (or creates) the output file for appending
    ///
    /// Fails when the file cannot be opened for writing; callers treat this
    /// as a fatal start-up error.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Ok(Self {
            log: AppendFile::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.log.path()
    }
}

impl ResultSink for FileSink {
    fn append(&self, title: &str) -> StorageResult<()> {
        // Collapse whitespace again so a title can never span two lines.
        let line = title.split_whitespace().collect::<Vec<_>>().join(" ");
        self.log.append_line(&line)
    }
}
