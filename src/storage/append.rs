//! Mutex-guarded append-only text file
//!
//! Both the ledger and the result sink are plain newline-delimited files.
//! Each append formats the complete line first and hands it to the OS in
//! one write while holding the lock, so concurrent callers can never
//! interleave partial lines.

use crate::storage::{StorageError, StorageResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug)]
pub(crate) struct AppendFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl AppendFile {
    /// Opens `path` for appending, creating it when missing
    pub(crate) fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| StorageError::io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `line` followed by a newline as a single append
    ///
    /// Blocking I/O under a `std::sync::Mutex` is intended here: one short
    /// line per call, so the caller's runtime thread is held only briefly.
    pub(crate) fn append_line(&self, line: &str) -> StorageResult<()> {
        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');
        self.write_record(&record)
    }

    /// Writes every line, each newline-terminated, as a single append
    pub(crate) fn append_lines(&self, lines: &[String]) -> StorageResult<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let mut record = lines.join("\n");
        record.push('\n');
        self.write_record(&record)
    }

    fn write_record(&self, record: &str) -> StorageResult<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| StorageError::Poisoned(self.path.display().to_string()))?;
        file.write_all(record.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| StorageError::io(&self.path, e))
    }
}
