//! Resume ledger backed by a `done_ids` file
//!
//! The ledger is an append-only log of IDs, one per line. At start-up it is
//! read once into an in-memory set; during the run finished IDs are appended.

use crate::storage::append::AppendFile;
use crate::storage::{ResumeLedger, StorageResult};
use std::collections::HashSet;
use std::path::Path;

/// File-backed resume ledger
#[derive(Debug)]
pub struct FileLedger {
    log: AppendFile,
}

impl FileLedger {
    /// Opens (or creates) the ledger file for appending
    pub fn open(path: &Path) -> StorageResult<Self> {
        Ok(Self {
            log: AppendFile::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.log.path()
    }

    /// Appends every ID of `ids` in ascending order with a single write
    pub fn mark_all(&self, ids: &HashSet<u64>) -> StorageResult<()> {
        let mut sorted: Vec<u64> = ids.iter().copied().collect();
        sorted.sort_unstable();
        let lines: Vec<String> = sorted.iter().map(u64::to_string).collect();
        self.log.append_lines(&lines)
    }
}

impl ResumeLedger for FileLedger {
    fn mark_done(&self, id: u64) -> StorageResult<()> {
        self.log.append_line(&id.to_string())
    }
}

/// Where a resume set was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeSource {
    /// The dedicated `done_ids` file
    Ledger,

    /// `ID<TAB>title` lines of the output store
    LegacyOutput,

    /// Nothing readable was found
    Empty,
}

/// IDs finished by earlier runs, with their origin
#[derive(Debug, Clone)]
pub struct ResumeSet {
    pub ids: HashSet<u64>,
    pub source: ResumeSource,
}

impl ResumeSet {
    /// Whether the IDs still have to be copied into the ledger file
    ///
    /// The legacy scan only runs while the ledger cannot be read, so IDs
    /// recovered from it are lost to later runs unless carried over.
    pub fn needs_seeding(&self) -> bool {
        self.source == ResumeSource::LegacyOutput && !self.ids.is_empty()
    }
}

/// Loads the set of IDs finished by earlier runs
///
/// See [`load_resume_set`] for the sources consulted.
pub fn load_done_ids(done_ids_path: &Path, legacy_output_path: &Path) -> HashSet<u64> {
    load_resume_set(done_ids_path, legacy_output_path).ids
}

/// Loads the resume set and records which source it came from
///
/// # Sources
///
/// 1. The dedicated `done_ids` file, one ID per line. Lines that do not parse
///    are skipped.
/// 2. If that file does not exist (or cannot be read), the output store is
///    scanned for legacy `ID<TAB>title` lines. Lines without a leading ID are
///    skipped.
///
/// Read failures never abort the run: an unreadable source yields whatever
/// the fallback produces, down to an empty set.
///
/// # Arguments
///
/// * `done_ids_path` - Path of the dedicated ledger file
/// * `legacy_output_path` - Path of the output store to scan as a fallback
pub fn load_resume_set(done_ids_path: &Path, legacy_output_path: &Path) -> ResumeSet {
    if done_ids_path.exists() {
        match std::fs::read(done_ids_path) {
            Ok(bytes) => {
                let done = parse_done_ids(&String::from_utf8_lossy(&bytes));
                tracing::debug!(
                    "Loaded {} done IDs from {}",
                    done.len(),
                    done_ids_path.display()
                );
                return ResumeSet {
                    ids: done,
                    source: ResumeSource::Ledger,
                };
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read {}: {}; falling back to {}",
                    done_ids_path.display(),
                    e,
                    legacy_output_path.display()
                );
            }
        }
    }

    if legacy_output_path.exists() {
        match std::fs::read(legacy_output_path) {
            Ok(bytes) => {
                let done = parse_legacy_ids(&String::from_utf8_lossy(&bytes));
                tracing::debug!(
                    "Recovered {} done IDs from legacy output {}",
                    done.len(),
                    legacy_output_path.display()
                );
                return ResumeSet {
                    ids: done,
                    source: ResumeSource::LegacyOutput,
                };
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read legacy output {}: {}",
                    legacy_output_path.display(),
                    e
                );
            }
        }
    }

    ResumeSet {
        ids: HashSet::new(),
        source: ResumeSource::Empty,
    }
}

/// Parses a `done_ids` file body
fn parse_done_ids(content: &str) -> HashSet<u64> {
    content
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect()
}

/// Parses the leading `ID<TAB>` column of legacy output lines
fn parse_legacy_ids(content: &str) -> HashSet<u64> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| line.split('\t').next())
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}
