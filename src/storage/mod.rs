//! Storage module for persisting scrape results
//!
//! This module handles the two durable stores of a run:
//! - the output store, one accepted title per line
//! - the resume ledger, one finished ID per line
//!
//! Both are append-only text files whose writers are serialized behind a
//! mutex so concurrent workers can share them.

mod append;
mod ledger;
mod sink;
mod traits;

pub use ledger::{load_done_ids, load_resume_set, FileLedger, ResumeSet, ResumeSource};
pub use sink::FileSink;
pub use traits::{ResultSink, ResumeLedger, StorageError, StorageResult};
