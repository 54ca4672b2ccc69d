//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `FetchOutcome`: the terminal result of one ID (accepted, rejected, failed)
//! - `RejectReason`: why a fetched page was skipped
//! - `RunCounters`: lock-free counters shared by workers and the progress reporter

mod counters;
mod outcome;

// Re-export main types
pub use counters::{CounterSnapshot, RunCounters};
pub use outcome::{FetchOutcome, RejectReason};
