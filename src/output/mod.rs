//! Output module for progress lines and run summaries
//!
//! This module handles:
//! - Periodic progress lines with throughput and ETA
//! - The final summary printed when a run ends

pub mod progress;
pub mod stats;

pub use progress::{spawn_progress_reporter, ProgressReport};
pub use stats::{print_summary, RunSummary};
