//! Final run summary
//!
//! Counters are not persisted; their final values are only reported here.

use crate::output::progress::ProgressReport;
use crate::state::CounterSnapshot;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::time::Duration;

/// Summary of a finished (or cooperatively stopped) run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Wall-clock start of the run
    pub started_at: DateTime<Local>,

    /// Time from start until all dispatched work drained
    pub elapsed: Duration,

    /// Final counter values
    pub counters: CounterSnapshot,

    /// IDs skipped because an earlier run finished them
    pub skipped: u64,

    /// Where accepted titles were written
    pub output_path: PathBuf,

    /// Whether a stop was requested before every candidate was dispatched
    pub stopped_early: bool,
}

impl RunSummary {
    pub fn progress(&self) -> ProgressReport {
        ProgressReport::new(&self.counters, self.elapsed)
    }
}

/// Prints the summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &RunSummary) {
    let counters = &summary.counters;

    println!(
        "Done. Wrote names to {}. Took {:.1} minutes. Saved {} names.",
        summary.output_path.display(),
        summary.elapsed.as_secs_f64() / 60.0,
        counters.accepted
    );
    println!();

    println!("Run Statistics:");
    println!("  Started at: {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Skipped (already done): {}", summary.skipped);
    println!("  Dispatched: {}", counters.dispatched);
    println!("  Processed: {} / {}", counters.processed, counters.total);
    println!("  Saved: {}", counters.accepted);
    println!("  Missing page: {}", counters.missing_page);
    println!("  Inactive user: {}", counters.inactive_user);
    println!("  No title: {}", counters.no_title);
    println!("  Failed: {}", counters.failed);
    println!("  Throughput: {:.1} req/s", summary.progress().throughput);

    if summary.stopped_early {
        println!();
        println!(
            "Stopped early: {} IDs were not dispatched and will be picked up by a resumed run.",
            counters.total.saturating_sub(counters.dispatched)
        );
    }
}
