//! Periodic progress reporting
//!
//! The reporter runs as its own task for the lifetime of a run. It only
//! loads atomics from [`RunCounters`], so workers are never blocked by it.

use crate::state::{CounterSnapshot, RunCounters};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Throughput below this is treated as "no progress yet"
const MIN_THROUGHPUT: f64 = 1e-6;

/// Throughput and ETA computed from one counter snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub processed: u64,
    pub accepted: u64,
    pub total: u64,
    pub elapsed: Duration,
    /// Processed items per second
    pub throughput: f64,
    /// Estimated time to finish; `None` while throughput is ~0
    pub eta: Option<Duration>,
}

impl ProgressReport {
    pub fn new(snapshot: &CounterSnapshot, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let throughput = if secs > 0.0 {
            snapshot.processed as f64 / secs
        } else {
            0.0
        };

        let eta = if throughput > MIN_THROUGHPUT {
            Duration::try_from_secs_f64(snapshot.remaining() as f64 / throughput).ok()
        } else {
            None
        };

        Self {
            processed: snapshot.processed,
            accepted: snapshot.accepted,
            total: snapshot.total,
            elapsed,
            throughput,
            eta,
        }
    }

    pub fn from_counters(counters: &RunCounters) -> Self {
        Self::new(&counters.snapshot(), counters.elapsed())
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Progress: {}/{} processed, {} saved | {:.1} req/s | ETA ",
            self.processed, self.total, self.accepted, self.throughput
        )?;
        match self.eta {
            Some(eta) => write!(f, "~{:.1} min", eta.as_secs_f64() / 60.0),
            None => f.write_str("unknown"),
        }
    }
}

/// Spawns the periodic reporter
///
/// A line is logged every `interval` until `stop` is cancelled. The
/// completion line is emitted by the caller once all work has drained.
pub fn spawn_progress_reporter(
    counters: Arc<RunCounters>,
    interval: Duration,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    tracing::info!("{}", ProgressReport::from_counters(&counters));
                }
            }
        }

        tracing::trace!("Progress reporter stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(total: u64, processed: u64, accepted: u64) -> CounterSnapshot {
        CounterSnapshot {
            total,
            dispatched: processed,
            processed,
            accepted,
            ..CounterSnapshot::default()
        }
    }

    #[test]
    fn test_throughput_and_eta() {
        let report = ProgressReport::new(&snapshot(1000, 100, 40), Duration::from_secs(10));

        assert_eq!(report.throughput, 10.0);
        assert_eq!(report.eta, Some(Duration::from_secs(90)));
        assert_eq!(
            report.to_string(),
            "Progress: 100/1000 processed, 40 saved | 10.0 req/s | ETA ~1.5 min"
        );
    }

    #[test]
    fn test_eta_unknown_without_progress() {
        let report = ProgressReport::new(&snapshot(1000, 0, 0), Duration::from_secs(10));
        assert_eq!(report.throughput, 0.0);
        assert_eq!(report.eta, None);
        assert!(report.to_string().ends_with("ETA unknown"));

        let report = ProgressReport::new(&snapshot(10, 0, 0), Duration::ZERO);
        assert_eq!(report.eta, None);
    }

    #[test]
    fn test_eta_zero_when_done() {
        let report = ProgressReport::new(&snapshot(50, 50, 10), Duration::from_secs(5));
        assert_eq!(report.eta, Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_reporter_stops_on_cancel() {
        let counters = Arc::new(RunCounters::new(10));
        let stop = CancellationToken::new();
        let handle = spawn_progress_reporter(counters, Duration::from_millis(10), stop.clone());

        tokio::time::sleep(Duration::from_millis(35)).await;
        stop.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reporter did not stop")
            .unwrap();
    }
}
