//! Scheduler for planning and dispatching work
//!
//! This module handles:
//! - Computing the candidate IDs (range minus the resume set)
//! - A bounded work queue shared by all workers
//! - Dispatching candidates into the queue with an optional rate delay
//! - Stopping dispatch when a cooperative stop is requested

use crate::scraper::fetcher::FetchSettings;
use crate::state::RunCounters;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One ID paired with the settings to fetch it with
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// ID of the remote resource
    pub id: u64,

    /// Timeout, retry budget, backoff and identity for this run
    pub settings: Arc<FetchSettings>,
}

impl WorkItem {
    pub fn new(id: u64, settings: Arc<FetchSettings>) -> Self {
        Self { id, settings }
    }
}

/// Computes the IDs a run still has to fetch
///
/// # Arguments
///
/// * `start` - First ID (inclusive)
/// * `end` - Last ID (inclusive)
/// * `done` - IDs finished by earlier runs; empty when not resuming
///
/// # Returns
///
/// The IDs of `start..=end` not contained in `done`, in ascending order
pub fn plan_candidates(start: u64, end: u64, done: &HashSet<u64>) -> Vec<u64> {
    (start..=end).filter(|id| !done.contains(id)).collect()
}

/// Receiving half of the work queue, shared by all workers
///
/// Each worker pulls the next item only after finishing the previous one,
/// so at most one fetch per worker is in flight.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    receiver: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
}

impl WorkQueue {
    /// Waits for the next item; `None` once the dispatcher is done and the
    /// queue is drained
    pub async fn next(&self) -> Option<WorkItem> {
        self.receiver.lock().await.recv().await
    }
}

/// Dispatcher feeding candidate IDs into the work queue
pub struct Dispatcher {
    candidates: Vec<u64>,
    settings: Arc<FetchSettings>,
    rate_delay: Duration,
    capacity: usize,
}

impl Dispatcher {
    /// Creates a dispatcher
    ///
    /// # Arguments
    ///
    /// * `candidates` - IDs to dispatch, in order
    /// * `settings` - Fetch settings attached to every work item
    /// * `rate_delay` - Pause after each dispatch, zero for none
    /// * `capacity` - Queue capacity; usually the worker count
    pub fn new(
        candidates: Vec<u64>,
        settings: Arc<FetchSettings>,
        rate_delay: Duration,
        capacity: usize,
    ) -> Self {
        Self {
            candidates,
            settings,
            rate_delay,
            capacity: capacity.max(1),
        }
    }

    /// Spawns the dispatch task and returns the queue workers pull from
    ///
    /// Dispatch stops early when `cancel` fires; items already in the queue
    /// stay there for the workers to drain. Every item handed to the queue
    /// is counted with [`RunCounters::record_dispatched`].
    pub fn spawn(
        self,
        counters: Arc<RunCounters>,
        cancel: CancellationToken,
    ) -> (WorkQueue, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let queue = WorkQueue {
            receiver: Arc::new(Mutex::new(receiver)),
        };

        let handle = tokio::spawn(async move {
            self.dispatch(sender, counters, cancel).await;
        });

        (queue, handle)
    }

    async fn dispatch(
        self,
        sender: mpsc::Sender<WorkItem>,
        counters: Arc<RunCounters>,
        cancel: CancellationToken,
    ) {
        for id in self.candidates {
            if cancel.is_cancelled() {
                break;
            }

            let item = WorkItem::new(id, Arc::clone(&self.settings));
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                result = sender.send(item) => result.is_ok(),
            };
            if !sent {
                break;
            }
            counters.record_dispatched();

            if !self.rate_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.rate_delay) => {}
                }
            }
        }

        if cancel.is_cancelled() {
            tracing::info!(
                "Dispatch stopped after {} items; draining in-flight work",
                counters.snapshot().dispatched
            );
        } else {
            tracing::debug!("All {} items dispatched", counters.snapshot().dispatched);
        }
    }
}
