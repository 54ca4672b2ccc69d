//! Shared run counters
//!
//! Workers bump these with atomic increments; the progress reporter reads
//! them without taking any lock.

use crate::state::{FetchOutcome, RejectReason};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters shared by all workers of one run
#[derive(Debug)]
pub struct RunCounters {
    start_time: Instant,
    total: u64,
    dispatched: AtomicU64,
    processed: AtomicU64,
    accepted: AtomicU64,
    missing_page: AtomicU64,
    inactive_user: AtomicU64,
    no_title: AtomicU64,
    failed: AtomicU64,
}

/// Consistent-enough view of the counters at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub total: u64,
    pub dispatched: u64,
    pub processed: u64,
    pub accepted: u64,
    pub missing_page: u64,
    pub inactive_user: u64,
    pub no_title: u64,
    pub failed: u64,
}

impl CounterSnapshot {
    /// Rejections of any kind
    pub fn rejected(&self) -> u64 {
        self.missing_page + self.inactive_user + self.no_title
    }

    /// IDs not yet given a terminal outcome
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.processed)
    }
}

impl RunCounters {
    /// Creates counters for a run with `total` IDs to do
    pub fn new(total: u64) -> Self {
        Self {
            start_time: Instant::now(),
            total,
            dispatched: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            missing_page: AtomicU64::new(0),
            inactive_user: AtomicU64::new(0),
            no_title: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Release);
    }

    fn record_accepted(&self) {
        // `processed` first so a reader never sees accepted > processed.
        self.processed.fetch_add(1, Ordering::Release);
        self.accepted.fetch_add(1, Ordering::Release);
    }

    fn record_rejected(&self, reason: RejectReason) {
        self.processed.fetch_add(1, Ordering::Release);
        let counter = match reason {
            RejectReason::MissingPage => &self.missing_page,
            RejectReason::InactiveUser => &self.inactive_user,
            RejectReason::NoTitleFound => &self.no_title,
        };
        counter.fetch_add(1, Ordering::Release);
    }

    fn record_failed(&self) {
        self.processed.fetch_add(1, Ordering::Release);
        self.failed.fetch_add(1, Ordering::Release);
    }

    /// Records a routed outcome; exactly one `processed` increment per call
    pub fn record(&self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Accepted { .. } => self.record_accepted(),
            FetchOutcome::Rejected { reason } => self.record_rejected(*reason),
            FetchOutcome::Failed { .. } => self.record_failed(),
        }
    }

    /// Takes a snapshot of all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        // Per-kind counters are loaded before `processed`, which is bumped first.
        let accepted = self.accepted.load(Ordering::Acquire);
        let missing_page = self.missing_page.load(Ordering::Acquire);
        let inactive_user = self.inactive_user.load(Ordering::Acquire);
        let no_title = self.no_title.load(Ordering::Acquire);
        let failed = self.failed.load(Ordering::Acquire);
        let processed = self.processed.load(Ordering::Acquire);
        let dispatched = self.dispatched.load(Ordering::Acquire);

        CounterSnapshot {
            total: self.total,
            dispatched,
            processed,
            accepted,
            missing_page,
            inactive_user,
            no_title,
            failed,
        }
    }
}
