//! Scrape coordinator - main run orchestration logic
//!
//! This module contains the run loop that ties all parts together:
//! - Validating configuration and opening the output store and ledger
//! - Planning candidate IDs from the range and the resume set
//! - Running a fixed-size worker pool over the dispatch queue
//! - Routing each outcome to the sink, the ledger and the counters
//! - Reporting progress and producing the final summary

use crate::config::{validate, Config};
use crate::output::{spawn_progress_reporter, ProgressReport, RunSummary};
use crate::scraper::fetcher::{build_http_client, FetchSettings, HttpFetcher, TitleFetcher};
use crate::scraper::parser::TitleClassifier;
use crate::scraper::scheduler::{plan_candidates, Dispatcher, WorkItem, WorkQueue};
use crate::state::{FetchOutcome, RunCounters};
use crate::storage::{
    load_resume_set, FileLedger, FileSink, ResultSink, ResumeLedger, StorageError,
};
use crate::{ConfigError, ScrapeError};
use chrono::Local;
use futures_util::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Typed run settings derived from a validated [`Config`]
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// First ID (inclusive)
    pub start: u64,

    /// Last ID (inclusive)
    pub end: u64,

    /// Number of concurrent workers
    pub workers: usize,

    /// Pause between dispatches
    pub rate_delay: Duration,

    /// Period of progress lines
    pub progress_interval: Duration,

    /// Whether the resume ledger is read and written
    pub resume: bool,

    /// Settings attached to every work item
    pub fetch: Arc<FetchSettings>,
}

impl RunSettings {
    /// Validates `config` and converts it into run settings
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        validate(config)?;

        Ok(Self {
            start: config.range.start,
            end: config.range.end,
            workers: config.pool.workers,
            rate_delay: crate::config::seconds("rate-delay", config.pool.rate_delay)?,
            progress_interval: crate::config::seconds(
                "progress-interval",
                config.pool.progress_interval,
            )?,
            resume: config.output.resume,
            fetch: Arc::new(FetchSettings::from_config(&config.fetch)?),
        })
    }
}

/// Main scrape coordinator
pub struct Coordinator<F> {
    settings: RunSettings,
    fetcher: Arc<F>,
    sink: Arc<dyn ResultSink>,
    ledger: Option<Arc<dyn ResumeLedger>>,
    candidates: Vec<u64>,
    skipped: u64,
    output_path: PathBuf,
}

impl Coordinator<HttpFetcher> {
    /// Creates a coordinator backed by HTTP and the file stores
    ///
    /// Every fatal condition is detected here, before anything is
    /// dispatched: invalid configuration, an output directory that cannot be
    /// created, an output or ledger file that cannot be opened for
    /// appending, or an HTTP client that cannot be built.
    ///
    /// # Arguments
    ///
    /// * `config` - The scraper configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ScrapeError)` - Start-up failed
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        let settings = RunSettings::from_config(config)?;
        let output_path = config.output.output_path();
        let done_ids_path = config.output.done_ids_path();

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
        }

        // Read the resume set before opening the ledger for appending.
        let resume_set = if settings.resume {
            let resume_set = load_resume_set(&done_ids_path, &output_path);
            tracing::info!(
                "Loaded {} already processed IDs ({:?})",
                resume_set.ids.len(),
                resume_set.source
            );
            Some(resume_set)
        } else {
            None
        };

        let sink = FileSink::open(&output_path)?;
        tracing::debug!("Writing titles to {}", sink.path().display());
        let sink: Arc<dyn ResultSink> = Arc::new(sink);

        let ledger: Option<Arc<dyn ResumeLedger>> = match &resume_set {
            Some(resume_set) => {
                let ledger = FileLedger::open(&done_ids_path)?;
                if resume_set.needs_seeding() {
                    ledger.mark_all(&resume_set.ids)?;
                    tracing::info!(
                        "Copied {} legacy IDs into {}",
                        resume_set.ids.len(),
                        ledger.path().display()
                    );
                }
                Some(Arc::new(ledger))
            }
            None => None,
        };
        let done = resume_set.map(|set| set.ids).unwrap_or_default();

        let fetcher = HttpFetcher::new(
            build_http_client()?,
            TitleClassifier::from_config(&config.classify),
        );

        Ok(Self::with_parts(
            settings,
            fetcher,
            sink,
            ledger,
            &done,
            output_path,
        ))
    }
}

impl<F: TitleFetcher + 'static> Coordinator<F> {
    /// Creates a coordinator from already constructed parts
    ///
    /// `done` is ignored unless `settings.resume` is set.
    pub fn with_parts(
        settings: RunSettings,
        fetcher: F,
        sink: Arc<dyn ResultSink>,
        ledger: Option<Arc<dyn ResumeLedger>>,
        done: &HashSet<u64>,
        output_path: PathBuf,
    ) -> Self {
        let empty = HashSet::new();
        let done = if settings.resume { done } else { &empty };
        let candidates = plan_candidates(settings.start, settings.end, done);
        let range_len = if settings.end < settings.start {
            0
        } else {
            (settings.end - settings.start).saturating_add(1)
        };
        let skipped = range_len.saturating_sub(candidates.len() as u64);

        Self {
            settings,
            fetcher: Arc::new(fetcher),
            sink,
            ledger,
            candidates,
            skipped,
            output_path,
        }
    }

    /// IDs this run will dispatch, in dispatch order
    pub fn candidates(&self) -> &[u64] {
        &self.candidates
    }

    /// IDs of the range skipped because an earlier run finished them
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Runs the scrape to completion
    ///
    /// # Flow
    ///
    /// 1. Spawn the progress reporter
    /// 2. Spawn the dispatcher feeding the bounded work queue
    /// 3. Spawn `workers` workers; each pulls one item at a time, fetches
    ///    it and routes the outcome before pulling the next
    /// 4. Wait until the queue is drained and every worker has exited
    /// 5. Stop the reporter and emit the completion line
    ///
    /// Cancelling `cancel` stops dispatching; everything already dispatched
    /// still reaches a terminal outcome before this returns.
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - All dispatched work finished
    /// * `Err(ScrapeError)` - A background task could not be joined
    pub async fn run(self, cancel: CancellationToken) -> Result<RunSummary, ScrapeError> {
        let started_at = Local::now();
        let total = self.candidates.len() as u64;
        let counters = Arc::new(RunCounters::new(total));

        tracing::info!(
            "Scraping IDs {}..{} | workers={} | resume={} | to_do={}",
            self.settings.start,
            self.settings.end,
            self.settings.workers,
            self.settings.resume,
            total
        );

        let reporter_stop = cancel.child_token();
        let reporter = spawn_progress_reporter(
            Arc::clone(&counters),
            self.settings.progress_interval,
            reporter_stop.clone(),
        );

        let dispatcher = Dispatcher::new(
            self.candidates,
            Arc::clone(&self.settings.fetch),
            self.settings.rate_delay,
            self.settings.workers,
        );
        let (queue, dispatch_handle) = dispatcher.spawn(Arc::clone(&counters), cancel.clone());

        let worker = Worker {
            fetcher: self.fetcher,
            sink: self.sink,
            ledger: self.ledger,
            counters: Arc::clone(&counters),
        };

        let mut workers = JoinSet::new();
        for index in 0..self.settings.workers {
            let worker = worker.clone();
            let queue = queue.clone();
            workers.spawn(async move { worker.run(index, queue).await });
        }
        drop(queue);
        drop(worker);

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        dispatch_handle
            .await
            .map_err(|e| ScrapeError::Task(format!("dispatcher: {}", e)))?;

        reporter_stop.cancel();
        if let Err(e) = reporter.await {
            tracing::warn!("Progress reporter failed: {}", e);
        }

        let elapsed = counters.elapsed();
        let snapshot = counters.snapshot();
        tracing::info!("{}", ProgressReport::new(&snapshot, elapsed));

        Ok(RunSummary {
            started_at,
            elapsed,
            counters: snapshot,
            skipped: self.skipped,
            output_path: self.output_path,
            stopped_early: snapshot.dispatched < total,
        })
    }
}

/// One execution unit of the pool
struct Worker<F> {
    fetcher: Arc<F>,
    sink: Arc<dyn ResultSink>,
    ledger: Option<Arc<dyn ResumeLedger>>,
    counters: Arc<RunCounters>,
}

impl<F> Clone for Worker<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            sink: Arc::clone(&self.sink),
            ledger: self.ledger.clone(),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<F: TitleFetcher + 'static> Worker<F> {
    async fn run(self, index: usize, queue: WorkQueue) {
        let mut handled = 0u64;
        while let Some(item) = queue.next().await {
            self.process(item).await;
            handled += 1;
        }
        tracing::trace!("Worker {} exiting after {} items", index, handled);
    }

    /// Fetches one item; a panic is contained to this item
    async fn process(&self, item: WorkItem) {
        let outcome = match AssertUnwindSafe(self.fetcher.fetch(&item))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!("Fetch for ID {} panicked: {}", item.id, message);
                FetchOutcome::failed(format!("worker panicked: {}", message))
            }
        };

        self.route(item.id, outcome);
    }

    /// Routes an outcome
    ///
    /// | Outcome | Sink | Ledger | Counters |
    /// |---------|------|--------|----------|
    /// | Accepted | append | mark done | processed, accepted |
    /// | Rejected | - | mark done | processed, rejected |
    /// | Failed | - | - | processed, failed |
    ///
    /// A title that cannot be saved turns the outcome into `Failed`.
    fn route(&self, id: u64, outcome: FetchOutcome) {
        // Written before the ledger so a crash can only duplicate, never lose.
        let outcome = match outcome {
            FetchOutcome::Accepted { title } => match self.sink.append(&title) {
                Ok(()) => FetchOutcome::Accepted { title },
                Err(e) => {
                    tracing::error!("Failed to save title for ID {}: {}", id, e);
                    FetchOutcome::failed(format!("failed to save title: {}", e))
                }
            },
            other => other,
        };

        match &outcome {
            FetchOutcome::Accepted { .. } => {}
            FetchOutcome::Rejected { reason } => tracing::trace!("ID {} rejected: {}", id, reason),
            FetchOutcome::Failed { error } => tracing::debug!("ID {} failed: {}", id, error),
        }

        if outcome.is_terminal_classification() {
            self.mark_done(id);
        }
        self.counters.record(&outcome);
    }

    fn mark_done(&self, id: u64) {
        if let Some(ledger) = &self.ledger {
            if let Err(e) = ledger.mark_done(id) {
                tracing::warn!("Failed to record ID {} in the ledger: {}", id, e);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
