//! Scraper module for fetching and classifying pages
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with retry and exponential backoff
//! - Title extraction and classification
//! - Candidate planning and rate-limited dispatch
//! - The worker pool that ties a run together

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{Coordinator, RunSettings};
pub use fetcher::{
    backoff_delay, build_http_client, decode_body, FetchSettings, HttpFetcher, TitleFetcher,
};
pub use parser::{extract_title, TitleClassifier};
pub use scheduler::{plan_candidates, Dispatcher, WorkItem, WorkQueue};

use crate::config::Config;
use crate::output::RunSummary;
use tokio_util::sync::CancellationToken;

/// Runs a complete scrape
///
/// This is the main entry point for starting a run. It will:
/// 1. Validate the configuration
/// 2. Open the output store (and the ledger when resuming)
/// 3. Load the resume set and plan the candidate IDs
/// 4. Fetch every candidate through the worker pool
/// 5. Return the final summary
///
/// # Arguments
///
/// * `config` - The scraper configuration
/// * `cancel` - Cooperative stop signal; dispatched work still drains
///
/// # Returns
///
/// * `Ok(RunSummary)` - Run completed (or stopped) normally
/// * `Err(ScrapeError)` - Start-up failed
pub async fn scrape(config: &Config, cancel: CancellationToken) -> crate::Result<RunSummary> {
    Coordinator::new(config)?.run(cancel).await
}
