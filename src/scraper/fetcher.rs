//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building the shared HTTP client with browser-like headers
//! - GET requests for one ID with a per-attempt timeout
//! - Decoding bodies (UTF-8 first, single-byte fallback)
//! - Retry with deterministic exponential backoff
//! - Classifying the page into a `FetchOutcome`

use crate::config::{seconds, FetchConfig};
use crate::scraper::parser::TitleClassifier;
use crate::scraper::scheduler::WorkItem;
use crate::state::{FetchOutcome, RejectReason};
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

/// Typed per-request settings derived from [`FetchConfig`]
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Page address with an `{id}` placeholder
    pub url_template: String,

    /// Identity sent as the User-Agent header
    pub user_agent: String,

    /// Time allowed for one attempt
    pub timeout: Duration,

    /// Additional attempts after the first one
    pub retries: u32,

    /// Backoff multiplier
    pub backoff_base: Duration,
}

impl FetchSettings {
    pub fn from_config(config: &FetchConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            url_template: config.url_template.clone(),
            user_agent: config.user_agent.clone(),
            timeout: seconds("timeout", config.timeout)?,
            retries: config.retries,
            backoff_base: seconds("backoff-base", config.backoff_base)?,
        })
    }

    /// Deterministic page URL for `id`
    pub fn url_for(&self, id: u64) -> String {
        self.url_template.replace("{id}", &id.to_string())
    }
}

/// Delay between attempt `attempt` (0-indexed) and the next one
///
/// `backoff_base × 2^attempt`, no jitter.
pub fn backoff_delay(backoff_base: Duration, attempt: u32) -> Duration {
    backoff_base.saturating_mul(1u32 << attempt.min(31))
}

/// Builds the HTTP client shared by all workers
///
/// The User-Agent and timeout come from each [`WorkItem`], so the client
/// only carries the browser-like headers common to every request.
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    Client::builder()
        .default_headers(headers)
        .tcp_keepalive(Duration::from_secs(60))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Decodes a response body
///
/// Valid UTF-8 is used as is; anything else is decoded one byte per
/// character (windows-1252), which cannot fail.
pub fn decode_body(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
            text
        }
    }
}

/// Transient failure of a single attempt
#[derive(Debug, Error)]
enum AttemptError {
    #[error("timeout")]
    Timeout,

    #[error("connection error: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("request error: {0}")]
    Request(String),
}

impl From<reqwest::Error> for AttemptError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Source of one outcome per work item
///
/// The coordinator only depends on this trait, so the worker pool can be
/// driven by something other than live HTTP.
#[async_trait]
pub trait TitleFetcher: Send + Sync {
    /// Fetches and classifies one ID; never fails, failures are outcomes
    async fn fetch(&self, item: &WorkItem) -> FetchOutcome;
}

/// Fetcher backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    classifier: TitleClassifier,
}

impl HttpFetcher {
    pub fn new(client: Client, classifier: TitleClassifier) -> Self {
        Self { client, classifier }
    }

    /// One GET attempt
    ///
    /// # Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx with a title | classified title |
    /// | 2xx without a title | `Rejected{NoTitleFound}` |
    /// | non-2xx with a title | classified title |
    /// | non-2xx without a title | transient `Status` error |
    /// | transport error | transient error |
    async fn attempt(&self, url: &str, settings: &FetchSettings) -> Result<FetchOutcome, AttemptError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, settings.user_agent.as_str())
            .timeout(settings.timeout)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let body = decode_body(&bytes);
        let outcome = self.classifier.classify_markup(&body);

        match outcome {
            Some(outcome) => Ok(outcome),
            None if status.is_success() => Ok(FetchOutcome::rejected(RejectReason::NoTitleFound)),
            None => Err(AttemptError::Status(status.as_u16())),
        }
    }
}

#[async_trait]
impl TitleFetcher for HttpFetcher {
    /// Fetches an ID with retry logic
    ///
    /// # Retry Logic
    ///
    /// Transient errors are retried up to `retries` more times. Between
    /// attempt `k` and `k + 1` the fetcher sleeps `backoff_base × 2^k`.
    /// Once the budget is spent the last error becomes `Failed`.
    async fn fetch(&self, item: &WorkItem) -> FetchOutcome {
        let settings = &item.settings;
        let url = settings.url_for(item.id);
        let mut last_error = None;

        for attempt in 0..=settings.retries {
            match self.attempt(&url, settings).await {
                Ok(outcome) => return outcome,
                Err(e) => {
                    tracing::debug!("Attempt {} for {} failed: {}", attempt + 1, url, e);
                    last_error = Some(e);
                }
            }

            if attempt < settings.retries {
                tokio::time::sleep(backoff_delay(settings.backoff_base, attempt)).await;
            }
        }

        match last_error {
            Some(e) => FetchOutcome::failed(e.to_string()),
            None => FetchOutcome::failed("unknown error"),
        }
    }
}
