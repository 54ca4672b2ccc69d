//! SFT-Scraper: a resumable bulk title scraper
//!
//! This crate walks a numeric ID range, fetches one page per ID, extracts the
//! page title, classifies it and streams accepted titles into a plain-text
//! output file. Progress is recorded in an append-only ledger so that an
//! interrupted run can be resumed without re-fetching finished IDs.

pub mod config;
pub mod output;
pub mod scraper;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for SFT-Scraper operations
///
/// Only start-up problems are reported through this type. Failures of a
/// single ID are carried as [`state::FetchOutcome`] values instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for SFT-Scraper operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use scraper::{extract_title, Coordinator};
pub use state::{FetchOutcome, RejectReason, RunCounters};
