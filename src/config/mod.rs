//! Configuration module for SFT-Scraper
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Command-line flags are applied on top of the loaded
//! values by the binary before [`validate`] runs.
//!
//! # Example
//!
//! ```no_run
//! use sft_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Scraping up to ID {}", config.range.end);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClassifyConfig, Config, FetchConfig, OutputConfig, PoolConfig, RangeConfig,
    DEFAULT_INACTIVE_PHRASE, DEFAULT_MISSING_PHRASE, DEFAULT_URL_TEMPLATE, DEFAULT_USER_AGENT,
};

// Re-export parser and validation functions
pub use parser::{load_config, read_config};
pub use validation::{seconds, validate};
