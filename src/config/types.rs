use serde::Deserialize;
use std::path::PathBuf;

/// Default page address; `{id}` is replaced by the decimal ID
pub const DEFAULT_URL_TEMPLATE: &str = "https://www.itnetwork.cz/portfolio/{id}";

/// Browser-like identity sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Title fragment served for removed or moved portfolios
pub const DEFAULT_MISSING_PHRASE: &str =
    "stránka, na kterou se odkazujete, byla pravděpodobně přesunuta";

/// Exact title served for deactivated accounts
pub const DEFAULT_INACTIVE_PHRASE: &str = "neaktivní uživatel";

/// Main configuration structure for SFT-Scraper
///
/// Every section can be omitted from the TOML file; missing values fall back
/// to the same defaults as the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub range: RangeConfig,
    pub fetch: FetchConfig,
    pub pool: PoolConfig,
    pub output: OutputConfig,
    pub classify: ClassifyConfig,
}

/// Inclusive ID range to scrape
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    /// First ID (inclusive)
    pub start: u64,

    /// Last ID (inclusive)
    pub end: u64,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            start: 1,
            end: 145_000,
        }
    }
}

impl RangeConfig {
    /// Number of IDs in the range, zero when the range is inverted
    ///
    /// Saturates at `u64::MAX` for `0..=u64::MAX`.
    pub fn id_count(&self) -> u64 {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start).saturating_add(1)
        }
    }
}

/// Per-request behaviour of the fetcher
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Page address with an `{id}` placeholder
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// User-Agent header value
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Seconds allowed per attempt
    pub timeout: f64,

    /// Additional attempts after the first one
    pub retries: u32,

    /// Multiplier (seconds) of the exponential backoff between attempts
    #[serde(rename = "backoff-base")]
    pub backoff_base: f64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: 10.0,
            retries: 2,
            backoff_base: 0.2,
        }
    }
}

/// Worker pool and reporting cadence
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of concurrent workers
    pub workers: usize,

    /// Seconds to pause between successive dispatches
    #[serde(rename = "rate-delay")]
    pub rate_delay: f64,

    /// Seconds between progress lines
    #[serde(rename = "progress-interval")]
    pub progress_interval: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 64,
            rate_delay: 0.0,
            progress_interval: 5.0,
        }
    }
}

/// Output store and resume ledger locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the output file name is resolved against
    #[serde(rename = "base-dir")]
    pub base_dir: PathBuf,

    /// Output file name, one accepted title per line
    pub out: String,

    /// Skip IDs recorded in the ledger and record new terminal outcomes
    pub resume: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            out: "sft_raw.txt".to_string(),
            resume: false,
        }
    }
}

impl OutputConfig {
    /// Path of the output store
    pub fn output_path(&self) -> PathBuf {
        self.base_dir.join(&self.out)
    }

    /// Path of the resume ledger, derived as `<out>.done_ids`
    pub fn done_ids_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}.done_ids", self.out))
    }
}

/// Title phrases that turn a fetched page into a rejection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Case-insensitive substring marking a missing or moved page
    #[serde(rename = "missing-phrase")]
    pub missing_phrase: String,

    /// Case-insensitive exact title of an inactive account
    #[serde(rename = "inactive-phrase")]
    pub inactive_phrase: String,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            missing_phrase: DEFAULT_MISSING_PHRASE.to_string(),
            inactive_phrase: DEFAULT_INACTIVE_PHRASE.to_string(),
        }
    }
}
