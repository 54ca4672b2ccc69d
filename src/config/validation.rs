use crate::config::types::{ClassifyConfig, Config, FetchConfig, OutputConfig, PoolConfig, RangeConfig};
use crate::ConfigError;
use std::time::Duration;
use url::Url;

/// Upper bound on the worker pool size
const MAX_WORKERS: usize = 1024;

/// Upper bound on retries; keeps `2^attempt` backoff factors small
const MAX_RETRIES: u32 = 16;

/// Upper bound on IDs per run; candidates are planned up front in memory
const MAX_RANGE_IDS: u64 = 10_000_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_range(&config.range)?;
    validate_fetch_config(&config.fetch)?;
    validate_pool_config(&config.pool)?;
    validate_output_config(&config.output)?;
    validate_classify_config(&config.classify)?;
    Ok(())
}

/// Converts a seconds value from the configuration into a `Duration`
///
/// Rejects negative, non-finite and overflowing values.
///
/// # Arguments
///
/// * `field` - Name of the setting, used in the error message
/// * `value` - Number of seconds
pub fn seconds(field: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ConfigError::Validation(format!(
            "{} must be a finite, non-negative number of seconds, got {}",
            field, value
        ))
    })
}

/// Like [`seconds`] but also rejects zero
fn positive_seconds(field: &str, value: f64) -> Result<Duration, ConfigError> {
    let duration = seconds(field, value)?;
    if duration.is_zero() {
        return Err(ConfigError::Validation(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(duration)
}

/// Validates the ID range
fn validate_range(range: &RangeConfig) -> Result<(), ConfigError> {
    if range.start < 1 {
        return Err(ConfigError::Validation(format!(
            "start must be >= 1, got {}",
            range.start
        )));
    }

    if range.start > range.end {
        return Err(ConfigError::Validation(format!(
            "start ({}) must not exceed end ({})",
            range.start, range.end
        )));
    }

    if range.id_count() > MAX_RANGE_IDS {
        return Err(ConfigError::Validation(format!(
            "range {}..{} covers {} IDs; at most {} are allowed per run",
            range.start,
            range.end,
            range.id_count(),
            MAX_RANGE_IDS
        )));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    validate_url_template(&config.url_template)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    positive_seconds("timeout", config.timeout)?;
    seconds("backoff-base", config.backoff_base)?;

    if config.retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "retries must be <= {}, got {}",
            MAX_RETRIES, config.retries
        )));
    }

    Ok(())
}

/// Validates the page URL template
///
/// The template must contain an `{id}` placeholder and expand to an absolute
/// `http` or `https` URL.
fn validate_url_template(template: &str) -> Result<(), ConfigError> {
    if !template.contains("{id}") {
        return Err(ConfigError::InvalidUrl(format!(
            "url-template '{}' must contain an {{id}} placeholder",
            template
        )));
    }

    let sample = template.replace("{id}", "1");
    let url = Url::parse(&sample).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid url-template '{}': {}", template, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "url-template '{}' must use the http or https scheme",
            template
        )));
    }

    Ok(())
}

/// Validates worker pool configuration
fn validate_pool_config(config: &PoolConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    seconds("rate-delay", config.rate_delay)?;
    positive_seconds("progress-interval", config.progress_interval)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.out.trim().is_empty() {
        return Err(ConfigError::Validation("out cannot be empty".to_string()));
    }

    Ok(())
}

/// Validates classification phrases
fn validate_classify_config(config: &ClassifyConfig) -> Result<(), ConfigError> {
    // An empty substring would match every title.
    if config.missing_phrase.trim().is_empty() {
        return Err(ConfigError::Validation(
            "missing-phrase cannot be empty".to_string(),
        ));
    }

    if config.inactive_phrase.trim().is_empty() {
        return Err(ConfigError::Validation(
            "inactive-phrase cannot be empty".to_string(),
        ));
    }

    Ok(())
}
