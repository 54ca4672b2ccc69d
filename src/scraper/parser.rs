//! Title extraction and classification
//!
//! This module handles the only piece of markup inspection the scraper
//! needs: pulling the first `<title>` element out of a page and deciding
//! whether that title is a real name or one of the site's placeholder pages.

use crate::config::ClassifyConfig;
use crate::state::{FetchOutcome, RejectReason};
use regex::Regex;
use std::sync::LazyLock;

static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("hardcoded regex pattern is valid")
});

/// Extracts and normalizes the page title
///
/// # Extraction Rules
///
/// - The first `<title ...>...</title>` element wins, matched
///   case-insensitively; it may carry attributes and span several lines
/// - Whitespace runs collapse to a single space, ends are trimmed
/// - An empty result counts as no title
///
/// # Example
///
/// ```
/// use sft_scraper::scraper::extract_title;
///
/// let title = extract_title("<TITLE>  Jan \n Novák </TITLE>");
/// assert_eq!(title.as_deref(), Some("Jan Novák"));
/// ```
pub fn extract_title(markup: &str) -> Option<String> {
    let raw = TITLE_REGEX.captures(markup)?.get(1)?.as_str();
    let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Sorts extracted titles into accepted names and placeholder pages
#[derive(Debug, Clone)]
pub struct TitleClassifier {
    /// Lowercased "page moved" phrase, matched as a substring
    missing_phrase: String,

    /// Lowercased, trimmed inactive-account title, matched exactly
    inactive_phrase: String,
}

impl TitleClassifier {
    pub fn new(missing_phrase: &str, inactive_phrase: &str) -> Self {
        Self {
            missing_phrase: missing_phrase.to_lowercase(),
            inactive_phrase: inactive_phrase.trim().to_lowercase(),
        }
    }

    pub fn from_config(config: &ClassifyConfig) -> Self {
        Self::new(&config.missing_phrase, &config.inactive_phrase)
    }

    /// Classifies a title
    ///
    /// # Precedence
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | contains the missing phrase (any case) | `Rejected{MissingPage}` |
    /// | equals the inactive phrase (any case, trimmed) | `Rejected{InactiveUser}` |
    /// | otherwise | `Accepted{title}` |
    pub fn classify(&self, title: String) -> FetchOutcome {
        let lowered = title.to_lowercase();

        if lowered.contains(&self.missing_phrase) {
            return FetchOutcome::rejected(RejectReason::MissingPage);
        }

        if lowered.trim() == self.inactive_phrase {
            return FetchOutcome::rejected(RejectReason::InactiveUser);
        }

        FetchOutcome::Accepted { title }
    }

    /// Extracts and classifies in one step
    ///
    /// Returns `None` when the markup has no usable title so the caller can
    /// decide whether that is terminal or transient.
    pub fn classify_markup(&self, markup: &str) -> Option<FetchOutcome> {
        extract_title(markup).map(|title| self.classify(title))
    }
}

impl Default for TitleClassifier {
    fn default() -> Self {
        Self::from_config(&ClassifyConfig::default())
    }
}
