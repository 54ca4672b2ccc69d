//! Outcome definitions for a single scraped ID
//!
//! Every dispatched ID ends in exactly one of these outcomes.

use std::fmt;

/// Why a fetched page was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Title carries the "page moved or missing" phrase
    MissingPage,

    /// Title is the inactive-account placeholder
    InactiveUser,

    /// Page body has no usable `<title>`
    NoTitleFound,
}

impl RejectReason {
    /// Short label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingPage => "missing-page",
            Self::InactiveUser => "inactive-user",
            Self::NoTitleFound => "no-title-found",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of attempting to retrieve and classify one ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page carried a title worth keeping
    Accepted { title: String },

    /// Page was classified and deliberately skipped
    Rejected { reason: RejectReason },

    /// Transport kept failing until the retry budget ran out
    Failed { error: String },
}

impl FetchOutcome {
    /// Returns true if the outcome should be recorded in the resume ledger
    ///
    /// Failed outcomes are left out so the ID is attempted again by the next
    /// resumed run.
    pub fn is_terminal_classification(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self::Rejected { reason }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted { title } => write!(f, "accepted ({})", title),
            Self::Rejected { reason } => write!(f, "rejected ({})", reason),
            Self::Failed { error } => write!(f, "failed ({})", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(FetchOutcome::Accepted {
            title: "Jan".to_string()
        }
        .is_terminal_classification());
        assert!(FetchOutcome::rejected(RejectReason::InactiveUser).is_terminal_classification());
        assert!(!FetchOutcome::failed("timeout").is_terminal_classification());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            FetchOutcome::rejected(RejectReason::MissingPage).to_string(),
            "rejected (missing-page)"
        );
        assert_eq!(
            FetchOutcome::failed("HTTP 503").to_string(),
            "failed (HTTP 503)"
        );
    }
}
