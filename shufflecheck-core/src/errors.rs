//! errors.rs - Error types for the shufflecheck-core library.
//!
//! Each variant maps onto one failure class of a trial: launching the
//! external program, isolating its transcript, matching samples against the
//! permutation space, and the statistical preconditions.
//!
//! License: MIT OR APACHE 2.0

use std::time::Duration;

use shufflecheck_stats::StatsError;
use thiserror::Error;

/// All error types raised by `shufflecheck-core`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HarnessError {
    #[error("Failed to launch '{program}': {source}")]
    ProcessLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("External program did not exit within {0:?}")]
    Timeout(Duration),

    #[error("Transcript is missing the {which} marker '{marker}'")]
    MissingMarker { which: &'static str, marker: String },

    #[error("Data integrity failure: {0}")]
    DataIntegrity(StatsError),

    #[error("Statistical precondition failed: {0}")]
    Statistics(StatsError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Run cancelled before trial {0}")]
    Cancelled(usize),
}

impl HarnessError {
    /// Whether this error must end the whole run regardless of failure policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarnessError::ProcessLaunch { .. } | HarnessError::Config(_))
    }
}

impl From<StatsError> for HarnessError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::UnknownPermutation(_) => HarnessError::DataIntegrity(err),
            StatsError::EmptySymbolSet
            | StatsError::DuplicateSymbol(_)
            | StatsError::TooManySymbols(..) => HarnessError::Config(err.to_string()),
            other => HarnessError::Statistics(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_errors_are_classified() {
        let err: HarnessError = StatsError::UnknownPermutation("1 1 2 3".into()).into();
        assert!(matches!(err, HarnessError::DataIntegrity(_)));
        assert!(!err.is_fatal());

        let err: HarnessError = StatsError::DuplicateSymbol("2".into()).into();
        assert!(matches!(err, HarnessError::Config(_)));
        assert!(err.is_fatal());

        let err: HarnessError = StatsError::InvalidExpectation(0.0).into();
        assert!(matches!(err, HarnessError::Statistics(_)));
    }
}
