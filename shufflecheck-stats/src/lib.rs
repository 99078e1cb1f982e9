// shufflecheck-stats/src/lib.rs
//! Pure statistics for shuffle uniformity checks: no I/O, no process handling.

pub mod permutation;
pub mod frequency;
pub mod chi_squared;

use thiserror::Error;

pub use chi_squared::{evaluate, expectation_for, TrialResult};
pub use frequency::{tabulate, FrequencyTable};
pub use permutation::{Permutation, PermutationSpace, MAX_SYMBOLS};

/// Errors raised by the statistics layer.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum StatsError {
    #[error("Symbol set is empty")]
    EmptySymbolSet,

    #[error("Symbol '{0}' appears more than once in the symbol set")]
    DuplicateSymbol(String),

    #[error("Symbol set has {0} symbols, at most {1} are supported")]
    TooManySymbols(usize, usize),

    #[error("Sample '{0}' is not a permutation of the configured symbol set")]
    UnknownPermutation(String),

    #[error("Expectation must be positive and finite, got {0}")]
    InvalidExpectation(f64),

    #[error("Permutation space of size {0} leaves no degrees of freedom")]
    DegenerateSpace(usize),

    #[error("Chi-squared distribution error: {0}")]
    Distribution(String),
}
