// shufflecheck-core/src/lib.rs
//! # shufflecheck Core Library
//!
//! `shufflecheck-core` checks whether an external program shuffles uniformly.
//! It feeds the program a command script, isolates the part of its transcript
//! that lists the shuffled orderings, counts every ordering against the full
//! permutation space and scores the counts with a chi-squared test. Many such
//! trials are then summarised into a p-value histogram.
//!
//! ## Modules
//!
//! * `config`: `HarnessConfig`, `HarnessOverrides` and YAML loading/merging.
//! * `driver`: `CommandScript`, the `TranscriptSource` trait and `ProcessDriver`.
//! * `parser`: `SampleParser`, which turns transcript lines into permutations.
//! * `trial`: the single-trial pipeline and its diagnostics.
//! * `aggregator`: multi-trial runs, p-value bands and the `AggregateReport`.
//! * `sink`: the `HistogramSink` trait the report is handed to.
//! * `errors`: `HarnessError`.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use shufflecheck_core::{Aggregator, HarnessConfig, ProcessDriver, TrialPlan};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = HarnessConfig::load_default()?;
//! config.validate()?;
//!
//! let plan = TrialPlan::from_config(&config)?;
//! let driver = ProcessDriver::from_config(&config);
//! let aggregator = Aggregator::new(plan, config.trials, config.failure_policy);
//!
//! let report = aggregator.run(&driver, |_, _| {}).await?;
//! println!("mean p-value: {:?}", report.mean_p_value);
//! # Ok(())
//! # }
//! ```
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod aggregator;
pub mod config;
pub mod driver;
pub mod errors;
pub mod parser;
pub mod sink;
pub mod trial;

/// Re-exports the configuration types.
pub use config::{
    merge_config, FailurePolicy, HarnessConfig, HarnessOverrides, ProgramConfig,
    ScriptConfig, TranscriptConfig,
};

pub use errors::HarnessError;

pub use driver::{isolate_transcript, CommandScript, ProcessDriver, TranscriptSource};
pub use parser::SampleParser;
pub use trial::{run_trial, score_transcript, TrialOutcome, TrialPlan, TrialSummary};

/// Re-exports the aggregation and reporting types.
pub use aggregator::{AggregateReport, Aggregator, BandCount, PValueBand};
pub use sink::{HistogramSink, RecordingSink};

/// Re-exports the statistics layer so callers need a single dependency.
pub use shufflecheck_stats::{
    FrequencyTable, Permutation, PermutationSpace, StatsError, TrialResult,
};
