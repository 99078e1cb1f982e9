// shufflecheck-core/src/trial.rs
//! One trial: fetch a transcript, parse it, tabulate it, score it.

use std::sync::Arc;

use log::debug;
use serde::Serialize;

use shufflecheck_stats::{evaluate, expectation_for, tabulate, FrequencyTable, PermutationSpace, TrialResult};

use crate::config::HarnessConfig;
use crate::driver::{isolate_transcript, CommandScript, TranscriptSource};
use crate::errors::HarnessError;
use crate::parser::SampleParser;

/// Everything a trial needs that does not change between trials.
#[derive(Debug, Clone)]
pub struct TrialPlan {
    pub space: Arc<PermutationSpace>,
    pub parser: SampleParser,
    pub script: CommandScript,
    pub start_marker: String,
    pub end_marker: String,
}

impl TrialPlan {
    /// Builds the shared permutation space and parser from a validated config.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, HarnessError> {
        let space = PermutationSpace::enumerate(&config.symbols)?;
        let start_marker = config
            .start_marker()
            .map_err(|e| HarnessError::Config(format!("{:#}", e)))?;

        Ok(Self {
            space: Arc::new(space),
            parser: SampleParser::from_config(config)?,
            script: CommandScript::from_config(config),
            start_marker,
            end_marker: config.transcript.end_marker.clone(),
        })
    }
}

/// Full diagnostics for one successful trial.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub index: usize,
    pub requested: usize,
    pub observed: usize,
    pub expectation: f64,
    pub table: FrequencyTable,
    pub result: TrialResult,
}

/// Compact per-trial record kept in the aggregate report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    pub index: usize,
    pub observed: usize,
    pub chi_squared: Option<f64>,
    pub p_value: Option<f64>,
    pub error: Option<String>,
}

impl TrialSummary {
    pub fn succeeded(outcome: &TrialOutcome) -> Self {
        Self {
            index: outcome.index,
            observed: outcome.observed,
            chi_squared: Some(outcome.result.chi_squared),
            p_value: Some(outcome.result.p_value),
            error: None,
        }
    }

    pub fn failed(index: usize, error: &HarnessError) -> Self {
        Self {
            index,
            observed: 0,
            chi_squared: None,
            p_value: None,
            error: Some(error.to_string()),
        }
    }
}

/// Scores an already captured stdout against `plan`.
pub fn score_transcript(
    plan: &TrialPlan,
    stdout: &str,
    index: usize,
) -> Result<TrialOutcome, HarnessError> {
    let region = isolate_transcript(stdout, &plan.start_marker, &plan.end_marker)?;
    let batch = plan.parser.parse_batch(region, plan.script.shuffle_count);
    let table = tabulate(&plan.space, &batch)?;
    let expectation = expectation_for(batch.len(), plan.space.len());
    let result = evaluate(&table, expectation)?;

    debug!(
        "Trial {}: {} samples, expectation {:.3}, chi2 {:.4}, p {:.6}",
        index,
        batch.len(),
        expectation,
        result.chi_squared,
        result.p_value
    );

    Ok(TrialOutcome {
        index,
        requested: plan.script.shuffle_count,
        observed: batch.len(),
        expectation,
        table,
        result,
    })
}

/// Runs one full Driver -> Parser -> Tabulator -> Evaluator pipeline.
pub async fn run_trial(
    source: &dyn TranscriptSource,
    plan: &TrialPlan,
    index: usize,
) -> Result<TrialOutcome, HarnessError> {
    let stdout = source.fetch(&plan.script).await?;
    score_transcript(plan, &stdout, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shufflecheck_stats::Permutation;

    fn plan() -> TrialPlan {
        let mut config = HarnessConfig::load_default().unwrap();
        config.shuffles_per_trial = 48;
        TrialPlan::from_config(&config).unwrap()
    }

    fn transcript(plan: &TrialPlan, lines: &[String]) -> String {
        let mut out = String::from("cmd> new\nl = []\nl = [1 2 3 4]\ncmd> shuffle 48\n");
        for line in lines {
            out.push_str(&format!("l = [{}]\n", line));
        }
        out.push_str(&format!("cmd> free\n{}\ncmd> quit\n", plan.end_marker));
        out
    }

    #[test]
    fn test_uniform_transcript_scores_p_one() {
        let plan = plan();
        let lines: Vec<String> = plan.space.iter().chain(plan.space.iter()).map(Permutation::key).collect();
        let outcome = score_transcript(&plan, &transcript(&plan, &lines), 0).unwrap();

        assert_eq!(outcome.observed, 48);
        assert!((outcome.expectation - 2.0).abs() < 1e-12);
        assert_eq!(outcome.table.total(), 48);
        assert!((outcome.result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_batch_uses_observed_length_for_expectation() {
        let plan = plan();
        let lines: Vec<String> = plan.space.iter().map(Permutation::key).collect();
        let outcome = score_transcript(&plan, &transcript(&plan, &lines), 1).unwrap();

        assert_eq!(outcome.requested, 48);
        assert_eq!(outcome.observed, 24);
        assert!((outcome.expectation - 1.0).abs() < 1e-12);
        assert!(outcome.result.chi_squared.abs() < 1e-12);
        assert!((outcome.result.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_sample_is_data_integrity_failure() {
        let plan = plan();
        let lines = vec!["1 2 3 4".to_string(), "4 4 4 4".to_string()];
        let err = score_transcript(&plan, &transcript(&plan, &lines), 0).unwrap_err();
        assert!(matches!(err, HarnessError::DataIntegrity(_)), "{:?}", err);
    }

    #[test]
    fn test_empty_region_fails_expectation_check() {
        let plan = plan();
        let err = score_transcript(&plan, &transcript(&plan, &[]), 0).unwrap_err();
        assert!(matches!(err, HarnessError::Statistics(_)), "{:?}", err);
    }

    #[test]
    fn test_truncated_transcript_is_structural_failure() {
        let plan = plan();
        let stdout = "l = [1 2 3 4]\nl = [2 1 3 4]\n";
        let err = score_transcript(&plan, stdout, 3).unwrap_err();
        assert!(matches!(err, HarnessError::MissingMarker { which: "end", .. }));

        let summary = TrialSummary::failed(3, &err);
        assert_eq!(summary.index, 3);
        assert!(summary.p_value.is_none());
        assert!(summary.error.unwrap().contains("l = NULL"));
    }
}
