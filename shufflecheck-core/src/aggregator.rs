// shufflecheck-core/src/aggregator.rs
//! Runs many independent trials and summarises their p-values.
//!
//! Trials are strictly sequential. The cancel flag is only consulted between
//! trials, so a cancelled run never leaves a half-scored trial behind.
//!
//! License: MIT OR APACHE 2.0

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;

use crate::config::FailurePolicy;
use crate::driver::TranscriptSource;
use crate::errors::HarnessError;
use crate::sink::HistogramSink;
use crate::trial::{run_trial, TrialOutcome, TrialPlan, TrialSummary};

/// Fixed p-value intervals, highest first. Each is half-open `(lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PValueBand {
    Above90,
    From10To90,
    From5To10,
    From2_5To5,
    From0_1To2_5,
}

impl PValueBand {
    pub const ALL: [PValueBand; 5] = [
        PValueBand::Above90,
        PValueBand::From10To90,
        PValueBand::From5To10,
        PValueBand::From2_5To5,
        PValueBand::From0_1To2_5,
    ];

    /// `(lower, upper]` bounds of the band.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            PValueBand::Above90 => (0.9, 1.0),
            PValueBand::From10To90 => (0.1, 0.9),
            PValueBand::From5To10 => (0.05, 0.1),
            PValueBand::From2_5To5 => (0.025, 0.05),
            PValueBand::From0_1To2_5 => (0.001, 0.025),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PValueBand::Above90 => ">0.9",
            PValueBand::From10To90 => "0.9~0.1",
            PValueBand::From5To10 => "0.1~0.05",
            PValueBand::From2_5To5 => "0.05~0.025",
            PValueBand::From0_1To2_5 => "0.025~0.001",
        }
    }

    /// The band containing `p`, or `None` for p <= 0.001 (and anything outside [0, 1]).
    pub fn classify(p: f64) -> Option<PValueBand> {
        Self::slot_of(p).map(|slot| Self::ALL[slot])
    }

    /// Position in `ALL` of the band containing `p`.
    fn slot_of(p: f64) -> Option<usize> {
        Self::ALL.iter().position(|band| {
            let (lower, upper) = band.bounds();
            p > lower && p <= upper
        })
    }
}

/// One labelled histogram bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandCount {
    pub label: String,
    pub count: usize,
}

/// The persistent result of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub requested_trials: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
    /// Mean over succeeded trials only.
    pub mean_p_value: Option<f64>,
    pub bands: Vec<BandCount>,
    /// Trials with p <= 0.001.
    pub out_of_band: usize,
    pub trials: Vec<TrialSummary>,
    pub started_at: String,
    pub finished_at: String,
}

impl AggregateReport {
    /// Builds the report from per-trial summaries.
    pub fn from_summaries(
        requested_trials: usize,
        trials: Vec<TrialSummary>,
        cancelled: bool,
        started_at: String,
    ) -> Self {
        let p_values: Vec<f64> = trials.iter().filter_map(|t| t.p_value).collect();
        let failed = trials.iter().filter(|t| t.p_value.is_none()).count();

        let mean_p_value = if p_values.is_empty() {
            None
        } else {
            Some(p_values.iter().sum::<f64>() / p_values.len() as f64)
        };

        let mut counts = [0usize; PValueBand::ALL.len()];
        let mut out_of_band = 0;
        for &p in &p_values {
            match PValueBand::slot_of(p) {
                Some(slot) => counts[slot] += 1,
                None => out_of_band += 1,
            }
        }

        let bands = PValueBand::ALL
            .iter()
            .zip(counts)
            .map(|(band, count)| BandCount {
                label: band.label().to_string(),
                count,
            })
            .collect();

        Self {
            requested_trials,
            succeeded: p_values.len(),
            failed,
            cancelled,
            mean_p_value,
            bands,
            out_of_band,
            trials,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
        }
    }

    /// Hands the band counts to a visualization sink.
    pub fn render_to(&self, sink: &mut dyn HistogramSink) -> anyhow::Result<()> {
        sink.render(&self.bands, self.out_of_band)
    }
}

/// Runs trials against a transcript source.
pub struct Aggregator {
    plan: TrialPlan,
    trials: usize,
    policy: FailurePolicy,
    cancel: Arc<AtomicBool>,
}

impl Aggregator {
    pub fn new(plan: TrialPlan, trials: usize, policy: FailurePolicy) -> Self {
        Self {
            plan,
            trials,
            policy,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares an externally owned cancel flag (e.g. flipped by Ctrl-C).
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Runs all trials. `on_trial` sees every trial as soon as it finishes.
    ///
    /// Fatal errors (launch failure, bad configuration) and any failure under
    /// `FailurePolicy::Abort` are returned as `Err`. A trial that fails after
    /// cancellation was requested is treated as interrupted: it is dropped
    /// and the partial report is returned.
    pub async fn run<F>(
        &self,
        source: &dyn TranscriptSource,
        mut on_trial: F,
    ) -> Result<AggregateReport, HarnessError>
    where
        F: FnMut(usize, &Result<TrialOutcome, HarnessError>),
    {
        let started_at = Utc::now().to_rfc3339();
        let mut summaries = Vec::with_capacity(self.trials);
        let mut cancelled = false;

        info!(
            "Running {} trials of {} shuffles against '{}'.",
            self.trials,
            self.plan.script.shuffle_count,
            source.describe()
        );

        for index in 0..self.trials {
            if self.cancel.load(Ordering::SeqCst) {
                warn!("{}", HarnessError::Cancelled(index));
                cancelled = true;
                break;
            }

            let outcome = run_trial(source, &self.plan, index).await;
            if outcome.is_err() && self.cancel.load(Ordering::SeqCst) {
                warn!("Trial {}/{} was interrupted by cancellation and is discarded.", index + 1, self.trials);
                cancelled = true;
                break;
            }
            on_trial(index, &outcome);

            match outcome {
                Ok(outcome) => {
                    info!(
                        "Trial {}/{}: chi2 = {:.4}, p = {:.6}",
                        index + 1,
                        self.trials,
                        outcome.result.chi_squared,
                        outcome.result.p_value
                    );
                    summaries.push(TrialSummary::succeeded(&outcome));
                }
                Err(err) if err.is_fatal() || self.policy == FailurePolicy::Abort => {
                    let succeeded = summaries.iter().filter(|t| t.p_value.is_some()).count();
                    warn!(
                        "Run stopped at trial {}/{} with {} succeeded and {} failed before it.",
                        index + 1,
                        self.trials,
                        succeeded,
                        summaries.len() - succeeded
                    );
                    return Err(err);
                }
                Err(err) => {
                    warn!("Trial {}/{} failed and is skipped: {}", index + 1, self.trials, err);
                    summaries.push(TrialSummary::failed(index, &err));
                }
            }
        }

        let report = AggregateReport::from_summaries(self.trials, summaries, cancelled, started_at);
        info!(
            "Finished: {} succeeded, {} failed, mean p-value {}",
            report.succeeded,
            report.failed,
            report
                .mean_p_value
                .map(|p| format!("{:.6}", p))
                .unwrap_or_else(|| "n/a".to_string())
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(index: usize, p: Option<f64>) -> TrialSummary {
        TrialSummary {
            index,
            observed: 24,
            chi_squared: p.map(|_| 1.0),
            p_value: p,
            error: p.is_none().then(|| "boom".to_string()),
        }
    }

    #[test]
    fn test_band_edges_are_half_open() {
        assert_eq!(PValueBand::classify(1.0), Some(PValueBand::Above90));
        assert_eq!(PValueBand::classify(0.9), Some(PValueBand::From10To90));
        assert_eq!(PValueBand::classify(0.1), Some(PValueBand::From5To10));
        assert_eq!(PValueBand::classify(0.05), Some(PValueBand::From2_5To5));
        assert_eq!(PValueBand::classify(0.025), Some(PValueBand::From0_1To2_5));
        assert_eq!(PValueBand::classify(0.001), None);
        assert_eq!(PValueBand::classify(0.0), None);
    }

    #[test]
    fn test_each_band_counts_in_its_own_slot() {
        let trials = [0.95, 0.5, 0.07, 0.03, 0.01, f64::NAN]
            .iter()
            .enumerate()
            .map(|(i, &p)| summary(i, Some(p)))
            .collect();
        let report = AggregateReport::from_summaries(6, trials, false, String::new());
        assert!(report.bands.iter().all(|b| b.count == 1), "{:?}", report.bands);
        assert_eq!(report.out_of_band, 1);
    }

    #[test]
    fn test_report_counts_and_mean() {
        let trials = vec![
            summary(0, Some(0.95)),
            summary(1, Some(0.5)),
            summary(2, Some(0.0)),
            summary(3, None),
            summary(4, Some(0.03)),
        ];
        let report = AggregateReport::from_summaries(5, trials, false, String::new());

        assert_eq!(report.succeeded, 4);
        assert_eq!(report.failed, 1);
        assert_eq!(report.out_of_band, 1);
        let mean = report.mean_p_value.unwrap();
        assert!((mean - (0.95 + 0.5 + 0.0 + 0.03) / 4.0).abs() < 1e-12);

        let counts: Vec<(&str, usize)> =
            report.bands.iter().map(|b| (b.label.as_str(), b.count)).collect();
        assert_eq!(
            counts,
            vec![(">0.9", 1), ("0.9~0.1", 1), ("0.1~0.05", 0), ("0.05~0.025", 1), ("0.025~0.001", 0)]
        );
    }

    #[test]
    fn test_failed_trials_do_not_count_as_zero() {
        let trials = vec![summary(0, Some(0.8)), summary(1, None), summary(2, None)];
        let report = AggregateReport::from_summaries(3, trials, false, String::new());
        assert_eq!(report.mean_p_value, Some(0.8));
        assert_eq!(report.out_of_band, 0);
    }

    #[test]
    fn test_no_successes_has_no_mean() {
        let report = AggregateReport::from_summaries(1, vec![summary(0, None)], false, String::new());
        assert_eq!(report.mean_p_value, None);
        assert_eq!(report.bands.iter().map(|b| b.count).sum::<usize>(), 0);
    }
}
