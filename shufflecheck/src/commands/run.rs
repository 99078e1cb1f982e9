//! `shufflecheck run`: drives the trials and reports the p-value distribution.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use shufflecheck_core::{AggregateReport, Aggregator, HarnessConfig, ProcessDriver, TrialPlan};

use crate::ui::histogram::TerminalHistogram;
use crate::ui::tables;
use crate::ui::theme::{paint, ThemeEntry, ThemeMap};

/// Options for a single `run` invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub show_trials: bool,
    pub show_counts: bool,
    pub json_file: Option<PathBuf>,
    pub json_stdout: bool,
    pub fail_below: Option<f64>,
}

/// Runs every trial described by `config` and prints the report.
///
/// Returns `Ok(false)` when `--fail-below` is set and the mean p-value misses
/// it (or no trial succeeded at all).
pub async fn run_trials(config: &HarnessConfig, opts: &RunOptions, theme: &ThemeMap) -> Result<bool> {
    let plan = TrialPlan::from_config(config).context("Failed to prepare trials")?;
    let driver = ProcessDriver::from_config(config);
    let aggregator = Aggregator::new(plan, config.trials, config.failure_policy);

    let cancel = aggregator.cancel_flag();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current trial.");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    // With --json-stdout the human-readable report moves to stderr.
    let to_stderr = opts.json_stdout;
    let enable_colors = if to_stderr {
        io::stderr().is_terminal()
    } else {
        io::stdout().is_terminal()
    };

    let show_counts = opts.show_counts;
    let result = aggregator
        .run(&driver, |index, outcome| {
            if !show_counts {
                return;
            }
            if let Ok(outcome) = outcome {
                let text = format!("Trial {}\n{}", index + 1, tables::count_table(outcome));
                if to_stderr {
                    eprintln!("{}", text);
                } else {
                    println!("{}", text);
                }
            }
        })
        .await;
    ctrl_c.abort();
    let report = result.context("Shuffle trials failed")?;

    if to_stderr {
        write_report(&mut io::stderr().lock(), &report, opts, theme, enable_colors)?;
    } else {
        write_report(&mut io::stdout().lock(), &report, opts, theme, enable_colors)?;
    }

    if opts.json_file.is_some() || opts.json_stdout {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        if let Some(path) = &opts.json_file {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        } else {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }

    Ok(passes_threshold(&report, opts.fail_below))
}

/// Writes the textual report: summary lines, optional trial table, histogram.
pub fn write_report<W: Write>(
    writer: &mut W,
    report: &AggregateReport,
    opts: &RunOptions,
    theme: &ThemeMap,
    enable_colors: bool,
) -> Result<()> {
    if report.cancelled {
        writeln!(
            writer,
            "{}",
            paint(
                &format!("Run cancelled after {} of {} trials.", report.trials.len(), report.requested_trials),
                ThemeEntry::Warn,
                theme,
                enable_colors,
            )
        )?;
    }

    if opts.show_trials {
        writeln!(writer, "{}", tables::trial_table(&report.trials))?;
    }

    match report.mean_p_value {
        Some(mean) => {
            let entry = if mean > 0.1 { ThemeEntry::Success } else { ThemeEntry::Warn };
            writeln!(
                writer,
                "{} {}",
                paint("Average p-value:", ThemeEntry::SummaryLabel, theme, enable_colors),
                paint(&format!("{:.6}", mean), entry, theme, enable_colors),
            )?;
        }
        None => writeln!(
            writer,
            "{}",
            paint("Average p-value: n/a (no trial succeeded)", ThemeEntry::Error, theme, enable_colors)
        )?,
    }
    writeln!(
        writer,
        "{} {} succeeded, {} failed",
        paint("Trials:", ThemeEntry::SummaryLabel, theme, enable_colors),
        report.succeeded,
        report.failed,
    )?;

    let mut histogram = TerminalHistogram::new(&mut *writer, theme, enable_colors);
    report.render_to(&mut histogram)?;
    debug!("Report rendered for run started at {}", report.started_at);
    Ok(())
}

fn passes_threshold(report: &AggregateReport, fail_below: Option<f64>) -> bool {
    match (fail_below, report.mean_p_value) {
        (None, _) => true,
        (Some(threshold), Some(mean)) => mean >= threshold,
        (Some(_), None) => false,
    }
}
