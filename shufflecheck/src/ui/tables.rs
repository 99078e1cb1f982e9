//! Tabular views of a run: one row per trial, and the per-ordering counts
//! of a single trial.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};

use shufflecheck_core::{TrialOutcome, TrialSummary};

fn base_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// One row per trial; failed trials show their error instead of a score.
pub fn trial_table(trials: &[TrialSummary]) -> Table {
    let mut table = base_table(vec!["Trial", "Samples", "Chi-squared", "P-value", "Status"]);
    for trial in trials {
        let status = match &trial.error {
            Some(err) => format!("failed: {}", err),
            None => "ok".to_string(),
        };
        table.add_row(vec![
            Cell::new(trial.index + 1),
            Cell::new(trial.observed),
            Cell::new(trial.chi_squared.map(|c| format!("{:.4}", c)).unwrap_or_else(|| "-".into())),
            Cell::new(trial.p_value.map(|p| format!("{:.6}", p)).unwrap_or_else(|| "-".into())),
            Cell::new(status),
        ]);
    }
    table
}

/// Observed count and deviation from the expectation for every ordering.
pub fn count_table(outcome: &TrialOutcome) -> Table {
    let mut table = base_table(vec!["Ordering", "Observed", "Expected", "Deviation"]);
    for (permutation, count) in outcome.table.iter() {
        table.add_row(vec![
            Cell::new(permutation.key()),
            Cell::new(count),
            Cell::new(format!("{:.2}", outcome.expectation)),
            Cell::new(format!("{:+.2}", count as f64 - outcome.expectation)),
        ]);
    }
    table
}
