// shufflecheck-stats/src/chi_squared/mod.rs
//! Chi-squared goodness-of-fit against a uniform distribution over orderings.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::frequency::FrequencyTable;
use crate::StatsError;

/// Outcome of scoring one frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrialResult {
    /// Sum of squared normalized deviations.
    pub chi_squared: f64,
    /// Probability of a statistic at least this extreme under uniformity.
    pub p_value: f64,
    pub degrees_of_freedom: usize,
}

/// Expected count per ordering when `sample_count` samples are spread
/// uniformly over `space_size` orderings.
pub fn expectation_for(sample_count: usize, space_size: usize) -> f64 {
    if space_size == 0 {
        return 0.0;
    }
    sample_count as f64 / space_size as f64
}

/// Computes the chi-squared statistic and its p-value for `table`.
///
/// Degrees of freedom are the table size minus one.
pub fn evaluate(table: &FrequencyTable, expectation: f64) -> Result<TrialResult, StatsError> {
    if !(expectation.is_finite() && expectation > 0.0) {
        return Err(StatsError::InvalidExpectation(expectation));
    }
    if table.len() < 2 {
        return Err(StatsError::DegenerateSpace(table.len()));
    }

    let chi_squared: f64 = table
        .iter()
        .map(|(_, observed)| {
            let diff = observed as f64 - expectation;
            diff * diff / expectation
        })
        .sum();

    let degrees_of_freedom = table.len() - 1;
    let dist = ChiSquared::new(degrees_of_freedom as f64)
        .map_err(|e| StatsError::Distribution(e.to_string()))?;
    let p_value = dist.sf(chi_squared).clamp(0.0, 1.0);

    Ok(TrialResult {
        chi_squared,
        p_value,
        degrees_of_freedom,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::tabulate;
    use crate::permutation::{Permutation, PermutationSpace};

    const EPSILON: f64 = 1e-9;

    fn four_symbols() -> PermutationSpace {
        PermutationSpace::enumerate(&["1", "2", "3", "4"]).unwrap()
    }

    #[test]
    fn test_even_distribution_scores_zero() {
        // 24 orderings x 1000 samples each
        let space = four_symbols();
        let samples: Vec<Permutation> = space
            .iter()
            .flat_map(|p| std::iter::repeat(p.clone()).take(1000))
            .collect();
        let table = tabulate(&space, &samples).unwrap();
        let expectation = expectation_for(samples.len(), space.len());
        assert!((expectation - 1000.0).abs() < EPSILON);

        let result = evaluate(&table, expectation).unwrap();
        assert!(result.chi_squared.abs() < EPSILON);
        assert!((result.p_value - 1.0).abs() < EPSILON);
        assert_eq!(result.degrees_of_freedom, 23);
    }

    #[test]
    fn test_concentrated_distribution_scores_near_zero() {
        let space = four_symbols();
        let samples = vec![Permutation::new(["1", "2", "3", "4"]); 24_000];
        let table = tabulate(&space, &samples).unwrap();
        let result = evaluate(&table, expectation_for(samples.len(), space.len())).unwrap();

        // (24000 - 1000)^2 / 1000 + 23 * 1000
        assert!((result.chi_squared - 552_000.0).abs() < 1e-6);
        assert!(result.p_value < 1e-12);
    }

    #[test]
    fn test_statistic_non_negative_and_p_in_unit_interval() {
        let space = four_symbols();
        let samples: Vec<Permutation> = space
            .iter()
            .enumerate()
            .flat_map(|(i, p)| std::iter::repeat(p.clone()).take(10 + i))
            .collect();
        let table = tabulate(&space, &samples).unwrap();
        let result = evaluate(&table, expectation_for(samples.len(), space.len())).unwrap();

        assert!(result.chi_squared > 0.0);
        assert!((0.0..=1.0).contains(&result.p_value));
    }

    #[test]
    fn test_rejects_non_positive_expectation() {
        let space = four_symbols();
        let table = FrequencyTable::zeroed(&space);
        assert_eq!(evaluate(&table, 0.0).unwrap_err(), StatsError::InvalidExpectation(0.0));
        assert!(matches!(evaluate(&table, -2.5), Err(StatsError::InvalidExpectation(_))));
        assert!(matches!(evaluate(&table, f64::NAN), Err(StatsError::InvalidExpectation(_))));
    }

    #[test]
    fn test_single_symbol_space_is_degenerate() {
        let space = PermutationSpace::enumerate(&["only"]).unwrap();
        let table = tabulate(&space, &[Permutation::new(["only"])]).unwrap();
        assert_eq!(evaluate(&table, 1.0).unwrap_err(), StatsError::DegenerateSpace(1));
    }

    #[test]
    fn test_degrees_of_freedom_follow_space_size() {
        let space = PermutationSpace::enumerate(&["a", "b", "c"]).unwrap();
        let samples: Vec<Permutation> = space.iter().cloned().collect();
        let table = tabulate(&space, &samples).unwrap();
        let result = evaluate(&table, 1.0).unwrap();
        assert_eq!(result.degrees_of_freedom, 5);
    }

    #[test]
    fn test_expectation_for_empty_space() {
        assert_eq!(expectation_for(10, 0), 0.0);
        assert!((expectation_for(10, 4) - 2.5).abs() < EPSILON);
    }
}
