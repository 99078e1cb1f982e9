// shufflecheck-stats/src/frequency/mod.rs
use std::collections::BTreeMap;

use crate::permutation::{Permutation, PermutationSpace};
use crate::StatsError;

/// Observation counts for every ordering in a permutation space.
///
/// Orderings that never occurred keep an explicit zero entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<Permutation, u64>,
    total: u64,
}

impl FrequencyTable {
    /// A table with a zero entry for every ordering of `space`.
    pub fn zeroed(space: &PermutationSpace) -> Self {
        Self {
            counts: space.iter().map(|p| (p.clone(), 0)).collect(),
            total: 0,
        }
    }

    /// Records one observation. Fails if `sample` is outside the space.
    pub fn record(&mut self, sample: &Permutation) -> Result<(), StatsError> {
        match self.counts.get_mut(sample) {
            Some(count) => {
                *count += 1;
                self.total += 1;
                Ok(())
            }
            None => Err(StatsError::UnknownPermutation(sample.key())),
        }
    }

    pub fn count(&self, permutation: &Permutation) -> Option<u64> {
        self.counts.get(permutation).copied()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of entries (always the size of the space).
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Permutation, u64)> {
        self.counts.iter().map(|(p, &c)| (p, c))
    }
}

/// Builds a frequency table for `samples` against the whole `space`.
pub fn tabulate(
    space: &PermutationSpace,
    samples: &[Permutation],
) -> Result<FrequencyTable, StatsError> {
    let mut table = FrequencyTable::zeroed(space);
    for sample in samples {
        table.record(sample)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> PermutationSpace {
        PermutationSpace::enumerate(&["1", "2", "3"]).unwrap()
    }

    #[test]
    fn test_zero_entries_are_visible() {
        let space = space();
        let samples = vec![Permutation::new(["1", "2", "3"]); 5];
        let table = tabulate(&space, &samples).unwrap();

        assert_eq!(table.len(), 6);
        assert_eq!(table.count(&Permutation::new(["1", "2", "3"])), Some(5));
        assert_eq!(table.count(&Permutation::new(["3", "2", "1"])), Some(0));
        assert_eq!(table.iter().filter(|(_, c)| *c == 0).count(), 5);
    }

    #[test]
    fn test_sum_of_counts_equals_batch_length() {
        let space = space();
        let samples: Vec<Permutation> = space.iter().cycle().take(37).cloned().collect();
        let table = tabulate(&space, &samples).unwrap();

        assert_eq!(table.total(), 37);
        assert_eq!(table.iter().map(|(_, c)| c).sum::<u64>(), 37);
    }

    #[test]
    fn test_unknown_sample_is_rejected() {
        let space = space();
        let samples = vec![
            Permutation::new(["1", "2", "3"]),
            Permutation::new(["1", "2", "9"]),
        ];
        assert_eq!(
            tabulate(&space, &samples).unwrap_err(),
            StatsError::UnknownPermutation("1 2 9".to_string())
        );
    }
}
