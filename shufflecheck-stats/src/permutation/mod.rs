// shufflecheck-stats/src/permutation/mod.rs
//! Enumeration of every ordering of a fixed symbol set.

use std::collections::HashSet;
use std::fmt;

use log::debug;
use serde::Serialize;

use crate::StatsError;

/// Largest symbol set we are willing to enumerate (9! = 362 880 orderings).
pub const MAX_SYMBOLS: usize = 9;

/// One complete ordering of the symbol set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Permutation(Vec<String>);

impl Permutation {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(symbols.into_iter().map(Into::into).collect())
    }

    pub fn symbols(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical key: symbols joined by a single space.
    pub fn key(&self) -> String {
        self.0.join(" ")
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// The full set of orderings for one symbol set.
///
/// Built once per run and shared read-only between trials.
#[derive(Debug, Clone)]
pub struct PermutationSpace {
    symbols: Vec<String>,
    orderings: Vec<Permutation>,
    index: HashSet<Permutation>,
}

impl PermutationSpace {
    /// Enumerates all `n!` orderings of `symbols`.
    ///
    /// Orderings are produced in lexicographic order of input positions, so
    /// the first entry is always the input order itself.
    pub fn enumerate<S: AsRef<str>>(symbols: &[S]) -> Result<Self, StatsError> {
        if symbols.is_empty() {
            return Err(StatsError::EmptySymbolSet);
        }
        if symbols.len() > MAX_SYMBOLS {
            return Err(StatsError::TooManySymbols(symbols.len(), MAX_SYMBOLS));
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in symbols {
            if !seen.insert(symbol.as_ref()) {
                return Err(StatsError::DuplicateSymbol(symbol.as_ref().to_string()));
            }
        }

        let symbols: Vec<String> = symbols.iter().map(|s| s.as_ref().to_string()).collect();
        let mut positions: Vec<usize> = (0..symbols.len()).collect();
        let mut orderings = Vec::with_capacity(factorial(symbols.len()));

        loop {
            orderings.push(Permutation(
                positions.iter().map(|&p| symbols[p].clone()).collect(),
            ));
            if !next_permutation(&mut positions) {
                break;
            }
        }

        let index: HashSet<Permutation> = orderings.iter().cloned().collect();
        debug!(
            "Enumerated {} orderings of {} symbols.",
            orderings.len(),
            symbols.len()
        );

        Ok(Self { symbols, orderings, index })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.orderings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orderings.is_empty()
    }

    pub fn contains(&self, permutation: &Permutation) -> bool {
        self.index.contains(permutation)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Permutation> {
        self.orderings.iter()
    }
}

/// Rearranges `positions` into the next lexicographic ordering.
/// Returns false once the last ordering has been reached.
fn next_permutation(positions: &mut [usize]) -> bool {
    if positions.len() < 2 {
        return false;
    }

    let mut pivot = positions.len() - 1;
    while pivot > 0 && positions[pivot - 1] >= positions[pivot] {
        pivot -= 1;
    }
    if pivot == 0 {
        return false;
    }

    let mut successor = positions.len() - 1;
    while positions[successor] <= positions[pivot - 1] {
        successor -= 1;
    }
    positions.swap(pivot - 1, successor);
    positions[pivot..].reverse();
    true
}

fn factorial(n: usize) -> usize {
    (1..=n).product()
}
