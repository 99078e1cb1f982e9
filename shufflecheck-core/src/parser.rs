// shufflecheck-core/src/parser.rs
//! Extracts permutation samples from an isolated transcript region.
//!
//! A sample line carries exactly `n` tokens separated by single spaces. The
//! run may be wrapped in other text (`l = [3 1 2 4]`) but must not be part of
//! a longer run of tokens. Surrounding whitespace at the line edges is
//! tolerated. Lines without such a run are ignored.

use log::{debug, warn};
use regex::{Regex, RegexBuilder};

use shufflecheck_stats::Permutation;

use crate::config::HarnessConfig;
use crate::errors::HarnessError;

/// Compiled line-shape matcher for one symbol-set size.
#[derive(Debug, Clone)]
pub struct SampleParser {
    line: Regex,
    width: usize,
}

impl SampleParser {
    /// Compiles a parser for lines of `width` tokens matching `token_pattern`.
    pub fn new(token_pattern: &str, width: usize) -> Result<Self, HarnessError> {
        if width == 0 {
            return Err(HarnessError::Config(
                "sample width must be at least one token".to_string(),
            ));
        }

        let pattern = format!(
            r"(?:^\s*|[^\w ])((?:{t})(?: (?:{t})){{{rest}}})(?:\s*$|[^\w ])",
            t = token_pattern,
            rest = width - 1
        );
        debug!("Compiled sample line pattern: {}", pattern);

        let line = RegexBuilder::new(&pattern)
            .size_limit(10 * (1 << 20))
            .build()
            .map_err(|e| {
                HarnessError::Config(format!("invalid token pattern '{}': {}", token_pattern, e))
            })?;

        Ok(Self { line, width })
    }

    pub fn from_config(config: &HarnessConfig) -> Result<Self, HarnessError> {
        Self::new(&config.transcript.token_pattern, config.symbols.len())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Parses one sample per matching line, in transcript order.
    pub fn parse(&self, region: &str) -> Vec<Permutation> {
        region
            .lines()
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    /// Parses `region` and warns when the batch length differs from `requested`.
    pub fn parse_batch(&self, region: &str, requested: usize) -> Vec<Permutation> {
        let batch = self.parse(region);
        if batch.len() != requested {
            warn!(
                "Parsed {} samples but {} shuffles were requested; scoring the observed count.",
                batch.len(),
                requested
            );
        }
        batch
    }

    fn parse_line(&self, line: &str) -> Option<Permutation> {
        let caps = self.line.captures(line)?;
        let run = caps.get(1)?;
        Some(Permutation::new(run.as_str().split(' ')))
    }
}
