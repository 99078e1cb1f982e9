// shufflecheck-core/src/sink.rs
//! The seam between the aggregator and whatever draws the histogram.

use anyhow::Result;

use crate::aggregator::BandCount;

/// Receives the finished band counts of a run.
///
/// The core never draws anything itself; the CLI provides a terminal bar
/// chart and tests use `RecordingSink`.
pub trait HistogramSink {
    /// Renders `bands` in order. `out_of_band` counts trials with p <= 0.001.
    fn render(&mut self, bands: &[BandCount], out_of_band: usize) -> Result<()>;
}

/// Keeps whatever it was handed.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub bands: Vec<BandCount>,
    pub out_of_band: usize,
    pub renders: usize,
}

impl HistogramSink for RecordingSink {
    fn render(&mut self, bands: &[BandCount], out_of_band: usize) -> Result<()> {
        self.bands = bands.to_vec();
        self.out_of_band = out_of_band;
        self.renders += 1;
        Ok(())
    }
}
