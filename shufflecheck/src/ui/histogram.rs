//! Horizontal bar chart of the p-value bands.

use anyhow::Result;
use std::io::Write;

use shufflecheck_core::{BandCount, HistogramSink};

use crate::ui::theme::{paint, ThemeEntry, ThemeMap};

/// Width of the longest bar, in characters.
pub const BAR_WIDTH: usize = 40;
const OUT_OF_BAND_LABEL: &str = "<=0.001";

/// Draws the histogram to any writer.
pub struct TerminalHistogram<'a, W: Write> {
    writer: W,
    theme: &'a ThemeMap,
    enable_colors: bool,
}

impl<'a, W: Write> TerminalHistogram<'a, W> {
    pub fn new(writer: W, theme: &'a ThemeMap, enable_colors: bool) -> Self {
        Self {
            writer,
            theme,
            enable_colors,
        }
    }

    fn row(&mut self, label: &str, count: usize, scale: usize, entry: ThemeEntry) -> Result<()> {
        let len = bar_length(count, scale);
        let bar = "#".repeat(len);
        writeln!(
            self.writer,
            "{} | {} {}",
            paint(&format!("{:>12}", label), ThemeEntry::SummaryLabel, self.theme, self.enable_colors),
            paint(&bar, entry, self.theme, self.enable_colors),
            paint(&count.to_string(), ThemeEntry::SummaryValue, self.theme, self.enable_colors),
        )?;
        Ok(())
    }
}

/// Bar length for `count` when `scale` is the largest count. Non-zero counts
/// always get at least one mark.
pub fn bar_length(count: usize, scale: usize) -> usize {
    if count == 0 || scale == 0 {
        return 0;
    }
    ((count * BAR_WIDTH) / scale).max(1)
}

impl<W: Write> HistogramSink for TerminalHistogram<'_, W> {
    fn render(&mut self, bands: &[BandCount], out_of_band: usize) -> Result<()> {
        let scale = bands
            .iter()
            .map(|b| b.count)
            .chain(std::iter::once(out_of_band))
            .max()
            .unwrap_or(0);

        writeln!(
            self.writer,
            "{}",
            paint("P-value distribution", ThemeEntry::Header, self.theme, self.enable_colors)
        )?;
        for band in bands {
            self.row(&band.label, band.count, scale, ThemeEntry::HistogramBar)?;
        }
        self.row(OUT_OF_BAND_LABEL, out_of_band, scale, ThemeEntry::HistogramOutOfBand)?;
        self.writer.flush()?;
        Ok(())
    }
}
