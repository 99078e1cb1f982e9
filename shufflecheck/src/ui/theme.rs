//! Colors of the terminal report.
//!
//! Every styled element of the report is a `ThemeEntry`. A `--theme` YAML
//! file maps entries to one of the 16 named ANSI foreground colors; entries
//! left out keep their default. Unknown color names are rejected while the
//! file is parsed.

use anyhow::{Context, Result};
use owo_colors::{AnsiColors, OwoColorize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub type ThemeMap = HashMap<ThemeEntry, ThemeStyle>;

/// The logical parts of the report that can be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeEntry {
    /// Section titles.
    Header,
    /// The mean p-value when it sits comfortably above 0.1.
    Success,
    Warn,
    Error,
    /// Bars of the p-value histogram.
    HistogramBar,
    /// The `<=0.001` row of the histogram.
    HistogramOutOfBand,
    /// Band labels and summary keys.
    SummaryLabel,
    /// Counts next to the bars.
    SummaryValue,
}

impl ThemeEntry {
    pub const ALL: [ThemeEntry; 8] = [
        ThemeEntry::Header,
        ThemeEntry::Success,
        ThemeEntry::Warn,
        ThemeEntry::Error,
        ThemeEntry::HistogramBar,
        ThemeEntry::HistogramOutOfBand,
        ThemeEntry::SummaryLabel,
        ThemeEntry::SummaryValue,
    ];

    fn default_color(self) -> &'static str {
        match self {
            ThemeEntry::Header => "brightcyan",
            ThemeEntry::Success => "green",
            ThemeEntry::Warn => "yellow",
            ThemeEntry::Error => "red",
            ThemeEntry::HistogramBar => "blue",
            ThemeEntry::HistogramOutOfBand => "brightred",
            ThemeEntry::SummaryLabel => "cyan",
            ThemeEntry::SummaryValue => "white",
        }
    }
}

const NAMED_COLORS: [(&str, AnsiColors); 16] = [
    ("black", AnsiColors::Black),
    ("red", AnsiColors::Red),
    ("green", AnsiColors::Green),
    ("yellow", AnsiColors::Yellow),
    ("blue", AnsiColors::Blue),
    ("magenta", AnsiColors::Magenta),
    ("cyan", AnsiColors::Cyan),
    ("white", AnsiColors::White),
    ("brightblack", AnsiColors::BrightBlack),
    ("brightred", AnsiColors::BrightRed),
    ("brightgreen", AnsiColors::BrightGreen),
    ("brightyellow", AnsiColors::BrightYellow),
    ("brightblue", AnsiColors::BrightBlue),
    ("brightmagenta", AnsiColors::BrightMagenta),
    ("brightcyan", AnsiColors::BrightCyan),
    ("brightwhite", AnsiColors::BrightWhite),
];

/// One of the 16 named ANSI colors, stored by its canonical lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct ThemeColor(&'static str);

// Equivalent to `#[serde(try_from = "String")]`; the derive cannot be used
// because the `&'static str` field forces a `'de: 'static` bound.
impl<'de> Deserialize<'de> for ThemeColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ThemeColor::try_from(s).map_err(serde::de::Error::custom)
    }
}

/// A color name outside the 16 ANSI names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownColorError(pub String);

impl fmt::Display for UnknownColorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<&str> = NAMED_COLORS.iter().map(|(name, _)| *name).collect();
        write!(f, "unknown color '{}'; expected one of: {}", self.0, names.join(", "))
    }
}

impl std::error::Error for UnknownColorError {}

impl FromStr for ThemeColor {
    type Err = UnknownColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(name, _)| ThemeColor(*name))
            .ok_or_else(|| UnknownColorError(s.to_string()))
    }
}

impl TryFrom<String> for ThemeColor {
    type Error = UnknownColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ThemeColor> for String {
    fn from(color: ThemeColor) -> Self {
        color.0.to_string()
    }
}

impl ThemeColor {
    pub fn name(&self) -> &'static str {
        self.0
    }

    pub fn to_ansi_color(&self) -> AnsiColors {
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == self.0)
            .map(|(_, color)| *color)
            .unwrap_or(AnsiColors::Default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeStyle {
    pub fg: Option<ThemeColor>,
}

/// Loads the theme from `theme_path`, or the default theme when none is given.
pub fn build_theme_map(theme_path: Option<&PathBuf>) -> Result<ThemeMap> {
    match theme_path {
        Some(path) => ThemeStyle::load_from_file(path),
        None => Ok(ThemeStyle::default_theme_map()),
    }
}

impl ThemeStyle {
    /// Reads a partial theme and completes it from the defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ThemeMap> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read theme file {}", path.display()))?;
        let mut theme: ThemeMap = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse theme file {}", path.display()))?;

        for (entry, style) in Self::default_theme_map() {
            theme.entry(entry).or_insert(style);
        }
        Ok(theme)
    }

    pub fn default_theme_map() -> ThemeMap {
        ThemeEntry::ALL
            .iter()
            .map(|&entry| {
                let style = ThemeStyle {
                    fg: Some(ThemeColor(entry.default_color())),
                };
                (entry, style)
            })
            .collect()
    }
}

/// Applies the entry's color to `text` when `enable_colors` is set.
pub fn paint(text: &str, entry: ThemeEntry, theme: &ThemeMap, enable_colors: bool) -> String {
    if !enable_colors {
        return text.to_string();
    }
    match theme.get(&entry).and_then(|style| style.fg) {
        Some(color) => text.color(color.to_ansi_color()).to_string(),
        None => text.to_string(),
    }
}
