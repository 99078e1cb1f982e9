//! Configuration management for `shufflecheck-core`.
//!
//! This module defines the harness configuration: the symbol set, how many
//! shuffles and trials to run, how to invoke the external program, and how to
//! recognise its transcript. Defaults are embedded as YAML; a user file and
//! command-line flags are layered on top as `HarnessOverrides`.
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tinytemplate::TinyTemplate;

use shufflecheck_stats::MAX_SYMBOLS;

/// What the aggregator does when a single trial fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run at the first failed trial.
    Abort,
    /// Record the failure and continue; failed trials never enter the mean.
    Skip,
}

/// How the external shuffle program is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProgramConfig {
    pub path: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Command verbs used to build the stdin script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScriptConfig {
    /// Lines sent before any element is inserted (e.g. `new`).
    pub setup: Vec<String>,
    /// Verb used to insert one symbol (`it 1`).
    pub insert_command: String,
    /// Verb used to request N shuffles (`shuffle 100000`).
    pub shuffle_command: String,
    /// Lines sent after the shuffles (e.g. `free`, `quit`).
    pub teardown: Vec<String>,
}

/// How the relevant region and samples are found in the program's output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranscriptConfig {
    /// Template for the pre-shuffle marker; `{symbols}` expands to the
    /// space-joined symbol set.
    pub start_marker: String,
    /// Literal marker printed once the collection is released.
    pub end_marker: String,
    /// Regex for a single symbol token on a sample line.
    pub token_pattern: String,
}

/// The complete, validated harness configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HarnessConfig {
    pub symbols: Vec<String>,
    pub shuffles_per_trial: usize,
    pub trials: usize,
    pub timeout_secs: u64,
    pub failure_policy: FailurePolicy,
    pub program: ProgramConfig,
    pub script: ScriptConfig,
    pub transcript: TranscriptConfig,
}

/// Partial configuration read from a user file or built from CLI flags.
/// Every `Some` field replaces the corresponding default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HarnessOverrides {
    pub symbols: Option<Vec<String>>,
    pub shuffles_per_trial: Option<usize>,
    pub trials: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub failure_policy: Option<FailurePolicy>,
    pub program: Option<ProgramConfig>,
    pub script: Option<ScriptConfig>,
    pub transcript: Option<TranscriptConfig>,
}

impl HarnessConfig {
    /// Loads the built-in defaults from the embedded configuration.
    pub fn load_default() -> Result<Self> {
        debug!("Loading default harness configuration from embedded string...");
        let default_yaml = include_str!("../config/default_harness.yaml");
        let config: HarnessConfig = serde_yml::from_str(default_yaml)
            .context("Failed to parse default harness configuration")?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Renders the start marker template for this symbol set.
    pub fn start_marker(&self) -> Result<String> {
        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&tinytemplate::format_unescaped);
        tt.add_template("start", &self.transcript.start_marker)
            .context("Failed to parse start marker template")?;
        let ctx = serde_json::json!({ "symbols": self.symbols.join(" ") });
        tt.render("start", &ctx)
            .map_err(|e| anyhow!("Failed to render start marker: {}", e))
    }

    /// Checks the configuration for everything that would make a run
    /// meaningless, reporting all problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.symbols.len() < 2 {
            errors.push(format!(
                "At least two symbols are required, got {}.",
                self.symbols.len()
            ));
        }
        if self.symbols.len() > MAX_SYMBOLS {
            errors.push(format!(
                "At most {} symbols are supported, got {}.",
                MAX_SYMBOLS,
                self.symbols.len()
            ));
        }

        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if !seen.insert(symbol.as_str()) {
                errors.push(format!("Duplicate symbol '{}'.", symbol));
            }
        }

        match Regex::new(&format!("^(?:{})$", self.transcript.token_pattern)) {
            Ok(token) => {
                for symbol in &self.symbols {
                    if !token.is_match(symbol) {
                        errors.push(format!(
                            "Symbol '{}' does not match token pattern '{}'.",
                            symbol, self.transcript.token_pattern
                        ));
                    }
                }
            }
            Err(e) => errors.push(format!(
                "Token pattern '{}' is not a valid regex: {}",
                self.transcript.token_pattern, e
            )),
        }

        if self.shuffles_per_trial == 0 {
            errors.push("`shuffles_per_trial` must be greater than 0.".to_string());
        }
        if self.trials == 0 {
            errors.push("`trials` must be greater than 0.".to_string());
        }
        if self.timeout_secs == 0 {
            errors.push("`timeout_secs` must be greater than 0.".to_string());
        }
        if self.program.path.trim().is_empty() {
            errors.push("`program.path` cannot be empty.".to_string());
        }
        if self.script.shuffle_command.trim().is_empty() {
            errors.push("`script.shuffle_command` cannot be empty.".to_string());
        }
        if self.transcript.end_marker.is_empty() {
            errors.push("`transcript.end_marker` cannot be empty.".to_string());
        }
        match self.start_marker() {
            Ok(marker) if marker.is_empty() => {
                errors.push("`transcript.start_marker` renders to an empty string.".to_string())
            }
            Ok(_) => {}
            Err(e) => errors.push(format!("{:#}", e)),
        }

        if let Some(space_size) = factorial_checked(self.symbols.len()) {
            if self.shuffles_per_trial < space_size {
                warn!(
                    "{} shuffles per trial is fewer than the {} possible orderings; the test will be underpowered.",
                    self.shuffles_per_trial, space_size
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("Configuration validation failed:\n{}", errors.join("\n")))
        }
    }
}

impl HarnessOverrides {
    /// Loads overrides from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading harness configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let overrides: HarnessOverrides = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(overrides)
    }
}

/// Overlays `user` on top of `default`.
pub fn merge_config(default: HarnessConfig, user: Option<HarnessOverrides>) -> HarnessConfig {
    let mut merged = default;
    let Some(user) = user else {
        return merged;
    };

    if let Some(symbols) = user.symbols {
        debug!("Overriding symbols with user value: {:?}", symbols);
        merged.symbols = symbols;
    }
    if let Some(shuffles) = user.shuffles_per_trial {
        debug!("Overriding shuffles per trial with user value: {}", shuffles);
        merged.shuffles_per_trial = shuffles;
    }
    if let Some(trials) = user.trials {
        debug!("Overriding trial count with user value: {}", trials);
        merged.trials = trials;
    }
    if let Some(timeout) = user.timeout_secs {
        merged.timeout_secs = timeout;
    }
    if let Some(policy) = user.failure_policy {
        merged.failure_policy = policy;
    }
    if let Some(program) = user.program {
        debug!("Overriding program with user value: {} {:?}", program.path, program.args);
        merged.program = program;
    }
    if let Some(script) = user.script {
        merged.script = script;
    }
    if let Some(transcript) = user.transcript {
        merged.transcript = transcript;
    }
    merged
}

fn factorial_checked(n: usize) -> Option<usize> {
    (1..=n).try_fold(1usize, |acc, k| acc.checked_mul(k))
}
