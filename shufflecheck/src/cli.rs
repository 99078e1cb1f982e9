//! This file defines the command-line interface (CLI) for the shufflecheck
//! application, including all available commands and their arguments.
//! License: MIT OR Apache-2.0

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use shufflecheck_core::{FailurePolicy, HarnessOverrides, ProgramConfig};

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "shufflecheck",
    author = "Obscura Team (Relay)",
    version = env!("CARGO_PKG_VERSION"),
    about = "Check whether an external program shuffles uniformly",
    long_about = "shufflecheck repeatedly runs an external shuffle program, parses the orderings it prints, and scores each run with a chi-squared goodness-of-fit test against the uniform distribution over all orderings. The p-values of many runs are summarised as a histogram.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Path to a harness configuration file (YAML).
    #[arg(long = "config", value_name = "FILE", global = true, env = "SHUFFLECHECK_CONFIG", help = "Path to a harness configuration file (YAML).")]
    pub config: Option<PathBuf>,

    /// Path to a custom YAML theme file.
    #[arg(long = "theme", value_name = "FILE", global = true, help = "Specify the path to a custom YAML theme file.")]
    pub theme: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `shufflecheck` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the trials and prints the p-value report.
    #[command(about = "Run the shuffle uniformity trials and report the p-value distribution.")]
    Run(RunCommand),

    /// Prints the effective configuration after merging defaults, file and flags.
    #[command(about = "Print the effective configuration as YAML.")]
    Config(HarnessArgs),
}

/// Flags that override configuration values.
#[derive(Parser, Debug, Default, Clone)]
pub struct HarnessArgs {
    /// Path of the external shuffle program.
    #[arg(long = "program", value_name = "PATH", help = "Path of the external shuffle program (default ./qtest).")]
    pub program: Option<String>,

    /// Arguments passed to the external program (repeatable).
    #[arg(long = "program-arg", value_name = "ARG", allow_hyphen_values = true, help = "Argument for the external program; repeat for several (default: -v 3).")]
    pub program_args: Vec<String>,

    /// Symbols inserted before shuffling (comma-separated).
    #[arg(long = "symbols", value_delimiter = ',', help = "Symbols to insert before shuffling (comma-separated).")]
    pub symbols: Vec<String>,

    /// Shuffles requested per trial.
    #[arg(long = "shuffles", short = 'n', value_name = "N", help = "Number of shuffles requested per trial.")]
    pub shuffles: Option<usize>,

    /// Number of independent trials.
    #[arg(long = "trials", short = 't', value_name = "N", help = "Number of independent trials.")]
    pub trials: Option<usize>,

    /// Per-trial timeout in seconds.
    #[arg(long = "timeout", value_name = "SECS", help = "Kill the external program after this many seconds.")]
    pub timeout: Option<u64>,

    /// What to do when a trial fails.
    #[arg(long = "on-failure", value_name = "POLICY", help = "What to do when a trial fails: 'skip' or 'abort'.")]
    pub on_failure: Option<PolicyChoice>,
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunCommand {
    #[command(flatten)]
    pub harness: HarnessArgs,

    /// Print a table with one row per trial.
    #[arg(long = "show-trials", help = "Print a table with one row per trial.")]
    pub show_trials: bool,

    /// Print the observed count of every ordering for every trial.
    #[arg(long = "show-counts", help = "Print the observed count of every ordering for every trial.")]
    pub show_counts: bool,

    /// Export the report to a JSON file.
    #[arg(long = "json-file", value_name = "FILE", help = "Export the report to a JSON file.")]
    pub json_file: Option<PathBuf>,

    /// Print the report as JSON to stdout (conflicts with --json-file).
    #[arg(long = "json-stdout", conflicts_with = "json_file", help = "Print the report as JSON to stdout.")]
    pub json_stdout: bool,

    /// Exit with a non-zero code if the mean p-value is below this threshold.
    #[arg(long = "fail-below", value_name = "P", help = "Exit with a non-zero code if the mean p-value is below P.")]
    pub fail_below: Option<f64>,
}

/// Enum for selecting the failure policy.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum PolicyChoice {
    /// Record the failed trial and keep going.
    Skip,
    /// Stop at the first failed trial.
    Abort,
}

impl From<PolicyChoice> for FailurePolicy {
    fn from(choice: PolicyChoice) -> Self {
        match choice {
            PolicyChoice::Skip => FailurePolicy::Skip,
            PolicyChoice::Abort => FailurePolicy::Abort,
        }
    }
}

impl HarnessArgs {
    /// Converts the flags into overrides. `base_program` fills in whichever
    /// half of the program invocation was not given on the command line.
    pub fn to_overrides(&self, base_program: &ProgramConfig) -> HarnessOverrides {
        let program = if self.program.is_some() || !self.program_args.is_empty() {
            Some(ProgramConfig {
                path: self.program.clone().unwrap_or_else(|| base_program.path.clone()),
                args: if self.program_args.is_empty() {
                    base_program.args.clone()
                } else {
                    self.program_args.clone()
                },
            })
        } else {
            None
        };

        HarnessOverrides {
            symbols: (!self.symbols.is_empty()).then(|| self.symbols.clone()),
            shuffles_per_trial: self.shuffles,
            trials: self.trials,
            timeout_secs: self.timeout,
            failure_policy: self.on_failure.map(FailurePolicy::from),
            program,
            ..Default::default()
        }
    }
}
