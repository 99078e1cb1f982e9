// shufflecheck/src/main.rs
//! shufflecheck entry point.
//!
//! Builds the effective configuration (embedded defaults, then the optional
//! `--config` file, then command-line flags), validates it and dispatches to
//! the selected command.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, LevelFilter};
use std::process::ExitCode;

use shufflecheck::cli::{Cli, Commands, HarnessArgs};
use shufflecheck::commands::config::print_config;
use shufflecheck::commands::run::{run_trials, RunOptions};
use shufflecheck::logger;
use shufflecheck::ui::theme::build_theme_map;
use shufflecheck_core::{merge_config, HarnessConfig, HarnessOverrides};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Some(LevelFilter::Off)
    } else if cli.debug {
        Some(LevelFilter::Debug)
    } else {
        None
    };
    logger::init_logger(level);

    match &cli.command {
        Commands::Run(run) => {
            let config = effective_config(&cli, &run.harness)?;
            let theme = build_theme_map(cli.theme.as_ref()).context("Theme error")?;
            let opts = RunOptions {
                show_trials: run.show_trials,
                show_counts: run.show_counts,
                json_file: run.json_file.clone(),
                json_stdout: run.json_stdout,
                fail_below: run.fail_below,
            };
            if run_trials(&config, &opts, &theme).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Config(args) => {
            let config = effective_config(&cli, args)?;
            print_config(&config, &mut std::io::stdout().lock())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn effective_config(cli: &Cli, args: &HarnessArgs) -> Result<HarnessConfig> {
    // 1. Embedded defaults
    let mut config = HarnessConfig::load_default()?;

    // 2. User file
    if let Some(path) = &cli.config {
        let overrides = HarnessOverrides::load_from_file(path)
            .with_context(|| format!("Failed to load configuration '{}'", path.display()))?;
        config = merge_config(config, Some(overrides));
    }

    // 3. Flags
    let flags = args.to_overrides(&config.program);
    config = merge_config(config, Some(flags));

    config.validate()?;
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}
