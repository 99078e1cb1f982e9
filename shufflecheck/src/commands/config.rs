//! `shufflecheck config`: prints the effective configuration.

use anyhow::{Context, Result};
use std::io::Write;

use shufflecheck_core::HarnessConfig;

/// Writes `config` as YAML, in the same shape the `--config` file accepts.
pub fn print_config<W: Write>(config: &HarnessConfig, writer: &mut W) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    writer.write_all(yaml.as_bytes())?;
    Ok(())
}
