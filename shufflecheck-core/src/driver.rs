// shufflecheck-core/src/driver.rs
//! Drives the external shuffle program.
//!
//! A `CommandScript` is rendered into a single stdin payload, handed to one
//! child process, and the complete stdout is captured once the child exits.
//! `isolate_transcript` then cuts out the region between the pre-shuffle
//! marker and the release marker.
//!
//! License: MIT OR APACHE 2.0

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::{HarnessConfig, ProgramConfig, ScriptConfig};
use crate::errors::HarnessError;

/// The line-oriented command script sent to the external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandScript {
    /// Lines that build the reference collection.
    pub setup: Vec<String>,
    /// Verb used to request shuffles.
    pub shuffle_command: String,
    /// Number of shuffles requested in this invocation.
    pub shuffle_count: usize,
    /// Lines that release the collection and end the session.
    pub teardown: Vec<String>,
}

impl CommandScript {
    /// Builds the script that seeds `symbols` and requests `shuffle_count` shuffles.
    pub fn for_symbols(script: &ScriptConfig, symbols: &[String], shuffle_count: usize) -> Self {
        let mut setup = script.setup.clone();
        setup.extend(
            symbols
                .iter()
                .map(|symbol| format!("{} {}", script.insert_command, symbol)),
        );
        Self {
            setup,
            shuffle_command: script.shuffle_command.clone(),
            shuffle_count,
            teardown: script.teardown.clone(),
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::for_symbols(&config.script, &config.symbols, config.shuffles_per_trial)
    }

    /// Renders the newline-terminated stdin payload.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.setup {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&format!("{} {}\n", self.shuffle_command, self.shuffle_count));
        for line in &self.teardown {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Anything that can turn a command script into a raw transcript.
///
/// `ProcessDriver` is the production implementation; tests plug in
/// in-process generators.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Runs `script` once and returns the complete standard output.
    async fn fetch(&self, script: &CommandScript) -> Result<String, HarnessError>;

    /// A short human-readable name for logs.
    fn describe(&self) -> String;
}

/// Spawns the external program once per call.
#[derive(Debug, Clone)]
pub struct ProcessDriver {
    program: ProgramConfig,
    timeout: Duration,
}

impl ProcessDriver {
    pub fn new(program: ProgramConfig, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.program.clone(), config.timeout())
    }
}

#[async_trait]
impl TranscriptSource for ProcessDriver {
    async fn fetch(&self, script: &CommandScript) -> Result<String, HarnessError> {
        let payload = script.render();
        debug!(
            "Launching '{}' with {} bytes of script.",
            self.describe(),
            payload.len()
        );

        let mut command = Command::new(&self.program.path);
        command
            .args(&self.program.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group: a terminal Ctrl-C reaches the harness only, and
        // the current trial finishes before cancellation takes effect.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|source| HarnessError::ProcessLaunch {
                program: self.program.path.clone(),
                source,
            })?;

        // Feed stdin from a separate task so a chatty child cannot deadlock
        // against a full stdout pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| HarnessError::IoError(std::io::Error::other("child stdin unavailable")))?;
        let writer = tokio::spawn(async move {
            stdin.write_all(payload.as_bytes()).await?;
            stdin.shutdown().await
        });

        // On timeout the child future is dropped, which kills the process.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| HarnessError::Timeout(self.timeout))??;

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Child closed stdin early: {}", e),
            Err(e) => warn!("Stdin writer task failed: {}", e),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            warn!(
                "'{}' exited with {}; stderr tail: {}",
                self.describe(),
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("Captured {} bytes of stdout.", stdout.len());
        Ok(stdout)
    }

    fn describe(&self) -> String {
        if self.program.args.is_empty() {
            self.program.path.clone()
        } else {
            format!("{} {}", self.program.path, self.program.args.join(" "))
        }
    }
}

/// Returns the text strictly between the first `start_marker` and the first
/// `end_marker` after it.
pub fn isolate_transcript<'a>(
    stdout: &'a str,
    start_marker: &str,
    end_marker: &str,
) -> Result<&'a str, HarnessError> {
    let start = stdout
        .find(start_marker)
        .ok_or_else(|| HarnessError::MissingMarker {
            which: "start",
            marker: start_marker.to_string(),
        })?
        + start_marker.len();

    let end = stdout[start..]
        .find(end_marker)
        .ok_or_else(|| HarnessError::MissingMarker {
            which: "end",
            marker: end_marker.to_string(),
        })?
        + start;

    Ok(&stdout[start..end])
}
