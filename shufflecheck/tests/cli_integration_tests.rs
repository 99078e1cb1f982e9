// shufflecheck/tests/cli_integration_tests.rs
//! End-to-end tests of the binary. A `sh` script written to a temp file
//! stands in for the external shuffle program.
#![cfg(unix)]

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const ORDERINGS: [&str; 24] = [
    "1 2 3 4", "1 2 4 3", "1 3 2 4", "1 3 4 2", "1 4 2 3", "1 4 3 2",
    "2 1 3 4", "2 1 4 3", "2 3 1 4", "2 3 4 1", "2 4 1 3", "2 4 3 1",
    "3 1 2 4", "3 1 4 2", "3 2 1 4", "3 2 4 1", "3 4 1 2", "3 4 2 1",
    "4 1 2 3", "4 1 3 2", "4 2 1 3", "4 2 3 1", "4 3 1 2", "4 3 2 1",
];

/// Prints every ordering `rounds` times, so each trial scores p = 1.
fn uniform_script(rounds: usize) -> Result<NamedTempFile> {
    let quoted: Vec<String> = ORDERINGS.iter().map(|p| format!("\"{}\"", p)).collect();
    write_script(&format!(
        "cat > /dev/null\necho \"l = [1 2 3 4]\"\ni=0\nwhile [ $i -lt {rounds} ]; do\n  for p in {list}; do echo \"l = [$p]\"; done\n  i=$((i+1))\ndone\necho \"l = NULL\"\n",
        rounds = rounds,
        list = quoted.join(" ")
    ))
}

/// Never shuffles.
fn identity_script(count: usize) -> Result<NamedTempFile> {
    write_script(&format!(
        "cat > /dev/null\necho \"l = [1 2 3 4]\"\ni=0\nwhile [ $i -lt {count} ]; do\n  echo \"l = [1 2 3 4]\"\n  i=$((i+1))\ndone\necho \"l = NULL\"\n"
    ))
}

fn write_script(body: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(body.as_bytes())?;
    Ok(file)
}

fn shufflecheck() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("shufflecheck"));
    cmd.env_remove("RUST_LOG").env_remove("SHUFFLECHECK_CONFIG");
    cmd
}

#[test]
fn run_reports_mean_p_value_and_histogram() -> Result<()> {
    let script = uniform_script(2)?;
    shufflecheck()
        .args(["run", "--program", "sh", "--program-arg"])
        .arg(script.path())
        .args(["--shuffles", "48", "--trials", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Average p-value: 1.000000"))
        .stdout(predicate::str::contains("Trials: 3 succeeded, 0 failed"))
        .stdout(predicate::str::contains("P-value distribution"))
        .stdout(predicate::str::contains(">0.9 |"));
    Ok(())
}

#[test]
fn json_stdout_emits_machine_readable_report() -> Result<()> {
    let script = uniform_script(1)?;
    let output = shufflecheck()
        .args(["-q", "run", "--json-stdout", "--program", "sh", "--program-arg"])
        .arg(script.path())
        .args(["--shuffles", "24", "--trials", "2"])
        .output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["succeeded"], 2);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["requested_trials"], 2);
    assert_eq!(report["bands"][0]["label"], ">0.9");
    assert_eq!(report["bands"][0]["count"], 2);
    assert_eq!(report["trials"].as_array().map(Vec::len), Some(2));

    let text = String::from_utf8(strip_ansi_escapes::strip(&output.stderr))?;
    assert!(text.contains("Average p-value"), "{}", text);
    Ok(())
}

#[test]
fn json_file_is_written() -> Result<()> {
    let script = uniform_script(1)?;
    let dir = tempfile::tempdir()?;
    let json_path = dir.path().join("report.json");
    shufflecheck()
        .args(["-q", "run", "--program", "sh", "--program-arg"])
        .arg(script.path())
        .args(["--shuffles", "24", "--trials", "1", "--json-file"])
        .arg(&json_path)
        .assert()
        .success();

    let report: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path)?)?;
    assert_eq!(report["mean_p_value"], 1.0);
    Ok(())
}

#[test]
fn biased_program_fails_threshold() -> Result<()> {
    let script = identity_script(48)?;
    shufflecheck()
        .args(["-q", "run", "--program", "sh", "--program-arg"])
        .arg(script.path())
        .args(["--shuffles", "48", "--trials", "2", "--fail-below", "0.01"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("<=0.001 | "))
        .stdout(predicate::str::contains("Trials: 2 succeeded, 0 failed"));
    Ok(())
}

#[test]
fn missing_program_is_fatal() {
    shufflecheck()
        .args(["run", "--program", "/nonexistent/qtest", "--trials", "5", "--shuffles", "24"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to launch '/nonexistent/qtest'"));
}

#[test]
fn invalid_flags_fail_validation() {
    shufflecheck()
        .args(["config", "--symbols", "1", "--trials", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("At least two symbols are required"))
        .stderr(predicate::str::contains("`trials` must be greater than 0."));
}

#[test]
fn config_command_merges_file_and_flags() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "symbols: [\"a\", \"b\", \"c\"]\ntrials: 7\ntranscript:\n  start_marker: \"BEGIN {{symbols}}\"\n  end_marker: \"END\"\n  token_pattern: '[a-z]'")?;

    let output = shufflecheck()
        .args(["config", "--trials", "9", "--config"])
        .arg(file.path())
        .output()?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("trials: 9"), "{}", stdout);
    assert!(stdout.contains("end_marker: END"), "{}", stdout);
    assert!(stdout.contains("- a"), "{}", stdout);
    Ok(())
}
