//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with HOME pointed at a temporary directory
//! and verify outputs.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str], stdin: Option<&str>) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tomatotock"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("TOMATOTOCK_ENV")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    {
        let mut pipe = child.stdin.take().unwrap();
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).unwrap();
        }
    }

    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_config_get_default() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["config", "get", "timers.work"], None);
    assert_eq!(code, 0, "Config get failed");
    assert_eq!(stdout.trim(), "1500");
}

#[test]
fn test_config_set_then_get() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&home, &["config", "set", "general.pause_after_work", "true"], None);
    assert_eq!(code, 0, "Config set failed");

    let (stdout, _, code) = run_cli(&home, &["config", "get", "general.pause_after_work"], None);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "true");
}

#[test]
fn test_config_set_rejects_zero_duration() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["config", "set", "timers.short_rest", "0"], None);
    assert_ne!(code, 0);
    assert!(stderr.contains("timers.short_rest"), "stderr was: {stderr}");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["config", "get", "timers.nope"], None);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_list_is_json() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["config", "list"], None);
    assert_eq!(code, 0, "Config list failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["general"]["long_break_interval"], 4);
}

#[test]
fn test_stats_all_starts_empty() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["stats", "all"], None);
    assert_eq!(code, 0, "Stats all failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["total_work_units"], 0);
}

#[test]
fn test_stats_today() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&home, &["stats", "today"], None);
    assert_eq!(code, 0, "Stats today failed");
}

#[test]
fn test_run_toggle_and_status() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(
        &home,
        &["run", "--no-desktop", "--reload-secs", "0"],
        Some("t\ns\nq\n"),
    );
    assert_eq!(code, 0, "Run failed");
    assert!(stdout.contains("\"phase\": \"work\""), "stdout was: {stdout}");
    assert!(stdout.contains("\"paused\": false"));
    assert!(stdout.contains("Work"));
}

#[test]
fn test_run_reset_returns_idle() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(
        &home,
        &["run", "--no-desktop", "--reload-secs", "0", "--start"],
        Some("r\ns\n"),
    );
    assert_eq!(code, 0, "Run failed");
    assert!(stdout.contains("\"phase\": \"idle\""), "stdout was: {stdout}");
    assert!(stdout.contains("\"remaining_seconds\": 1500"));
}

#[test]
fn test_run_survives_closed_stdout() {
    let home = TempDir::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_tomatotock"))
        .args(["run", "--no-desktop", "--reload-secs", "0"])
        .env("HOME", home.path())
        .env_remove("TOMATOTOCK_ENV")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    // Close the read end before the session writes anything.
    drop(child.stdout.take());
    {
        let mut pipe = child.stdin.take().unwrap();
        pipe.write_all(b"t\ns\nr\nq\n").unwrap();
    }

    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("panicked"), "stderr was: {stderr}");
    assert!(stderr.contains("presentation sink rejected state"), "stderr was: {stderr}");
    assert_eq!(output.status.code(), Some(0), "stderr was: {stderr}");
}

#[test]
fn test_run_uses_configured_language() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&home, &["config", "set", "general.language", "zh"], None);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(
        &home,
        &["run", "--no-desktop", "--reload-secs", "0"],
        Some("t\nt\nq\n"),
    );
    assert_eq!(code, 0, "Run failed");
    assert!(stdout.contains("工作"), "stdout was: {stdout}");
    assert!(stdout.contains("（已暂停）"), "stdout was: {stdout}");
}
