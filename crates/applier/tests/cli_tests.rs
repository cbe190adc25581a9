//! CLI integration tests
//!
//! These only exercise paths that fail or exit before a cluster
//! connection is needed.

use std::io::Write;
use std::process::Command;

fn applier() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rec-applier"));
    // Keep the host environment from leaking into the run
    cmd.env_remove("KUBECONFIG")
        .env_remove("APPLIER_RECOMMENDATIONS_PATH")
        .env("RUST_LOG", "info");
    cmd
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = applier()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("--recommendations"), "Should show input option");
    assert!(stdout.contains("--mode"), "Should show mode option");
    assert!(stdout.contains("--key-scheme"), "Should show key scheme option");
    assert!(stdout.contains("--dry-run"), "Should show dry-run option");
    assert!(stdout.contains("--kubeconfig"), "Should show kubeconfig option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = applier()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("rec-applier"), "Should show binary name");
}

/// Test that a missing recommendations file aborts the run
#[test]
fn test_missing_recommendations_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("recs.json");

    let output = applier()
        .arg("--recommendations")
        .arg(&path)
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Missing input should fail");
    assert!(
        stderr.contains("Failed to read recommendations"),
        "Should explain the failure: {}",
        stderr
    );
}

/// Test that undecodable recommendations abort the run
#[test]
fn test_malformed_recommendations_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"Namespace": "shop"}}"#).unwrap();

    let output = applier()
        .arg("-r")
        .arg(file.path())
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Malformed input should fail");
    assert!(
        stderr.contains("Failed to decode recommendations"),
        "Should explain the failure: {}",
        stderr
    );
}

/// Test that an invalid mode is rejected by argument parsing
#[test]
fn test_invalid_mode() {
    let output = applier()
        .args(["--mode", "sideways"])
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("unknown apply mode"));
}
