//! Integration tests for the exporter binary's configuration handling.
//!
//! These tests run the built binary with `--check-config`, `--show-config`
//! and the `config` subcommand. They never start the HTTP server.

use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

/// Helper to get the binary path
fn binary_path() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_dgx-spark-exporter"))
}

/// Runs the binary without config file discovery and returns
/// (success, stdout, stderr).
fn run(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(binary_path())
        .arg("--no-config")
        .args(args)
        .output()
        .expect("Failed to execute command");

    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

fn pem_file(kind: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "-----BEGIN {kind}-----\nDUMMY\n-----END {kind}-----")
        .expect("Failed to write PEM");
    file.flush().expect("Failed to flush PEM");
    file
}

fn assert_rejected(args: &[&str], message: &str) {
    let (ok, stdout, stderr) = run(args);
    assert!(!ok, "Expected failure for {:?}", args);
    assert!(
        stdout.contains(message) || stderr.contains(message),
        "Expected '{}', got stdout: '{}', stderr: '{}'",
        message,
        stdout,
        stderr
    );
}

#[test]
fn test_default_config_is_valid() {
    let (ok, stdout, stderr) = run(&["--check-config"]);
    assert!(ok, "stdout: {}\nstderr: {}", stdout, stderr);
    assert!(stdout.contains("Configuration is valid"));
}

#[test]
fn test_tls_enabled_without_paths() {
    assert_rejected(
        &["--enable-tls", "--check-config"],
        "TLS is enabled but neither tls_cert_path nor tls_key_path are set",
    );
}

#[test]
fn test_tls_enabled_with_one_path() {
    assert_rejected(
        &["--enable-tls", "--tls-cert", "/some/path.pem", "--check-config"],
        "TLS is enabled but tls_key_path is not set",
    );
    assert_rejected(
        &["--enable-tls", "--tls-key", "/some/key.pem", "--check-config"],
        "TLS is enabled but tls_cert_path is not set",
    );
}

#[test]
fn test_tls_enabled_with_nonexistent_files() {
    assert_rejected(
        &[
            "--enable-tls",
            "--tls-cert",
            "/nonexistent/cert.pem",
            "--tls-key",
            "/nonexistent/key.pem",
            "--check-config",
        ],
        "TLS certificate file not found",
    );
}

#[test]
fn test_tls_enabled_with_readable_files() {
    let cert = pem_file("CERTIFICATE");
    let key = pem_file("PRIVATE KEY");

    let (ok, stdout, stderr) = run(&[
        "--enable-tls",
        "--tls-cert",
        cert.path().to_str().unwrap(),
        "--tls-key",
        key.path().to_str().unwrap(),
        "--check-config",
    ]);
    assert!(ok, "stdout: {}\nstderr: {}", stdout, stderr);
}

#[test]
fn test_all_collectors_disabled_is_rejected() {
    assert_rejected(
        &[
            "--disable-collectors",
            "cpu,gpu,memory,disk,network",
            "--check-config",
        ],
        "must be true",
    );
}

#[test]
fn test_show_config_reflects_cli_overrides() {
    let (ok, stdout, _) = run(&[
        "--port",
        "9100",
        "--interfaces",
        "eth0,eth1",
        "--gpu-timeout-ms",
        "250",
        "--show-config",
    ]);

    assert!(ok);
    assert!(stdout.contains("port: 9100"), "got: {}", stdout);
    assert!(stdout.contains("- eth0"), "got: {}", stdout);
    assert!(stdout.contains("gpu_timeout_ms: 250"), "got: {}", stdout);
    assert!(stdout.contains("enable_tls: false"), "got: {}", stdout);
}

#[test]
fn test_show_config_as_json() {
    let (ok, stdout, _) = run(&["--show-config", "--config-format", "json"]);
    assert!(ok);

    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(value["port"], 9835);
    assert_eq!(value["collectors"]["gpu_command"], "nvidia-smi");
}

#[test]
fn test_config_file_is_loaded() {
    let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
    writeln!(file, "port: 9999\ncollectors:\n  enable_gpu: false\n").unwrap();

    let output = Command::new(binary_path())
        .args(["--config", file.path().to_str().unwrap(), "--show-config"])
        .output()
        .expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("port: 9999"), "got: {}", stdout);
    assert!(stdout.contains("enable_gpu: false"), "got: {}", stdout);
}

#[test]
fn test_generated_config_is_valid_input() {
    let (ok, stdout, _) = run(&["config", "--output", "-", "--commented"]);
    assert!(ok);
    assert!(stdout.starts_with("# DGX Spark Prometheus Exporter Configuration"));

    let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
    file.write_all(stdout.as_bytes()).unwrap();

    let output = Command::new(binary_path())
        .args(["--config", file.path().to_str().unwrap(), "--check-config"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
}
