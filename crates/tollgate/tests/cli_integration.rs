//! CLI integration tests for the Tollgate command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Local session commands read and clear the credential file
//! - Invalid inputs are rejected before any network call
//!
//! Note: These tests do not require a running backend.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the tollgate binary, isolated from the user's config.
fn tollgate(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tollgate").unwrap();
    cmd.current_dir(home.path())
        .env("TOLLGATE_CONFIG_DIR", home.path())
        .env_remove("TOLLGATE_API_BASE_URL")
        .env_remove("TOLLGATE_RELAY_UPSTREAM");
    cmd
}

fn write_session(home: &TempDir) {
    std::fs::write(
        home.path().join("session.json"),
        r#"{
  "fields": {
    "access_token": "access-token-0123456789",
    "refresh_token": "refresh-token",
    "device_id": "device-1",
    "user_id": "user-1"
  }
}"#,
    )
    .unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tollgate"))
        .stdout(predicate::str::contains("relay"));
}

#[test]
fn test_version_displays() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tollgate"));
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("password"))
        .stdout(predicate::str::contains("api"))
        .stdout(predicate::str::contains("relay"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_auth_help_lists_actions() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["auth", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("oauth"))
        .stdout(predicate::str::contains("refresh"))
        .stdout(predicate::str::contains("logout"));
}

#[test]
fn test_password_help() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["password", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("request"))
        .stdout(predicate::str::contains("confirm"));
}

#[test]
fn test_global_flags_accepted() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["--verbose", "--json", "--api-url", "http://localhost:9999", "--help"])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_status_signed_out() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["--json", "auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""authenticated": false"#));
}

#[test]
fn test_status_reads_session_file() {
    let home = TempDir::new().unwrap();
    write_session(&home);

    tollgate(&home)
        .args(["--json", "auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""authenticated": true"#))
        .stdout(predicate::str::contains("user-1"))
        .stdout(predicate::str::contains("acce...6789"))
        .stdout(predicate::str::contains("access-token-0123456789").not());
}

#[test]
fn test_session_file_flag() {
    let home = TempDir::new().unwrap();
    write_session(&home);
    let other = home.path().join("elsewhere.json");

    tollgate(&home)
        .args(["--json", "--session-file"])
        .arg(&other)
        .args(["auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""authenticated": false"#));
}

#[test]
fn test_logout_removes_session_file() {
    let home = TempDir::new().unwrap();
    write_session(&home);

    tollgate(&home)
        .args(["auth", "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"));
    assert!(!home.path().join("session.json").exists());

    tollgate(&home)
        .args(["auth", "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No session stored"));
}

#[test]
fn test_refresh_without_token_fails() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["auth", "refresh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No refresh token stored"));
}

#[test]
fn test_api_url_from_project_config() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("tollgate.toml"),
        "[api]\nbase_url = \"https://backend.example/api/v1\"\n",
    )
    .unwrap();

    tollgate(&home)
        .args(["--json", "auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://backend.example/api/v1"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Subcommand Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_init_writes_defaults_once() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    let written = std::fs::read_to_string(home.path().join("config.toml")).unwrap();
    assert!(written.contains("[relay]"));
    assert!(written.contains("single_flight_refresh = false"));

    tollgate(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_config_init_local() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["config", "init", "--local"])
        .assert()
        .success();
    assert!(home.path().join("tollgate.toml").is_file());
}

#[test]
fn test_config_show_applies_overrides() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["--api-url", "https://cli.example/api/v1", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://cli.example/api/v1"))
        .stdout(predicate::str::contains("login_path = \"/login\""));
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalid Input Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_subcommand_fails() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_api_rejects_unknown_method() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["api", "TRACE", "/users"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_api_requires_endpoint() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["api", "get", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Endpoint is required"));
}

#[test]
fn test_api_rejects_invalid_json_body() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["api", "POST", "/items", "--data", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON format"));
}

#[test]
fn test_api_rejects_malformed_query() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["api", "get", "/items", "--query", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key=value"));
}

#[test]
fn test_relay_rejects_bad_bind() {
    let home = TempDir::new().unwrap();
    tollgate(&home)
        .args(["relay", "--bind", "not-an-address"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid relay configuration"));
}
