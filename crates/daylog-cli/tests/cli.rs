//! CLI integration tests
//!
//! Exercise the `daylog` binary on paths that never reach the network:
//! the window preview and configuration failures.

use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

const SETTING_VARS: [&str; 4] = [
    "TODOIST_API_TOKEN",
    "GOOGLE_SHEET_ID",
    "SERVICE_ACCOUNT_FILE",
    "TODOIST_PROJECT_NAME",
];

fn daylog(dir: &TempDir, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_daylog"));
    for var in SETTING_VARS {
        command.env_remove(var);
    }
    command
        .env_remove("RUST_LOG")
        .current_dir(dir.path())
        .args(args)
        .output()
        .expect("failed to launch daylog")
}

#[test]
fn window_lists_seven_days_back_from_reference_date() {
    let dir = TempDir::new().unwrap();
    let output = daylog(&dir, &["window", "--today", "2024-01-10"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(
        lines[0],
        "-1  2024-01-09  2024-01-09T00:00:00Z  2024-01-09T23:59:59.999999Z  Jan-24"
    );
    assert!(lines[6].starts_with("-7  2024-01-03  "));
}

#[test]
fn window_crosses_into_previous_year_tab() {
    let dir = TempDir::new().unwrap();
    let output = daylog(&dir, &["window", "--today", "2024-01-02"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert!(lines[0].ends_with("Jan-24"));
    assert!(lines[1].contains("2023-12-31"));
    assert!(lines[1].ends_with("Dec-23"));
}

#[test]
fn run_without_settings_reports_every_missing_key() {
    let dir = TempDir::new().unwrap();
    let output = daylog(&dir, &["run"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("missing required setting(s)"));
    assert!(stderr.contains("todoist_api_token"));
    assert!(stderr.contains("google_sheet_id"));
}

#[test]
fn bare_invocation_runs_reconciliation() {
    let dir = TempDir::new().unwrap();
    let output = daylog(&dir, &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("missing required setting(s)"));
}

#[test]
fn missing_service_account_file_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("daylog.toml");
    fs::write(
        &config_path,
        r#"
todoist_api_token = "token"
google_sheet_id = "sheet"
service_account_file = "absent.json"
todoist_project_name = "Daily"
"#,
    )
    .unwrap();

    let output = daylog(&dir, &["run", "--config", config_path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("loading service-account key"));
    assert!(stderr.contains("absent.json"));
}

#[test]
fn unknown_config_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("daylog.toml");
    fs::write(&config_path, "sheet = \"typo\"\n").unwrap();

    let output = daylog(&dir, &["run", "--config", config_path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("sheet"));
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    let output = daylog(&dir, &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("run"));
    assert!(stdout.contains("window"));
}
