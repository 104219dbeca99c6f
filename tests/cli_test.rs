//! CLI surface tests. None of these start a browser.
//!
//! Run with: cargo test --test cli_test

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;

fn branchsweep() -> Command {
    let mut cmd = Command::cargo_bin("branchsweep").unwrap();
    cmd.env_remove("BRANCHSWEEP_CONFIG")
        .env_remove("BRANCHSWEEP_CDP")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    branchsweep()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    branchsweep().assert().failure().code(2);
}

#[test]
#[serial]
fn config_show_prints_defaults() {
    let dir = tempfile::tempdir().unwrap();
    branchsweep()
        .args(["config", "show", "--config"])
        .arg(dir.path().join("none.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("[sweep]"))
        .stdout(predicate::str::contains("delete_delay_ms = 1000"))
        .stdout(predicate::str::contains("branchsweep-delete-all"));
}

#[test]
#[serial]
fn config_show_merges_file_and_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[sweep]\ndelete_delay_ms = 2500\n\n[control]\nlabel = \"Purge\"\n").unwrap();

    branchsweep()
        .args(["--json", "config", "show", "--config"])
        .arg(&path)
        .env("BRANCHSWEEP_SWEEP__DIALOG_RENDER_DELAY_MS", "50")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"delete_delay_ms\": 2500"))
        .stdout(predicate::str::contains("\"dialog_render_delay_ms\": 50"))
        .stdout(predicate::str::contains("\"label\": \"Purge\""));
}

#[test]
#[serial]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[sweep]\nrow_selector = \"  \"\n").unwrap();

    branchsweep()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("row_selector"));
}

#[test]
fn config_path_reports_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");

    branchsweep()
        .args(["--json", "config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"))
        .stdout(predicate::str::contains("\"exists\":false"));
}
