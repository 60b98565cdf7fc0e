//! Integration tests for the `stagehand` binary.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary with colors off, no ambient target, and settings isolated in `home`.
fn stagehand(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stagehand"));
    cmd.env("NO_COLOR", "1")
        .env("STAGEHAND_CONFIG", home.join("config.yaml"))
        .env_remove("STAGEHAND_HOST")
        .env_remove("STAGEHAND_USER")
        .env_remove("STAGEHAND_PORT")
        .env_remove("RUST_LOG");
    cmd
}

fn role(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write role");
    path
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    let home = TempDir::new().expect("tempdir");
    stagehand(home.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_help_lists_subcommands() {
    let home = TempDir::new().expect("tempdir");
    stagehand(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    let home = TempDir::new().expect("tempdir");
    stagehand(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stagehand"));
}

// --- plan ---

#[test]
fn test_plan_prints_merged_sorted_state() {
    let home = TempDir::new().expect("tempdir");
    let a = role(
        home.path(),
        "base.yaml",
        "packages: [git, curl]\nfiles:\n  - { path: /etc/app, dir: true }\n",
    );
    let b = role(
        home.path(),
        "web.yaml",
        "packages: [curl]\nfiles:\n  - { path: /etc/app/web.conf, content: hi, mode: \"0640\" }\n  - { path: /etc/app, dir: true }\n",
    );

    stagehand(home.path())
        .arg("plan")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("Roles  base, web"))
        .stdout(predicate::str::contains("Packages (2)"))
        .stdout(predicate::str::is_match(r"(?s)curl.*git").expect("regex"))
        .stdout(predicate::str::contains("d 0755 root:root /etc/app"))
        .stdout(predicate::str::contains("f 0640 root:root /etc/app/web.conf (2 bytes)"));
}

#[test]
fn test_plan_conflict_exits_one_naming_the_path() {
    let home = TempDir::new().expect("tempdir");
    let a = role(home.path(), "a.yaml", "files:\n  - { path: /etc/x, content: a }\n");
    let b = role(home.path(), "b.yaml", "files:\n  - { path: /etc/x, content: b }\n");

    stagehand(home.path())
        .arg("plan")
        .arg(&a)
        .arg(&b)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: merging roles"))
        .stderr(predicate::str::contains("\"/etc/x\""));
}

#[test]
fn test_plan_missing_role_file_fails() {
    let home = TempDir::new().expect("tempdir");
    stagehand(home.path())
        .arg("plan")
        .arg(home.path().join("nope.yaml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope.yaml"));
}

#[test]
fn test_malformed_settings_file_fails() {
    let home = TempDir::new().expect("tempdir");
    std::fs::write(home.path().join("config.yaml"), "ssh: [1, 2]\n").expect("write");
    let a = role(home.path(), "a.yaml", "packages: [curl]\n");

    stagehand(home.path())
        .arg("plan")
        .arg(&a)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot parse"));
}

// --- apply ---

#[test]
fn test_apply_without_target_fails() {
    let home = TempDir::new().expect("tempdir");
    let a = role(home.path(), "a.yaml", "packages: [curl]\n");

    stagehand(home.path())
        .arg("apply")
        .arg(&a)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--host"));
}

#[test]
fn test_apply_without_agent_fails_before_connecting() {
    let home = TempDir::new().expect("tempdir");
    let a = role(home.path(), "a.yaml", "packages: [curl]\n");

    stagehand(home.path())
        .env_remove("SSH_AUTH_SOCK")
        .args(["apply", "--host", "192.0.2.1"])
        .arg(&a)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("SSH_AUTH_SOCK"));
}

#[test]
fn test_apply_rejects_malformed_ssh_option() {
    let home = TempDir::new().expect("tempdir");
    let a = role(home.path(), "a.yaml", "packages: [curl]\n");

    stagehand(home.path())
        .args(["apply", "--host", "web-1", "--ssh-option", "BatchMode"])
        .arg(&a)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("KEY=VALUE"));
}
