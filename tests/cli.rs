//! Integration tests for the CLI surface

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_describes_the_workbench() {
    let mut cmd = Command::cargo_bin("repolens").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Workbench client"))
        .stdout(predicate::str::contains("--backend-url"))
        .stdout(predicate::str::contains("--export-dir"));
}

#[test]
fn version_flag_prints_the_crate_version() {
    let mut cmd = Command::cargo_bin("repolens").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn quit_command_exits_cleanly() {
    let mut cmd = Command::cargo_bin("repolens").unwrap();
    cmd.write_stdin("help\nquit\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("commands:"));
}
