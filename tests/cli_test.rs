//! CLI surface tests: argument validation and exit codes, no network.

use assert_cmd::Command;
use predicates::prelude::*;

fn sfsight() -> Command {
    Command::cargo_bin("sfsight").unwrap()
}

#[test]
fn help_lists_commands() {
    sfsight()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("worksheet"))
        .stdout(predicate::str::contains("dashboard"));
}

#[test]
fn login_without_credential_source_fails_fast() {
    sfsight()
        .args(["login", "--account", "acme", "--user", "jdoe"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("credential source"));
}

#[test]
fn login_rejects_sso_and_password_together() {
    sfsight()
        .args([
            "login", "--account", "acme", "--user", "jdoe",
            "--sso", "--password-env", "PW",
        ])
        .assert()
        .failure()
        .code(2); // clap usage error
}

#[test]
fn entity_command_without_saved_session_exits_not_found() {
    let dir = tempfile::TempDir::new().unwrap();
    sfsight()
        .args([
            "--context-dir",
            dir.path().to_str().unwrap(),
            "worksheet",
            "list",
            "--account",
            "acme",
            "--user",
            "jdoe",
        ])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("sfsight login"));
}
