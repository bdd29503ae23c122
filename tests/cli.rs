use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn prints_version() {
    Command::cargo_bin("inkpost")
        .expect("inkpost binary")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn prints_help() {
    Command::cargo_bin("inkpost")
        .expect("inkpost binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("inkpost").and(predicate::str::contains("--config")));
}

#[test]
fn missing_config_file_fails() {
    Command::cargo_bin("inkpost")
        .expect("inkpost binary")
        .args(["--config", "/nonexistent/inkpost/config.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("load config"));
}

#[test]
fn rejects_unknown_flags() {
    Command::cargo_bin("inkpost")
        .expect("inkpost binary")
        .arg("--bogus")
        .assert()
        .code(2);
}
