use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("wordbank")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("bootstrap"))
        .stdout(predicate::str::contains("quiz"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_lists_help_shows_paging() {
    cargo_bin_cmd!("wordbank")
        .args(["lists", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--page"))
        .stdout(predicate::str::contains("--per-page"))
        .stdout(predicate::str::contains("--category"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("wordbank")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}

#[test]
fn test_unknown_command_fails() {
    cargo_bin_cmd!("wordbank")
        .arg("flashcards")
        .assert()
        .failure();
}
