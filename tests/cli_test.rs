// ABOUTME: Black-box tests for the `simplescript` binary: file execution and REPL reserved verbs

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn script_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp script file");
    write!(file, "{contents}").expect("write temp script file");
    file
}

#[test]
fn running_a_script_file_exits_cleanly_on_success() {
    let file = script_file("VAR a = 5 + 2 * 3\nPRINT(a)\n");
    Command::cargo_bin("simplescript")
        .unwrap()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("11"));
}

#[test]
fn running_a_script_with_a_runtime_error_exits_nonzero() {
    let file = script_file("never_bound_name\n");
    Command::cargo_bin("simplescript")
        .unwrap()
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not defined"));
}

#[test]
fn missing_script_file_is_a_clean_error() {
    Command::cargo_bin("simplescript")
        .unwrap()
        .arg("/no/such/file.ss")
        .assert()
        .failure();
}

#[test]
fn repl_exit_verb_ends_the_session() {
    Command::cargo_bin("simplescript")
        .unwrap()
        .write_stdin("VAR a = 1 + 1\nPRINT(a)\nEXIT\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2"));
}

#[test]
fn repl_debug_verb_toggles_traceback_printing() {
    Command::cargo_bin("simplescript")
        .unwrap()
        .write_stdin("DEBUG\nnever_bound_name\nEXIT\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("File"));
}
