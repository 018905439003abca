//! CLI contract tests for the read-only reporting subcommands.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn shde_cmd(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shde").expect("failed to find shde binary");
    cmd.env("SHDE_DATA_DIR", data_dir.path());
    cmd
}

#[test]
fn performance_on_an_empty_data_dir_exits_zero() {
    let data_dir = TempDir::new().unwrap();
    shde_cmd(&data_dir)
        .arg("performance")
        .assert()
        .success()
        .stdout(predicate::str::contains("{"));
}

#[test]
fn logs_on_an_empty_data_dir_lists_no_entries() {
    let data_dir = TempDir::new().unwrap();
    shde_cmd(&data_dir)
        .arg("logs")
        .assert()
        .success()
        .stdout(predicate::str::contains("successful"))
        .stdout(predicate::str::contains("failed"));
}

#[test]
fn rollback_with_nothing_backed_up_is_a_no_op() {
    let data_dir = TempDir::new().unwrap();
    shde_cmd(&data_dir)
        .arg("rollback")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to roll back"));
}

#[test]
fn no_subcommand_prints_usage_and_exits_three() {
    let data_dir = TempDir::new().unwrap();
    shde_cmd(&data_dir).assert().code(3);
}

#[test]
fn fix_imports_on_a_project_with_no_python_files_is_a_no_op() {
    let data_dir = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    shde_cmd(&data_dir)
        .arg("--project")
        .arg(project.path())
        .arg("fix-imports")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 import(s) fixed"));
}
