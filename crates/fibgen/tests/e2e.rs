//! End-to-end CLI integration tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn fibgen() -> Command {
    let mut cmd = Command::cargo_bin("fibgen").expect("binary not found");
    cmd.env_remove("FIBGEN_CEILING").env_remove("FIBGEN_DEPTH");
    cmd
}

#[test]
fn help_flag() {
    fibgen()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stream-cancel"));
}

#[test]
fn version_flag() {
    fibgen()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fibgen"));
}

#[test]
fn missing_ceiling_fails() {
    fibgen().assert().failure();
}

#[test]
fn stream_all_to_thirty() {
    fibgen()
        .args(["30", "stream-all", "-q"])
        .assert()
        .success()
        .stdout("0\n1\n1\n2\n3\n5\n8\n13\n21\n");
}

#[test]
fn stream_all_reports_counts() {
    fibgen()
        .args(["30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("9 values returned"))
        .stdout(predicate::str::contains("9 yield() call count"));
}

#[test]
fn iter_all_to_thirty() {
    fibgen()
        .args(["30", "iter-all", "-q", "--depth", "1"])
        .assert()
        .success()
        .stdout("0\n1\n1\n2\n3\n5\n8\n13\n21\n");
}

#[test]
fn stream_cancel_subset() {
    fibgen()
        .args(["2000000000", "stream-cancel", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("10946\n"))
        .stdout(predicate::str::contains("701408733\n"))
        .stdout(predicate::str::contains("1134903170").not());
}

#[test]
fn iter_cancel_reports_cancel() {
    fibgen()
        .args(["2000000000", "iter-cancel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("generator cancelled (iter-cancel)"));
}

#[test]
fn json_format() {
    let output = fibgen()
        .args(["30", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["count"], 9);
    assert_eq!(doc["values"][8], "21");
    assert_eq!(doc["operation"], "stream-all");
}

#[test]
fn unknown_operation_rejected() {
    fibgen()
        .args(["30", "sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sideways"));
}

#[test]
fn zero_depth_is_config_error() {
    fibgen()
        .args(["30", "--depth", "0"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("buffer depth"));
}

#[test]
fn bad_poll_interval_rejected() {
    fibgen()
        .args(["30", "--poll-interval", "soon"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid duration"));
}

#[test]
fn overflowing_poll_interval_rejected() {
    fibgen()
        .args(["30", "--poll-interval", "400000000000000000m"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fib.txt");
    fibgen()
        .args(["8", "-q", "-o"])
        .arg(&path)
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "0\n1\n1\n2\n3\n5\n8\n");
}

#[test]
fn completion_bash() {
    fibgen()
        .args(["--completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fibgen"));
}
