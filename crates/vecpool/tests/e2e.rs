//! End-to-end CLI integration tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn vecpool() -> Command {
    Command::cargo_bin("vecpool").expect("binary not found")
}

#[test]
fn help_flag() {
    vecpool()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("conjugate-gradient"));
}

#[test]
fn version_flag() {
    vecpool()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vecpool"));
}

#[test]
fn both_strategies_report() {
    vecpool()
        .args(["-n", "32", "--solves", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("direct:"))
        .stdout(predicate::str::contains("pooled:"))
        .stdout(predicate::str::contains("hit rate"))
        .stdout(predicate::str::contains("pooled speedup"));
}

#[test]
fn pooled_only() {
    vecpool()
        .args(["-n", "16", "--solves", "2", "--strategy", "pooled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pooled:"))
        .stdout(predicate::str::contains("direct:").not());
}

#[test]
fn size_from_environment() {
    vecpool()
        .env("VECPOOL_SIZE", "8")
        .args(["--solves", "1", "--strategy", "direct"])
        .assert()
        .success()
        .stdout(predicate::str::contains("size 8"));
}

#[test]
fn json_report_is_parseable() {
    let output = vecpool()
        .args([
            "-n",
            "20",
            "--solves",
            "3",
            "--strategy",
            "pooled",
            "--initial-size",
            "4",
            "--json",
            "--trim",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let pooled = &json["strategies"][0];
    assert_eq!(pooled["strategy"], "pooled");
    assert_eq!(pooled["allocations"], 12);
    // Pre-populated entries cover every request.
    assert_eq!(pooled["pool"]["stats"]["constructed"], 4);
    assert_eq!(pooled["pool"]["stats"]["reused"], 12);
    assert_eq!(json["trimmed"], 4);
    assert_eq!(json["workload"]["pool_options"]["initial_size"], 4);
}

#[test]
fn parallel_threads() {
    vecpool()
        .args(["-n", "24", "--solves", "16", "--threads", "4", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn nested_solver() {
    vecpool()
        .args(["-n", "16", "--solves", "2", "--nested"])
        .assert()
        .success();
}

#[test]
fn output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    vecpool()
        .args(["-n", "16", "--solves", "1", "--json", "-q", "--output"])
        .arg(&path)
        .assert()
        .success();
    let contents = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(json["workload"]["size"], 16);
}

#[test]
fn log_statistics_goes_to_stderr() {
    vecpool()
        .env("RUST_LOG", "vecpool_memory=info")
        .args(["-n", "8", "--solves", "1", "--strategy", "pooled", "--log-statistics"])
        .assert()
        .success()
        .stderr(predicate::str::contains("total_allocated=4"));
}

#[test]
fn zero_solves_is_config_error() {
    vecpool()
        .args(["--solves", "0"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("--solves must be at least 1"));
}

#[test]
fn bad_tolerance_is_config_error() {
    vecpool().args(["--tolerance", "0"]).assert().code(4);
}

#[test]
fn negative_tolerance_is_config_error() {
    vecpool()
        .args(["--tolerance", "-1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("tolerance"));
}

#[test]
fn no_convergence_exit_code() {
    vecpool()
        .args(["-n", "200", "--solves", "1", "--max-steps", "3"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no convergence"));
}

#[test]
fn invalid_strategy() {
    vecpool().args(["--strategy", "arena"]).assert().failure();
}

#[test]
fn completion_bash() {
    vecpool()
        .args(["--completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vecpool"));
}
