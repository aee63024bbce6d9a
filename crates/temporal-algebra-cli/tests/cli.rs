use assert_cmd::Command;
use predicates::prelude::*;

fn timex() -> Command {
    Command::cargo_bin("timex").unwrap()
}

fn first_value(stdout: &[u8]) -> String {
    let json: serde_json::Value = serde_json::from_slice(stdout).unwrap();
    json[0]["value"].as_str().unwrap().to_string()
}

// ── resolve ─────────────────────────────────────────────────────────────────

#[test]
fn test_resolve_month_against_anchor() {
    let out = timex()
        .args(["resolve", "XXXX-06", "--anchor", "2016-06-19"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(first_value(&out), "2016-06");
}

#[test]
fn test_resolve_next_monday() {
    let out = timex()
        .args(["resolve", "monday", "--anchor", "2016-06-19T10:30:00", "--op", "next"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(first_value(&out), "2016-06-20");
}

#[test]
fn test_resolve_to_past() {
    let out = timex()
        .args(["resolve", "XXXX-08", "--anchor", "2016-06-19", "--past"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(first_value(&out), "2015-08");
}

#[test]
fn test_config_disables_heuristics() {
    let path = std::env::temp_dir().join(format!("timex-cli-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"heuristicLevel": "none"}"#).unwrap();
    let out = timex()
        .args(["resolve", "XXXX-06", "--anchor", "2016-06-19", "--config"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    std::fs::remove_file(&path).ok();
    assert_eq!(first_value(&out), "XXXX-06");
}

#[test]
fn test_unrecognized_expression_fails() {
    timex()
        .args(["resolve", "sometime-ish", "--anchor", "2016-06-19"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized expression"));
}

#[test]
fn test_bad_anchor_fails() {
    timex()
        .args(["resolve", "XXXX-06", "--anchor", "June 19th"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid anchor time"));
}

#[test]
fn test_conflicting_directions_rejected() {
    timex()
        .args(["resolve", "XXXX-06", "--anchor", "2016-06-19", "--past", "--future"])
        .assert()
        .failure();
}

// ── duration ────────────────────────────────────────────────────────────────

#[test]
fn test_duration_canonical_value() {
    timex()
        .args(["duration", "P20Y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"P2E\""))
        .stdout(predicate::str::contains("\"DURATION\""));
}

#[test]
fn test_duration_forced_unit() {
    timex()
        .args(["duration", "P20Y", "--force", "year"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"P20Y\""));
}

#[test]
fn test_duration_approximate() {
    timex()
        .args(["duration", "P6M", "--force", "month", "--approx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"PXM\""));
}

#[test]
fn test_duration_unknown_unit() {
    timex()
        .args(["duration", "P6M", "--force", "fortnight"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown unit"));
}
