//! End-to-end tests for the `microtime` binary.

use assert_cmd::Command;
use predicates::prelude::*;

const ANCHOR: &str = "2014-10-09T08:00:00Z";

fn microtime() -> Command {
    let mut cmd = Command::cargo_bin("microtime").unwrap();
    cmd.env_remove("MICROTIME_TZ").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_parse_default_output() {
    microtime()
        .args(["parse", "2014-10-09 09:17:50.34"])
        .assert()
        .success()
        .stdout("2014-10-09T09:17:50.340000+00:00\n");
}

#[test]
fn test_parse_with_pattern() {
    microtime()
        .args(["parse", "2014-10-09 09:17:50.34", "--pattern", "H:i:s.u"])
        .assert()
        .success()
        .stdout("09:17:50.340000\n");
}

#[test]
fn test_format_in_timezone() {
    microtime()
        .args(["--tz", "Europe/Paris", "format", "2014-10-09 09:17:50.5", "Y-m-d H:i:s.v T"])
        .assert()
        .success()
        .stdout("2014-10-09 09:17:50.500 CEST\n");
}

#[test]
fn test_diff_time_only_uses_anchor() {
    microtime()
        .args(["--anchor", ANCHOR, "diff", "10:00:00.4", "12:00:00.399999"])
        .assert()
        .success()
        .stdout("PT1H59M59.999999S\n");
}

#[test]
fn test_diff_inverted_and_absolute() {
    microtime()
        .args(["--anchor", ANCHOR, "diff", "12:00:00.4", "12:00:00.2"])
        .assert()
        .success()
        .stdout("-PT0.2S\n");

    microtime()
        .args(["--anchor", ANCHOR, "diff", "--absolute", "12:00:00.4", "12:00:00.2"])
        .assert()
        .success()
        .stdout("PT0.2S\n");
}

#[test]
fn test_diff_pattern() {
    microtime()
        .args([
            "diff",
            "2014-10-10 10:00:00.4",
            "2014-10-11 10:00:00.399999",
            "--pattern",
            "%a days %H:%I:%S.%U",
        ])
        .assert()
        .success()
        .stdout("0 days 23:59:59.999999\n");
}

#[test]
fn test_add_and_sub() {
    microtime()
        .args(["add", "2014-10-09 23:59:59.75", "PT0.25S", "--pattern", "Y-m-d H:i:s.u"])
        .assert()
        .success()
        .stdout("2014-10-10 00:00:00.000000\n");

    microtime()
        .args(["sub", "2014-10-10 00:00:00", "PT0.000001S", "--pattern", "Y-m-d H:i:s.u"])
        .assert()
        .success()
        .stdout("2014-10-09 23:59:59.999999\n");
}

#[test]
fn test_add_out_of_range_fails() {
    microtime()
        .args(["add", "2014-10-09 00:00:00", "P999999Y"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot add 'P999999Y'"))
        .stderr(predicate::str::contains("Out of range"));
}

#[test]
fn test_parse_with_input_format() {
    microtime()
        .args([
            "--tz",
            "Europe/Paris",
            "--input-format",
            "%d/%m/%Y %H:%M:%S%.f",
            "parse",
            "09/10/2014 09:17:50.34",
        ])
        .assert()
        .success()
        .stdout("2014-10-09T09:17:50.340000+02:00\n");
}

#[test]
fn test_input_format_mismatch_fails() {
    microtime()
        .args(["--input-format", "%Y-%m-%d", "parse", "09/10/2014"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not match"));
}

#[test]
fn test_modify_previous_microsecond() {
    microtime()
        .args([
            "modify",
            "2014-10-09 09:17:50.34",
            "+1 day previous microsecond",
            "--pattern",
            "Y-m-d H:i:s.u",
        ])
        .assert()
        .success()
        .stdout("2014-10-10 09:17:50.339999\n");
}

#[test]
fn test_modify_reset_keyword() {
    microtime()
        .args([
            "modify",
            "2014-10-09 09:17:50.5",
            "-3 microseconds tomorrow next microsecond",
            "--pattern",
            "Y-m-d H:i:s.u",
        ])
        .assert()
        .success()
        .stdout("2014-10-09 23:59:59.999998\n");
}

#[test]
fn test_modify_rejects_unknown_text() {
    microtime()
        .args(["modify", "2014-10-09 09:17:50", "5 microseconds sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot apply"));
}

#[test]
fn test_interval_pattern() {
    microtime()
        .args(["interval", "PT59.9S", "--pattern", "%s.%U"])
        .assert()
        .success()
        .stdout("59.900000\n");
}

#[test]
fn test_interval_normalizes() {
    microtime()
        .args(["interval", "P1DT0.999999000S"])
        .assert()
        .success()
        .stdout("P1DT0.999999S\n");
}

#[test]
fn test_interval_json() {
    let output = microtime()
        .args(["--json", "interval", "PT1.5S"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["spec"], "PT1.5S");
    assert_eq!(json["seconds"], 1);
    assert_eq!(json["microseconds"], 500_000);
    assert_eq!(json["invert"], false);
    assert!(json.get("formatted").is_none());
}

#[test]
fn test_parse_json() {
    let output = microtime()
        .args(["--json", "--tz", "Europe/Paris", "parse", "2014-10-09 09:17:50.25"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["instant"], "2014-10-09T09:17:50.250000+02:00");
    assert_eq!(json["timezone"], "Europe/Paris");
    assert_eq!(json["timestamp"], 1_412_839_070);
    assert_eq!(json["microsecond"], 250_000);
}

#[test]
fn test_bad_spec_fails() {
    microtime()
        .args(["interval", "P1X"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown or bad format"));
}

#[test]
fn test_bad_timezone_fails() {
    microtime()
        .args(["--tz", "Mars/Olympus", "parse", "2014-10-09"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--tz Mars/Olympus"));
}

#[test]
fn test_timezone_from_env() {
    microtime()
        .env("MICROTIME_TZ", "America/New_York")
        .args(["format", "2014-10-09 09:17:50", "e P"])
        .assert()
        .success()
        .stdout("America/New_York -04:00\n");
}

#[test]
fn test_bad_anchor_rejected_by_clap() {
    microtime()
        .args(["--anchor", "yesterday", "parse", "12:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RFC 3339"));
}
