//! Tests for report output formats.
//!
//! JSON output must be stable: the same corpus always renders to the same
//! bytes, with camelCase field names.

use std::path::PathBuf;

use composecheck::cli;
use composecheck::config::Settings;
use composecheck::report::{self, Report};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn run_corpus() -> Report {
    cli::analyze(&testdata_path().join("corpus"), &Settings::default())
        .expect("analysis should succeed")
}

#[test]
fn test_json_is_byte_identical_across_runs() {
    let first = report::render_json(&run_corpus()).unwrap();
    for _ in 0..3 {
        let again = report::render_json(&run_corpus()).unwrap();
        assert_eq!(first, again);
    }
}

#[test]
fn test_json_round_trips() {
    let report = run_corpus();
    let json = report::render_json(&report).unwrap();
    let parsed: Report = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.units.len(), report.units.len());
    assert_eq!(parsed.plan, report.plan);
    assert_eq!(parsed.verdict, report.verdict);
    assert_eq!(parsed.verdict_reasons, report.verdict_reasons);
}

#[test]
fn test_json_field_names() {
    let json = report::render_json(&run_corpus()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    for key in [
        "version",
        "root",
        "settings",
        "units",
        "skipped",
        "errors",
        "graph",
        "plan",
        "summary",
        "verdict",
        "verdictReasons",
    ] {
        assert!(value.get(key).is_some(), "missing top-level key {}", key);
    }

    let unit = &value["units"][0];
    for key in [
        "id",
        "path",
        "counts",
        "childFeatures",
        "violations",
        "score",
        "deductions",
    ] {
        assert!(unit.get(key).is_some(), "missing unit key {}", key);
    }
    assert!(unit["score"].is_u64());
    assert!(unit["deductions"].is_array());

    let candidate = &value["plan"][0];
    assert_eq!(candidate["candidate"], "MonolithFeature");
    assert_eq!(candidate["priority"], "P1");
    assert_eq!(candidate["effortHours"]["minHours"], 10.0);
    assert_eq!(candidate["effortHours"]["maxHours"], 14.0);

    assert_eq!(value["graph"]["medianCoupling"], 0.0);
    assert_eq!(value["summary"]["planCandidates"], 4);
    assert_eq!(value["verdict"], "fail");
    assert_eq!(
        value["verdictReasons"][0],
        "MonolithFeature scored 40 (threshold 75)"
    );
}

#[test]
fn test_json_violation_format() {
    let json = report::render_json(&run_corpus()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let monolith = value["units"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"] == "MonolithFeature")
        .unwrap();
    assert_eq!(monolith["score"], 40);
    assert_eq!(monolith["deductions"][0]["reason"], "closure_effect");
    assert_eq!(monolith["deductions"][0]["points"], 45);

    let violation = &monolith["violations"][1];
    assert_eq!(violation["rule"], "1.2");
    assert_eq!(violation["ruleName"], "untestable_closure");
    assert_eq!(violation["severity"], "CRITICAL");
    assert_eq!(violation["unit"], "MonolithFeature");
    assert_eq!(violation["file"], "Monolith/MonolithFeature.swift");
    assert!(violation["message"]
        .as_str()
        .unwrap()
        .starts_with("3 closure-typed effect properties"));
}

#[test]
fn test_human_output() {
    colored::control::set_override(false);
    let report = run_corpus();
    let mut out = Vec::new();
    report::write_pretty(&mut out, &report, true).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Features (7):"));
    assert!(text.contains("MonolithFeature"));
    assert!(text.contains("Extraction plan (4):"));
    assert!(text.contains("unresolved: AppFeature -> AnalyticsFeature"));
    assert!(text.contains("Skipped (1):"));
    assert!(text.contains("Views/ContentView.swift"));
    assert!(text.contains("Suppressed (1):"));
    assert!(text.contains("naming cleanup tracked separately"));
    assert!(text.contains("FAILED"));
}
