//! Integration tests for the full analysis pipeline.
//!
//! These tests run the engine against the Swift fixtures in testdata/ and
//! against generated corpora in temporary directories.

use std::path::{Path, PathBuf};

use composecheck::cli;
use composecheck::config::{Config, Settings};
use composecheck::detect::{RuleId, Severity};
use composecheck::plan::{CandidateKind, Priority};
use composecheck::report::Report;
use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn analyze(path: &Path, settings: &Settings) -> Report {
    cli::analyze(path, settings).expect("analysis should succeed")
}

fn run_corpus() -> Report {
    analyze(&testdata_path().join("corpus"), &Settings::default())
}

fn unit<'a>(report: &'a Report, id: &str) -> &'a composecheck::report::UnitReport {
    report
        .units
        .iter()
        .find(|u| u.id == id)
        .unwrap_or_else(|| panic!("unit {} should be analyzed", id))
}

fn rules(report: &Report, id: &str) -> Vec<RuleId> {
    unit(report, id).violations.iter().map(|v| v.rule).collect()
}

fn minimal_feature(name: &str) -> String {
    format!(
        "import ComposableArchitecture\n\n@Reducer\nstruct {name} {{\n  struct State: Equatable {{\n    var count = 0\n  }}\n  enum Action {{\n    case tapped\n  }}\n  var body: some ReducerOf<Self> {{\n    Reduce {{ state, _ in\n      state.count += 1\n      return .none\n    }}\n  }}\n}}\n"
    )
}

#[test]
fn test_corpus_units_and_skips() {
    let report = run_corpus();

    let ids: Vec<_> = report.units.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "AppFeature",
            "HomeFeature",
            "RowFeature",
            "MonolithFeature",
            "ProfileFeature",
            "SearchFeature",
            "SettingsFeature"
        ]
    );

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "Views/ContentView.swift");
    assert_eq!(report.skipped[0].reason, "no state or action declaration");
    assert!(report.errors.is_empty());

    // Test targets are excluded by default
    assert!(report.units.iter().all(|u| !u.path.starts_with("AppTests/")));
}

#[test]
fn test_monolith_scenario() {
    let report = run_corpus();
    let monolith = unit(&report, "MonolithFeature");

    assert_eq!(monolith.path, "Monolith/MonolithFeature.swift");
    assert_eq!(monolith.counts[&composecheck::extract::Counter::StateProperties], 20);
    assert_eq!(monolith.counts[&composecheck::extract::Counter::Actions], 42);
    assert_eq!(
        monolith.closure_effects,
        vec!["fetchOrders", "trackEvent", "onLogout"]
    );

    let severities: Vec<_> = monolith.violations.iter().map(|v| v.severity).collect();
    assert_eq!(
        rules(&report, "MonolithFeature"),
        vec![RuleId::MonolithicFeature, RuleId::UntestableClosure]
    );
    assert_eq!(severities, vec![Severity::High, Severity::Critical]);

    // 100 - 3 * 15 - 3 * 5
    assert_eq!(monolith.score, 40);
    assert!(!monolith.passed);
    assert_eq!(monolith.grade, "D");

    let first = &report.plan[0];
    assert_eq!(first.candidate, "MonolithFeature");
    assert_eq!(first.priority, Priority::P1);
    assert_eq!(first.effort_hours.min_hours, 10.0);
    assert_eq!(first.effort_hours.max_hours, 14.0);

    assert!(!report.passed());
    assert!(report
        .verdict_reasons
        .contains(&"MonolithFeature scored 40 (threshold 75)".to_string()));
}

#[test]
fn test_corpus_rules() {
    let report = run_corpus();

    assert_eq!(rules(&report, "AppFeature"), vec![RuleId::TightCoupling]);
    assert_eq!(rules(&report, "ProfileFeature"), vec![RuleId::UntestableClosure]);
    assert_eq!(
        unit(&report, "ProfileFeature").violations[0].severity,
        Severity::High
    );
    assert_eq!(unit(&report, "ProfileFeature").score, 85);
    assert!(rules(&report, "HomeFeature").is_empty());
    assert!(rules(&report, "RowFeature").is_empty());
    assert!(rules(&report, "SettingsFeature").is_empty());

    // Unclear organization is suppressed inline
    let search = unit(&report, "SearchFeature");
    assert_eq!(rules(&report, "SearchFeature"), vec![RuleId::DuplicatedHandlers]);
    assert_eq!(search.suppressed.len(), 1);
    assert_eq!(
        search.suppressed[0].violation.rule,
        RuleId::UnclearOrganization
    );
    assert_eq!(search.score, 84);
}

#[test]
fn test_corpus_graph() {
    let report = run_corpus();
    let graph = &report.graph;

    assert_eq!(graph.nodes.len(), 7);
    assert_eq!(graph.edges.len(), 5);
    assert!(graph.cycles.is_empty());
    assert_eq!(graph.dangling.len(), 1);
    assert_eq!(graph.dangling[0].from, "AppFeature");
    assert_eq!(graph.dangling[0].to, "AnalyticsFeature");

    let app = &graph.nodes["AppFeature"];
    assert_eq!(app.fan_out, 4);
    assert_eq!(app.subtree_size, 5);
    assert_eq!(app.coupling, 9);
    assert_eq!(graph.nodes["RowFeature"].fan_in, 1);
    assert_eq!(graph.median_coupling, 0.0);
}

#[test]
fn test_corpus_plan_order() {
    let report = run_corpus();
    let plan: Vec<_> = report
        .plan
        .iter()
        .map(|c| (c.candidate.as_str(), c.priority))
        .collect();
    assert_eq!(
        plan,
        vec![
            ("MonolithFeature", Priority::P1),
            ("AppFeature", Priority::P2),
            ("ProfileFeature", Priority::P3),
            ("SearchFeature", Priority::P3)
        ]
    );
}

#[test]
fn test_corpus_summary() {
    let report = run_corpus();
    let s = &report.summary;
    assert_eq!(s.files, 8);
    assert_eq!(s.analyzed, 7);
    assert_eq!(s.skipped, 1);
    assert_eq!(s.violations, 5);
    assert_eq!(s.suppressed, 1);
    assert_eq!(s.by_severity.get(&Severity::Critical), Some(&1));
    assert_eq!(s.by_severity.get(&Severity::High), Some(&2));
    assert_eq!(s.by_severity.get(&Severity::Medium), Some(&2));
    assert_eq!(s.average_score, Some(87.0));
    assert_eq!(s.failing_units, 1);
    assert_eq!(s.dangling_references, 1);
}

#[test]
fn test_threshold_and_strict_change_verdict() {
    let lenient = Config {
        threshold: Some(40),
        ..Default::default()
    }
    .resolve()
    .unwrap();
    let report = analyze(&testdata_path().join("corpus"), &lenient);
    assert!(report.passed());
    assert_eq!(cli::exit_code(&report), cli::EXIT_SUCCESS);

    let strict = Config {
        threshold: Some(40),
        strict: Some(true),
        ..Default::default()
    }
    .resolve()
    .unwrap();
    let report = analyze(&testdata_path().join("corpus"), &strict);
    assert!(!report.passed());
    assert_eq!(cli::exit_code(&report), cli::EXIT_FAILED);
}

#[test]
fn test_cycle_is_flagged() {
    let report = analyze(&testdata_path().join("cycle"), &Settings::default());

    assert_eq!(
        report.graph.cycles,
        vec![vec!["ChildFeature".to_string(), "ParentFeature".to_string()]]
    );
    assert!(report.graph.edges.iter().all(|e| e.cyclic));
    assert!(report.graph.nodes["ParentFeature"].in_cycle);
    assert!(report.graph.nodes["ChildFeature"].in_cycle);

    let candidates: Vec<_> = report.plan.iter().map(|c| c.candidate.as_str()).collect();
    assert_eq!(
        candidates,
        vec!["ChildFeature -> ParentFeature", "ParentFeature -> ChildFeature"]
    );
    assert!(report
        .plan
        .iter()
        .all(|c| c.kind == CandidateKind::Edge && c.priority == Priority::P2));
    assert!(report.passed());
}

#[test]
fn test_single_file_analysis() {
    let file = testdata_path().join("corpus/Home/RowFeature.swift");
    let report = analyze(&file, &Settings::default());
    assert_eq!(report.units.len(), 1);
    assert_eq!(report.units[0].path, "RowFeature.swift");
    assert!(report.passed());
}

#[test]
fn test_empty_corpus() {
    let temp = TempDir::new().unwrap();
    let report = analyze(temp.path(), &Settings::default());

    assert!(report.units.is_empty());
    assert!(report.skipped.is_empty());
    assert!(report.errors.is_empty());
    assert!(report.plan.is_empty());
    assert_eq!(report.summary.files, 0);
    assert_eq!(report.summary.average_score, None);
    assert_eq!(report.graph.median_coupling, 0.0);
    assert!(report.passed());
}

#[test]
fn test_unreadable_file_with_nine_valid() {
    let temp = TempDir::new().unwrap();
    for i in 0..9 {
        let name = format!("Feature{}", i);
        std::fs::write(
            temp.path().join(format!("{}.swift", name)),
            minimal_feature(&name),
        )
        .unwrap();
    }
    std::fs::write(temp.path().join("Broken.swift"), [0xff, 0xfe, 0xfd, 0x00]).unwrap();

    let report = analyze(temp.path(), &Settings::default());
    assert_eq!(report.units.len(), 9);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, "Broken.swift");
    assert!(report.passed());

    let settings = Config {
        fail_on_ingestion_error: Some(true),
        ..Default::default()
    }
    .resolve()
    .unwrap();
    let report = analyze(temp.path(), &settings);
    assert_eq!(report.units.len(), 9);
    assert!(!report.passed());
    assert_eq!(
        report.verdict_reasons,
        vec!["1 file could not be read".to_string()]
    );
}

#[test]
fn test_custom_rule_thresholds() {
    let settings = Config::parse_str("rules:\n  min_child_features: 6\n")
        .unwrap()
        .resolve()
        .unwrap();
    let report = analyze(&testdata_path().join("corpus"), &settings);
    assert!(rules(&report, "AppFeature").is_empty());
}
