//! Report assembly and output formatting for composecheck.
//!
//! Supports two output formats:
//! - Human: colored terminal output grouped by feature
//! - JSON: pretty-printed, camelCase, byte-identical across runs on the same corpus

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::config::{RuleThresholds, Settings};
use crate::corpus::IngestionFailure;
use crate::detect::{Severity, SuppressedViolation, Violation};
use crate::extract::{Counter, FeatureFact};
use crate::graph::GraphSummary;
use crate::plan::ExtractionCandidate;
use crate::score::{Deduction, TestabilityScore};

/// Settings that shaped the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSettings {
    pub threshold: u32,
    pub strict: bool,
    pub max_effort_cap_hours: f64,
    pub fail_on_ingestion_error: bool,
    pub rules: RuleThresholds,
}

impl From<&Settings> for ReportSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            threshold: settings.threshold,
            strict: settings.strict,
            max_effort_cap_hours: settings.max_effort_cap_hours,
            fail_on_ingestion_error: settings.fail_on_ingestion_error,
            rules: settings.rules,
        }
    }
}

/// One analyzed feature: its counts, active and suppressed violations, and
/// testability score with the deduction trail behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitReport {
    pub id: String,
    pub path: String,
    pub counts: BTreeMap<Counter, usize>,
    pub dependencies: Vec<String>,
    pub child_features: Vec<String>,
    pub closure_effects: Vec<String>,
    pub vague_methods: Vec<String>,
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<SuppressedViolation>,
    pub score: u32,
    pub grade: String,
    pub passed: bool,
    pub deductions: Vec<Deduction>,
}

impl UnitReport {
    pub fn new(
        fact: &FeatureFact,
        violations: Vec<Violation>,
        suppressed: Vec<SuppressedViolation>,
        score: TestabilityScore,
    ) -> Self {
        Self {
            id: fact.id.clone(),
            path: fact.path.clone(),
            counts: Counter::ALL.iter().map(|c| (*c, fact.count(*c))).collect(),
            dependencies: fact.dependencies.clone(),
            child_features: fact.child_features.clone(),
            closure_effects: fact.closure_effects.clone(),
            vague_methods: fact.vague_methods.clone(),
            violations,
            suppressed,
            score: score.score,
            grade: score.grade,
            passed: score.passed,
            deductions: score.deductions,
        }
    }
}

/// A unit that was read but not recognized as a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedUnit {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Units read plus files that failed to read
    pub files: usize,
    pub analyzed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub violations: usize,
    pub suppressed: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    /// Mean score over analyzed units, one decimal
    pub average_score: Option<f64>,
    pub failing_units: usize,
    pub cycles: usize,
    pub dangling_references: usize,
    pub plan_candidates: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

/// Gate decision plus one reason per failing condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub reasons: Vec<String>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.status == VerdictStatus::Pass
    }
}

/// The full, immutable result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub version: String,
    pub root: String,
    pub settings: ReportSettings,
    pub units: Vec<UnitReport>,
    pub skipped: Vec<SkippedUnit>,
    pub errors: Vec<IngestionFailure>,
    pub graph: GraphSummary,
    pub plan: Vec<ExtractionCandidate>,
    pub summary: Summary,
    pub verdict: VerdictStatus,
    pub verdict_reasons: Vec<String>,
}

impl Report {
    /// Aggregate the pipeline outputs and compute the verdict.
    pub fn assemble(
        root: &str,
        settings: &Settings,
        units: Vec<UnitReport>,
        skipped: Vec<SkippedUnit>,
        errors: Vec<IngestionFailure>,
        graph: GraphSummary,
        plan: Vec<ExtractionCandidate>,
    ) -> Self {
        let summary = summarize(&units, &skipped, &errors, &graph, &plan);
        let Verdict { status, reasons } = verdict(settings, &units, &errors);
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            root: root.to_string(),
            settings: ReportSettings::from(settings),
            units,
            skipped,
            errors,
            graph,
            plan,
            summary,
            verdict: status,
            verdict_reasons: reasons,
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict == VerdictStatus::Pass
    }
}

fn summarize(
    units: &[UnitReport],
    skipped: &[SkippedUnit],
    errors: &[IngestionFailure],
    graph: &GraphSummary,
    plan: &[ExtractionCandidate],
) -> Summary {
    let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
    for v in units.iter().flat_map(|u| &u.violations) {
        *by_severity.entry(v.severity).or_insert(0) += 1;
    }

    let average_score = if units.is_empty() {
        None
    } else {
        let total: u32 = units.iter().map(|u| u.score).sum();
        let mean = total as f64 / units.len() as f64;
        Some((mean * 10.0).round() / 10.0)
    };

    Summary {
        files: units.len() + skipped.len() + errors.len(),
        analyzed: units.len(),
        skipped: skipped.len(),
        errors: errors.len(),
        violations: units.iter().map(|u| u.violations.len()).sum(),
        suppressed: units.iter().map(|u| u.suppressed.len()).sum(),
        by_severity,
        average_score,
        failing_units: units.iter().filter(|u| !u.passed).count(),
        cycles: graph.cycles.len(),
        dangling_references: graph.dangling.len(),
        plan_candidates: plan.len(),
    }
}

/// Decide pass/fail. Every failing condition contributes a reason.
pub fn verdict(
    settings: &Settings,
    units: &[UnitReport],
    errors: &[IngestionFailure],
) -> Verdict {
    let mut reasons = Vec::new();

    if settings.strict {
        let blocking = units
            .iter()
            .flat_map(|u| &u.violations)
            .filter(|v| v.severity.is_blocking())
            .count();
        if blocking > 0 {
            reasons.push(format!(
                "strict mode: {} HIGH or CRITICAL violation{}",
                blocking,
                plural(blocking)
            ));
        }
    }

    for unit in units.iter().filter(|u| !u.passed) {
        reasons.push(format!(
            "{} scored {} (threshold {})",
            unit.id, unit.score, settings.threshold
        ));
    }

    if settings.fail_on_ingestion_error && !errors.is_empty() {
        reasons.push(format!(
            "{} file{} could not be read",
            errors.len(),
            plural(errors.len())
        ));
    }

    let status = if reasons.is_empty() {
        VerdictStatus::Pass
    } else {
        VerdictStatus::Fail
    };
    Verdict { status, reasons }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Render the report as pretty JSON.
pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Write results in JSON format.
pub fn write_json<W: Write>(out: &mut W, report: &Report) -> anyhow::Result<()> {
    let json = render_json(report)?;
    writeln!(out, "{}", json)?;
    Ok(())
}

// =============================================================================
// Human Format
// =============================================================================

/// Write results in human-readable format.
pub fn write_pretty<W: Write>(out: &mut W, report: &Report, show_suppressed: bool) -> io::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "composecheck".cyan().bold(),
        report.version
    )?;
    writeln!(out)?;

    writeln!(out, "  {}{}", "Scanning:  ".dimmed(), report.root)?;
    writeln!(
        out,
        "  {}{}  {}{}",
        "Threshold: ".dimmed(),
        report.settings.threshold,
        "Strict: ".dimmed(),
        if report.settings.strict { "yes" } else { "no" }
    )?;
    writeln!(out)?;

    write_result_summary(out, report)?;
    writeln!(out)?;

    if !report.units.is_empty() {
        write_units(out, &report.units)?;
    }

    write_graph(out, &report.graph)?;

    if !report.plan.is_empty() {
        write_plan(out, &report.plan)?;
        writeln!(out)?;
    }

    if !report.skipped.is_empty() {
        write_skipped(out, &report.skipped)?;
        writeln!(out)?;
    }

    if !report.errors.is_empty() {
        write_errors(out, &report.errors)?;
        writeln!(out)?;
    }

    let suppressed: Vec<&SuppressedViolation> =
        report.units.iter().flat_map(|u| &u.suppressed).collect();
    if !suppressed.is_empty() {
        write_suppressed_summary(out, &suppressed, show_suppressed)?;
        writeln!(out)?;
    }

    write_final_status(out, report)?;
    writeln!(out)
}

fn write_result_summary<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    let s = &report.summary;
    if report.passed() {
        write!(out, "  {}", "✓ PASS".green())?;
    } else {
        write!(out, "  {}", "✗ FAIL".red())?;
    }

    write!(
        out,
        "  {} feature{}  {} violation{}",
        s.analyzed,
        plural(s.analyzed),
        s.violations,
        plural(s.violations)
    )?;
    if let Some(avg) = s.average_score {
        write!(out, "  avg score {:.1}", avg)?;
    }
    if s.suppressed > 0 {
        write!(out, "  {}", format!("({} suppressed)", s.suppressed).dimmed())?;
    }
    writeln!(out)
}

fn write_colored_score<W: Write>(out: &mut W, score: u32) -> io::Result<()> {
    match score {
        s if s >= 90 => write!(out, "{}", s.to_string().green().bold()),
        s if s >= 75 => write!(out, "{}", s.to_string().green()),
        s if s >= 60 => write!(out, "{}", s.to_string().yellow()),
        s if s >= 40 => write!(out, "{}", s.to_string().yellow().bold()),
        s => write!(out, "{}", s.to_string().red()),
    }
}

fn write_colored_grade<W: Write>(out: &mut W, grade: &str) -> io::Result<()> {
    match grade {
        "A" => write!(out, "{}", grade.green().bold()),
        "B" => write!(out, "{}", grade.green()),
        "C" => write!(out, "{}", grade.yellow()),
        "D" => write!(out, "{}", grade.yellow().bold()),
        _ => write!(out, "{}", grade.red()),
    }
}

fn write_units<W: Write>(out: &mut W, units: &[UnitReport]) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Features".bold(), units.len())?;
    writeln!(out)?;

    for unit in units {
        writeln!(out, "    {}  {}", unit.id.bold(), unit.path.blue())?;

        write!(out, "      score ")?;
        write_colored_score(out, unit.score)?;
        write!(out, "/100  grade ")?;
        write_colored_grade(out, &unit.grade)?;
        if !unit.passed {
            write!(out, "  {}", "below threshold".red())?;
        }
        writeln!(out)?;

        for v in &unit.violations {
            write_violation(out, v)?;
        }

        for d in &unit.deductions {
            let clamped = if d.points < d.raw_points {
                format!(" (of {})", d.raw_points)
            } else {
                String::new()
            };
            writeln!(
                out,
                "      {}",
                format!(
                    "-{:<3} {} x{} @ {}{}",
                    d.points, d.reason, d.count, d.per_occurrence, clamped
                )
                .dimmed()
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_violation<W: Write>(out: &mut W, v: &Violation) -> io::Result<()> {
    write_severity_tag(out, &v.severity)?;
    write!(out, " {:<4}", v.rule.as_str())?;
    write!(out, "{:<22}", v.rule_name.dimmed())?;
    writeln!(out, "{}  {}", v.message, format!("[{}]", v.effort).dimmed())
}

fn write_severity_tag<W: Write>(out: &mut W, severity: &Severity) -> io::Result<()> {
    let tag = format!("{} {:<8}", severity.glyph(), severity.as_str());
    match severity {
        Severity::Critical => write!(out, "      {}", tag.red().bold()),
        Severity::High => write!(out, "      {}", tag.red()),
        Severity::Medium => write!(out, "      {}", tag.yellow()),
        Severity::Low => write!(out, "      {}", tag.blue()),
    }
}

fn write_graph<W: Write>(out: &mut W, graph: &GraphSummary) -> io::Result<()> {
    writeln!(
        out,
        "  {}  {} nodes  {} edges  median coupling {}",
        "Composition:".bold(),
        graph.nodes.len(),
        graph.edges.len(),
        graph.median_coupling
    )?;

    for cycle in &graph.cycles {
        let mut path = cycle.clone();
        if let Some(first) = cycle.first() {
            path.push(first.clone());
        }
        writeln!(out, "    {} {}", "cycle:".red(), path.join(" -> "))?;
    }
    for d in &graph.dangling {
        writeln!(
            out,
            "    {}",
            format!("unresolved: {} -> {}", d.from, d.to).dimmed()
        )?;
    }
    writeln!(out)
}

fn write_plan<W: Write>(out: &mut W, plan: &[ExtractionCandidate]) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Extraction plan".bold(), plan.len())?;
    for c in plan {
        let priority = c.priority.to_string();
        let tag = match c.priority {
            crate::plan::Priority::P1 => priority.red().bold(),
            crate::plan::Priority::P2 => priority.yellow(),
            crate::plan::Priority::P3 => priority.normal(),
        };
        writeln!(
            out,
            "    {}  {:<32} {:>8}  coupling {}",
            tag,
            c.candidate,
            c.effort_hours.to_string(),
            c.coupling
        )?;
        for j in &c.justification {
            writeln!(out, "          {}", j.dimmed())?;
        }
    }
    Ok(())
}

fn write_skipped<W: Write>(out: &mut W, skipped: &[SkippedUnit]) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Skipped".dimmed(), skipped.len())?;
    for s in skipped {
        writeln!(out, "    {}  {}", s.path.blue(), s.reason.dimmed())?;
    }
    Ok(())
}

fn write_errors<W: Write>(out: &mut W, errors: &[IngestionFailure]) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Errors".red(), errors.len())?;
    for e in errors {
        writeln!(out, "    {}  {}", e.path.blue(), e.message)?;
    }
    Ok(())
}

fn write_suppressed_summary<W: Write>(
    out: &mut W,
    suppressed: &[&SuppressedViolation],
    show_details: bool,
) -> io::Result<()> {
    writeln!(out, "  {} ({}):", "Suppressed".dimmed(), suppressed.len())?;

    if !show_details {
        writeln!(out, "    {}", "(use --show-suppressed to see details)".dimmed())?;
        return Ok(());
    }

    for sv in suppressed {
        let v = &sv.violation;
        let s = &sv.suppression;
        write!(out, "    {:<4}{:<22}", v.rule.as_str(), v.rule_name.dimmed())?;
        writeln!(
            out,
            "{}{}",
            v.file.blue(),
            format!(":{}", s.line).dimmed()
        )?;
        if !s.reason.is_empty() {
            writeln!(out, "        {}", format!("reason: {:?}", s.reason).dimmed())?;
        }
    }
    Ok(())
}

fn write_final_status<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    for reason in &report.verdict_reasons {
        writeln!(out, "  {} {}", "•".red(), reason)?;
    }
    write!(
        out,
        "  {}  ",
        format!("Threshold: {}", report.settings.threshold).dimmed()
    )?;
    if report.passed() {
        writeln!(out, "{}", "PASSED".green())
    } else {
        writeln!(out, "{}", "FAILED".red())
    }
}
