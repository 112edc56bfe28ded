//! Prioritized extraction plan.
//!
//! Every feature with an active violation or a failing score becomes a
//! candidate, and so does every composition edge inside a cycle. Candidates
//! are ordered by priority, then coupling (highest first), then id.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::detect::{EffortRange, RuleId, RuleSet, Severity, Violation};
use crate::extract::FeatureFact;
use crate::graph::CompositionGraph;
use crate::score::TestabilityScore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::P1 => write!(f, "P1"),
            Priority::P2 => write!(f, "P2"),
            Priority::P3 => write!(f, "P3"),
        }
    }
}

/// What a candidate proposes to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    /// Split or restructure one feature
    Feature,
    /// Remove one composition edge to break a cycle
    Edge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionCandidate {
    /// Feature id, or `Parent -> Child` for edges
    pub candidate: String,
    pub kind: CandidateKind,
    pub priority: Priority,
    pub effort_hours: EffortRange,
    pub coupling: usize,
    pub justification: Vec<String>,
}

/// Everything the planner needs to know about one scored feature.
#[derive(Debug, Clone, Copy)]
pub struct UnitAssessment<'a> {
    pub fact: &'a FeatureFact,
    /// Active (unsuppressed) violations
    pub violations: &'a [Violation],
    pub score: &'a TestabilityScore,
}

/// Build the ordered plan.
pub fn plan(
    units: &[UnitAssessment<'_>],
    graph: &CompositionGraph,
    rules: &RuleSet,
    max_effort_cap_hours: f64,
) -> Vec<ExtractionCandidate> {
    let median = graph.median_coupling();
    let mut candidates: Vec<ExtractionCandidate> = units
        .iter()
        .filter_map(|unit| feature_candidate(unit, graph, rules, median, max_effort_cap_hours))
        .collect();

    let cycle_effort = |fact: Option<&FeatureFact>| match fact {
        Some(f) => rules.effort_for(RuleId::TightCoupling, f),
        None => EffortRange::default(),
    };
    for edge in graph.cyclic_edges() {
        let parent = units.iter().map(|u| u.fact).find(|f| f.id == edge.from);
        candidates.push(ExtractionCandidate {
            candidate: format!("{} -> {}", edge.from, edge.to),
            kind: CandidateKind::Edge,
            priority: Priority::P2,
            effort_hours: cycle_effort(parent).cap(max_effort_cap_hours),
            coupling: graph.coupling(&edge.from),
            justification: vec![format!(
                "composition cycle: {} composes {}, which leads back to {}",
                edge.from, edge.to, edge.from
            )],
        });
    }

    candidates.sort_by(compare_candidates);
    candidates
}

fn compare_candidates(a: &ExtractionCandidate, b: &ExtractionCandidate) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| b.coupling.cmp(&a.coupling))
        .then_with(|| a.candidate.cmp(&b.candidate))
}

fn feature_candidate(
    unit: &UnitAssessment<'_>,
    graph: &CompositionGraph,
    rules: &RuleSet,
    median: f64,
    cap: f64,
) -> Option<ExtractionCandidate> {
    let failing = !unit.score.passed;
    if unit.violations.is_empty() && !failing {
        return None;
    }

    let id = &unit.fact.id;
    let coupling = graph.coupling(id);
    let has_critical = unit
        .violations
        .iter()
        .any(|v| v.severity == Severity::Critical);
    let structural = unit
        .violations
        .iter()
        .any(|v| matches!(v.rule, RuleId::MonolithicFeature | RuleId::TightCoupling));
    let above_median = coupling as f64 > median;

    let priority = if has_critical || failing {
        Priority::P1
    } else if structural && above_median {
        Priority::P2
    } else {
        Priority::P3
    };

    let mut justification: Vec<String> = unit
        .violations
        .iter()
        .map(|v| format!("[{}] {} {}: {}", v.severity, v.rule, v.rule_name, v.message))
        .collect();
    if failing {
        justification.push(format!(
            "testability score {} is below threshold {}",
            unit.score.score, unit.score.threshold
        ));
    }
    if priority == Priority::P2 {
        justification.push(format!(
            "coupling complexity {} is above the corpus median {}",
            coupling, median
        ));
    }

    let effort = if unit.violations.is_empty() {
        // Failing score with no violation: price the rules behind the deductions.
        let related: BTreeSet<RuleId> = unit
            .score
            .deductions
            .iter()
            .map(|d| d.reason.related_rule())
            .collect();
        related
            .into_iter()
            .map(|rule| rules.effort_for(rule, unit.fact))
            .fold(EffortRange::default(), EffortRange::add)
    } else {
        unit.violations
            .iter()
            .map(|v| v.effort)
            .fold(EffortRange::default(), EffortRange::add)
    };

    Some(ExtractionCandidate {
        candidate: id.clone(),
        kind: CandidateKind::Feature,
        priority,
        effort_hours: effort.cap(cap),
        coupling,
        justification,
    })
}
