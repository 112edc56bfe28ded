//! Analysis runner that orchestrates the whole pipeline.
//!
//! Extraction, rule evaluation and scoring run per unit on the rayon pool.
//! The composition graph waits until every unit is done; planning and
//! assembly are sequential. Results are ordered by path, never by which
//! thread finished first.

use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{filter_suppressed, parse_suppressions, RuleSet, SuppressedViolation, Violation};
use crate::config::Settings;
use crate::corpus::{Corpus, SourceUnit};
use crate::error::{AuditError, ParseSkipped};
use crate::extract::{self, FeatureFact};
use crate::graph::CompositionGraph;
use crate::plan::{self, UnitAssessment};
use crate::report::{Report, SkippedUnit, UnitReport};
use crate::score::{self, TestabilityScore};

/// Per-unit output of the parallel phase.
struct ScoredUnit {
    fact: FeatureFact,
    violations: Vec<Violation>,
    suppressed: Vec<SuppressedViolation>,
    score: TestabilityScore,
}

/// Executes the analysis pipeline against a corpus.
pub struct Runner {
    settings: Settings,
    rules: RuleSet,
}

impl Runner {
    /// Create a new runner; rule thresholds come from `settings`.
    pub fn new(settings: Settings) -> Self {
        let rules = RuleSet::from_thresholds(&settings.rules);
        Self { settings, rules }
    }

    /// Analyze every unit of `corpus` and assemble the report.
    ///
    /// `root` is echoed into the report as given.
    pub fn run(&self, root: &str, corpus: &Corpus) -> Result<Report, AuditError> {
        let extracted: Vec<(&SourceUnit, Result<FeatureFact, ParseSkipped>)> = corpus
            .units
            .par_iter()
            .map(|unit| (unit, extract::extract(unit)))
            .collect();

        let mut facts = Vec::new();
        let mut skipped = Vec::new();
        for (unit, outcome) in extracted {
            match outcome {
                Ok(fact) => facts.push((unit, fact)),
                Err(skip) => {
                    debug!(path = %unit.path, reason = %skip.reason, "unit skipped");
                    skipped.push(SkippedUnit {
                        path: unit.path.clone(),
                        reason: skip.reason,
                    });
                }
            }
        }
        disambiguate_ids(&mut facts);

        let scored: Vec<ScoredUnit> = facts
            .into_par_iter()
            .map(|(unit, fact)| self.score_unit(unit, fact))
            .collect();

        // Barrier: every fact is known before the graph is built.
        let all_facts: Vec<FeatureFact> = scored.iter().map(|s| s.fact.clone()).collect();
        let graph = CompositionGraph::build(&all_facts)?;

        let assessments: Vec<UnitAssessment> = scored
            .iter()
            .map(|s| UnitAssessment {
                fact: &s.fact,
                violations: &s.violations,
                score: &s.score,
            })
            .collect();
        let plan = plan::plan(
            &assessments,
            &graph,
            &self.rules,
            self.settings.max_effort_cap_hours,
        );

        let units: Vec<UnitReport> = scored
            .into_iter()
            .map(|s| UnitReport::new(&s.fact, s.violations, s.suppressed, s.score))
            .collect();

        let report = Report::assemble(
            root,
            &self.settings,
            units,
            skipped,
            corpus.failures.clone(),
            graph.summary(),
            plan,
        );
        info!(
            analyzed = report.summary.analyzed,
            skipped = report.summary.skipped,
            errors = report.summary.errors,
            violations = report.summary.violations,
            passed = report.passed(),
            "analysis complete"
        );
        Ok(report)
    }

    fn score_unit(&self, unit: &SourceUnit, fact: FeatureFact) -> ScoredUnit {
        let violations = self.rules.evaluate(&fact);
        let suppressions = parse_suppressions(&unit.path, &unit.text);
        let (violations, suppressed) = if suppressions.is_empty() {
            (violations, Vec::new())
        } else {
            filter_suppressed(violations, &suppressions)
        };
        let score = score::calculate(&fact, self.settings.threshold);
        ScoredUnit {
            fact,
            violations,
            suppressed,
            score,
        }
    }
}

/// Later units (by path) reusing an id become `Id@path`.
fn disambiguate_ids(facts: &mut [(&SourceUnit, FeatureFact)]) {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for (_, fact) in facts.iter_mut() {
        if !seen.insert(fact.id.clone()) {
            let renamed = format!("{}@{}", fact.id, fact.path);
            debug!(id = %fact.id, renamed = %renamed, "duplicate feature id");
            fact.id = renamed.clone();
            seen.insert(renamed);
        }
    }
}
