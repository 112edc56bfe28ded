//! Testability scoring for composecheck.
//!
//! Every feature starts at 100 and loses points for each structural trait
//! that makes its reducer harder to test. The deduction trail always explains
//! the final number: `100 - sum(points) == score`.

use serde::{Deserialize, Serialize};

use crate::detect::RuleId;
use crate::extract::{Counter, FeatureFact};

/// Point deductions per occurrence.
pub mod points {
    pub const CLOSURE_EFFECT: u32 = 15; // untestable effect
    pub const MISSING_INJECTION: u32 = 5; // closure without a matching dependency
    pub const DUPLICATE_HANDLER: u32 = 3;
    pub const VAGUE_METHOD: u32 = 2;
}

/// Minimum passing score when the configuration doesn't specify one.
pub const DEFAULT_THRESHOLD: u32 = 75;

/// Grade thresholds (lower bounds).
pub mod grades {
    pub const A_MIN: u32 = 90;
    pub const B_MIN: u32 = 75;
    pub const C_MIN: u32 = 60;
    pub const D_MIN: u32 = 40;
}

/// What a deduction was taken for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionReason {
    ClosureEffect,
    MissingInjection,
    DuplicateHandler,
    VagueMethod,
}

impl DeductionReason {
    /// Deductions in the order they are applied.
    pub const ALL: [DeductionReason; 4] = [
        DeductionReason::ClosureEffect,
        DeductionReason::MissingInjection,
        DeductionReason::DuplicateHandler,
        DeductionReason::VagueMethod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeductionReason::ClosureEffect => "closure_effect",
            DeductionReason::MissingInjection => "missing_injection",
            DeductionReason::DuplicateHandler => "duplicate_handler",
            DeductionReason::VagueMethod => "vague_method",
        }
    }

    pub fn per_occurrence(&self) -> u32 {
        match self {
            DeductionReason::ClosureEffect => points::CLOSURE_EFFECT,
            DeductionReason::MissingInjection => points::MISSING_INJECTION,
            DeductionReason::DuplicateHandler => points::DUPLICATE_HANDLER,
            DeductionReason::VagueMethod => points::VAGUE_METHOD,
        }
    }

    /// The rule whose remediation removes this deduction.
    pub fn related_rule(&self) -> RuleId {
        match self {
            DeductionReason::ClosureEffect | DeductionReason::MissingInjection => {
                RuleId::UntestableClosure
            }
            DeductionReason::DuplicateHandler => RuleId::DuplicatedHandlers,
            DeductionReason::VagueMethod => RuleId::UnclearOrganization,
        }
    }

    fn occurrences(&self, fact: &FeatureFact) -> usize {
        match self {
            DeductionReason::ClosureEffect => fact.count(Counter::ClosureEffects),
            DeductionReason::MissingInjection => fact
                .count(Counter::ClosureEffects)
                .saturating_sub(fact.count(Counter::Dependencies)),
            DeductionReason::DuplicateHandler => fact.count(Counter::DuplicateHandlers),
            DeductionReason::VagueMethod => fact.count(Counter::VagueMethods),
        }
    }
}

impl std::fmt::Display for DeductionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of the deduction trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deduction {
    pub reason: DeductionReason,
    pub count: usize,
    pub per_occurrence: u32,
    /// Points before the trail was clamped at zero
    pub raw_points: u32,
    /// Points actually applied
    pub points: u32,
}

/// The calculated testability score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestabilityScore {
    /// Score from 0-100, higher = easier to test
    pub score: u32,
    /// Letter grade: "A" (90-100), "B" (75-89), "C" (60-74), "D" (40-59), "F" (0-39)
    pub grade: String,
    /// Ordered deduction trail
    pub deductions: Vec<Deduction>,
    /// The threshold used
    pub threshold: u32,
    /// Whether the check passed (score >= threshold)
    pub passed: bool,
}

impl TestabilityScore {
    /// Sum of the unclamped deductions.
    pub fn raw_points(&self) -> u32 {
        self.deductions.iter().map(|d| d.raw_points).sum()
    }

    /// Sum of the applied deductions.
    pub fn applied_points(&self) -> u32 {
        self.deductions.iter().map(|d| d.points).sum()
    }
}

/// Determine the letter grade from a score.
fn calculate_grade(score: u32) -> String {
    match score {
        s if s >= grades::A_MIN => "A".to_string(),
        s if s >= grades::B_MIN => "B".to_string(),
        s if s >= grades::C_MIN => "C".to_string(),
        s if s >= grades::D_MIN => "D".to_string(),
        _ => "F".to_string(),
    }
}

/// Score one feature against `threshold`.
pub fn calculate(fact: &FeatureFact, threshold: u32) -> TestabilityScore {
    let mut remaining: u32 = 100;
    let mut deductions = Vec::new();

    for reason in DeductionReason::ALL {
        let count = reason.occurrences(fact);
        if count == 0 {
            continue;
        }
        let per_occurrence = reason.per_occurrence();
        let raw_points = (count as u32).saturating_mul(per_occurrence);
        let points = raw_points.min(remaining);
        remaining -= points;
        deductions.push(Deduction {
            reason,
            count,
            per_occurrence,
            raw_points,
            points,
        });
    }

    TestabilityScore {
        score: remaining,
        grade: calculate_grade(remaining),
        deductions,
        threshold,
        passed: remaining >= threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(closures: usize, dependencies: usize, duplicates: usize, vague: usize) -> FeatureFact {
        let names = |prefix: &str, n: usize| (0..n).map(|i| format!("{}{}", prefix, i)).collect();
        FeatureFact {
            id: "Feature".to_string(),
            path: "Feature.swift".to_string(),
            state_properties: Vec::new(),
            actions: Vec::new(),
            closure_effects: names("closure", closures),
            dependencies: names("dep", dependencies),
            child_features: Vec::new(),
            duplicate_handlers: duplicates,
            vague_methods: names("handle", vague),
        }
    }

    #[test]
    fn test_clean_feature_scores_100() {
        let score = calculate(&fact(0, 2, 0, 0), DEFAULT_THRESHOLD);
        assert_eq!(score.score, 100);
        assert_eq!(score.grade, "A");
        assert!(score.deductions.is_empty());
        assert!(score.passed);
    }

    #[test]
    fn test_deduction_trail() {
        let score = calculate(&fact(1, 0, 2, 3), DEFAULT_THRESHOLD);
        // 15 + 5 + 6 + 6
        assert_eq!(score.score, 68);
        assert_eq!(score.grade, "C");
        assert!(!score.passed);
        let reasons: Vec<_> = score.deductions.iter().map(|d| d.reason).collect();
        assert_eq!(
            reasons,
            vec![
                DeductionReason::ClosureEffect,
                DeductionReason::MissingInjection,
                DeductionReason::DuplicateHandler,
                DeductionReason::VagueMethod
            ]
        );
        assert_eq!(100 - score.applied_points(), score.score);
    }

    #[test]
    fn test_missing_injection_counts_uncovered_closures() {
        let score = calculate(&fact(3, 1, 0, 0), DEFAULT_THRESHOLD);
        let missing = score
            .deductions
            .iter()
            .find(|d| d.reason == DeductionReason::MissingInjection)
            .unwrap();
        assert_eq!(missing.count, 2);
        assert_eq!(missing.points, 10);
        assert_eq!(score.score, 100 - 45 - 10);

        let covered = calculate(&fact(1, 4, 0, 0), DEFAULT_THRESHOLD);
        assert!(covered
            .deductions
            .iter()
            .all(|d| d.reason != DeductionReason::MissingInjection));
    }

    #[test]
    fn test_score_floored_with_exact_trail() {
        let score = calculate(&fact(8, 0, 5, 10), DEFAULT_THRESHOLD);
        assert_eq!(score.score, 0);
        assert_eq!(score.grade, "F");
        assert_eq!(score.applied_points(), 100);
        assert_eq!(score.raw_points(), 120 + 40 + 15 + 20);
        // The closure deduction alone exceeds the budget
        assert_eq!(score.deductions[0].raw_points, 120);
        assert_eq!(score.deductions[0].points, 100);
        assert!(score.deductions[1..].iter().all(|d| d.points == 0));
    }

    #[test]
    fn test_threshold_boundary() {
        // 100 - 15 - 5 - 3 - 2 = 75
        let f = fact(1, 0, 1, 1);
        assert!(calculate(&f, 75).passed);
        assert!(!calculate(&f, 76).passed);
        assert!(calculate(&f, 0).passed);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(calculate_grade(100), "A");
        assert_eq!(calculate_grade(90), "A");
        assert_eq!(calculate_grade(89), "B");
        assert_eq!(calculate_grade(75), "B");
        assert_eq!(calculate_grade(74), "C");
        assert_eq!(calculate_grade(60), "C");
        assert_eq!(calculate_grade(59), "D");
        assert_eq!(calculate_grade(40), "D");
        assert_eq!(calculate_grade(39), "F");
        assert_eq!(calculate_grade(0), "F");
    }

    #[test]
    fn test_related_rules() {
        assert_eq!(
            DeductionReason::MissingInjection.related_rule(),
            RuleId::UntestableClosure
        );
        assert_eq!(
            DeductionReason::VagueMethod.related_rule(),
            RuleId::UnclearOrganization
        );
    }
}
