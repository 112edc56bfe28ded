//! The architecture rules as data.
//!
//! Each rule is a [`RuleSpec`]: OR-combined clauses over fact counters, a
//! severity policy, an effort policy and a message template. [`RuleSet`]
//! evaluates any table of specs the same way; the result never depends on
//! table order.

use once_cell::sync::Lazy;

use super::types::{EffortRange, RuleId, Severity, Violation};
use crate::config::RuleThresholds;
use crate::extract::{Counter, FeatureFact};

/// Rules built from the default thresholds.
pub static DEFAULT_RULES: Lazy<RuleSet> =
    Lazy::new(|| RuleSet::from_thresholds(&RuleThresholds::default()));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    GreaterThan,
    AtLeast,
}

/// `counter <comparison> threshold`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clause {
    pub counter: Counter,
    pub comparison: Comparison,
    pub threshold: usize,
}

impl Clause {
    pub fn greater_than(counter: Counter, threshold: u32) -> Self {
        Self {
            counter,
            comparison: Comparison::GreaterThan,
            threshold: threshold as usize,
        }
    }

    pub fn at_least(counter: Counter, threshold: u32) -> Self {
        Self {
            counter,
            comparison: Comparison::AtLeast,
            threshold: threshold as usize,
        }
    }

    pub fn holds(&self, fact: &FeatureFact) -> bool {
        let value = fact.count(self.counter);
        match self.comparison {
            Comparison::GreaterThan => value > self.threshold,
            Comparison::AtLeast => value >= self.threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityPolicy {
    Fixed(Severity),
    /// CRITICAL when the unit injects no dependencies at all, HIGH otherwise.
    CriticalWithoutInjection,
}

impl SeverityPolicy {
    fn severity(&self, fact: &FeatureFact) -> Severity {
        match self {
            SeverityPolicy::Fixed(severity) => *severity,
            SeverityPolicy::CriticalWithoutInjection => {
                if fact.dependencies.is_empty() {
                    Severity::Critical
                } else {
                    Severity::High
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffortPolicy {
    Range(EffortRange),
    /// `hours` for each occurrence of `counter` (at least one).
    PerOccurrence { counter: Counter, hours: f64 },
}

impl EffortPolicy {
    fn effort(&self, fact: &FeatureFact) -> EffortRange {
        match self {
            EffortPolicy::Range(range) => *range,
            EffortPolicy::PerOccurrence { counter, hours } => {
                let occurrences = fact.count(*counter).max(1);
                EffortRange::fixed(*hours).scale(occurrences as f64)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleSpec {
    pub id: RuleId,
    pub clauses: Vec<Clause>,
    pub severity: SeverityPolicy,
    pub effort: EffortPolicy,
    /// `{counter_name}` placeholders are replaced with the fact's counts.
    pub message: &'static str,
}

impl RuleSpec {
    pub fn matches(&self, fact: &FeatureFact) -> bool {
        self.clauses.iter().any(|clause| clause.holds(fact))
    }

    fn violation(&self, fact: &FeatureFact) -> Violation {
        Violation {
            rule: self.id,
            rule_name: self.id.name().to_string(),
            severity: self.severity.severity(fact),
            message: render_message(self.message, fact),
            unit: fact.id.clone(),
            file: fact.path.clone(),
            effort: self.effort.effort(fact),
        }
    }
}

fn render_message(template: &str, fact: &FeatureFact) -> String {
    Counter::ALL.iter().fold(template.to_string(), |message, counter| {
        message.replace(
            &format!("{{{}}}", counter.as_str()),
            &fact.count(*counter).to_string(),
        )
    })
}

/// An evaluable table of rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<RuleSpec>,
}

impl RuleSet {
    pub fn new(rules: Vec<RuleSpec>) -> Self {
        Self { rules }
    }

    /// The five architecture rules with the given thresholds.
    pub fn from_thresholds(t: &RuleThresholds) -> Self {
        Self::new(vec![
            RuleSpec {
                id: RuleId::MonolithicFeature,
                clauses: vec![
                    Clause::greater_than(Counter::StateProperties, t.max_state_properties),
                    Clause::greater_than(Counter::Actions, t.max_actions),
                ],
                severity: SeverityPolicy::Fixed(Severity::High),
                effort: EffortPolicy::Range(EffortRange::new(4.0, 8.0)),
                message: "monolithic feature: {state_properties} state properties and {actions} actions",
            },
            RuleSpec {
                id: RuleId::UntestableClosure,
                clauses: vec![Clause::greater_than(Counter::ClosureEffects, 0)],
                severity: SeverityPolicy::CriticalWithoutInjection,
                effort: EffortPolicy::PerOccurrence {
                    counter: Counter::ClosureEffects,
                    hours: 2.0,
                },
                message: "{closure_effects} closure-typed effect properties bypass dependency injection ({dependencies} dependencies injected)",
            },
            RuleSpec {
                id: RuleId::DuplicatedHandlers,
                clauses: vec![Clause::at_least(
                    Counter::DuplicateHandlers,
                    t.min_duplicate_handlers,
                )],
                severity: SeverityPolicy::Fixed(Severity::Medium),
                effort: EffortPolicy::Range(EffortRange::fixed(1.0)),
                message: "{duplicate_handlers} action handlers repeat another handler's body",
            },
            RuleSpec {
                id: RuleId::UnclearOrganization,
                clauses: vec![Clause::at_least(Counter::VagueMethods, t.min_vague_methods)],
                severity: SeverityPolicy::Fixed(Severity::Medium),
                effort: EffortPolicy::Range(EffortRange::new(4.0, 8.0)),
                message: "{vague_methods} methods have vague names",
            },
            RuleSpec {
                id: RuleId::TightCoupling,
                clauses: vec![Clause::at_least(Counter::ChildFeatures, t.min_child_features)],
                severity: SeverityPolicy::Fixed(Severity::Medium),
                effort: EffortPolicy::Range(EffortRange::new(6.0, 12.0)),
                message: "feature composes {child_features} child features",
            },
        ])
    }

    pub fn rules(&self) -> &[RuleSpec] {
        &self.rules
    }

    /// Every matching rule for `fact`, at most one violation per rule, sorted by rule id.
    pub fn evaluate(&self, fact: &FeatureFact) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .rules
            .iter()
            .filter(|rule| rule.matches(fact))
            .map(|rule| rule.violation(fact))
            .collect();
        violations.sort_by(|a, b| a.rule.cmp(&b.rule));
        violations.dedup_by(|a, b| a.rule == b.rule);
        violations
    }

    /// Effort of `rule` for `fact`, whether or not it fired.
    pub fn effort_for(&self, rule: RuleId, fact: &FeatureFact) -> EffortRange {
        self.rules
            .iter()
            .find(|spec| spec.id == rule)
            .map(|spec| spec.effort.effort(fact))
            .unwrap_or_default()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(f: impl FnOnce(&mut FeatureFact)) -> FeatureFact {
        let mut fact = FeatureFact {
            id: "Feature".to_string(),
            path: "Feature.swift".to_string(),
            state_properties: Vec::new(),
            actions: Vec::new(),
            closure_effects: Vec::new(),
            dependencies: Vec::new(),
            child_features: Vec::new(),
            duplicate_handlers: 0,
            vague_methods: Vec::new(),
        };
        f(&mut fact);
        fact
    }

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    fn rule_ids(violations: &[Violation]) -> Vec<RuleId> {
        violations.iter().map(|v| v.rule).collect()
    }

    #[test]
    fn test_clean_fact_has_no_violations() {
        let clean = fact(|f| {
            f.state_properties = names("p", 3);
            f.actions = names("a", 4);
        });
        assert!(DEFAULT_RULES.evaluate(&clean).is_empty());
    }

    #[test]
    fn test_monolithic_boundary_is_exact() {
        let at_limit = fact(|f| f.state_properties = names("p", 15));
        assert!(DEFAULT_RULES.evaluate(&at_limit).is_empty());

        let over = fact(|f| f.state_properties = names("p", 16));
        let violations = DEFAULT_RULES.evaluate(&over);
        assert_eq!(rule_ids(&violations), vec![RuleId::MonolithicFeature]);
        assert_eq!(violations[0].severity, Severity::High);
        assert_eq!(violations[0].effort, EffortRange::new(4.0, 8.0));

        let actions = fact(|f| f.actions = names("a", 41));
        assert_eq!(
            rule_ids(&DEFAULT_RULES.evaluate(&actions)),
            vec![RuleId::MonolithicFeature]
        );
        let actions_at_limit = fact(|f| f.actions = names("a", 40));
        assert!(DEFAULT_RULES.evaluate(&actions_at_limit).is_empty());
    }

    #[test]
    fn test_monolithic_fires_once_when_both_clauses_hold() {
        let both = fact(|f| {
            f.state_properties = names("p", 20);
            f.actions = names("a", 42);
        });
        let violations = DEFAULT_RULES.evaluate(&both);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "monolithic feature: 20 state properties and 42 actions"
        );
    }

    #[test]
    fn test_closure_severity_depends_on_injection() {
        let bare = fact(|f| f.closure_effects = names("c", 3));
        let violations = DEFAULT_RULES.evaluate(&bare);
        assert_eq!(violations[0].severity, Severity::Critical);
        assert_eq!(violations[0].effort, EffortRange::fixed(6.0));

        let injected = fact(|f| {
            f.closure_effects = names("c", 1);
            f.dependencies = vec!["apiClient".to_string()];
        });
        assert_eq!(DEFAULT_RULES.evaluate(&injected)[0].severity, Severity::High);
    }

    #[test]
    fn test_at_least_rules() {
        let f = fact(|f| {
            f.duplicate_handlers = 2;
            f.vague_methods = names("handle", 5);
            f.child_features = names("Child", 5);
        });
        assert_eq!(
            rule_ids(&DEFAULT_RULES.evaluate(&f)),
            vec![
                RuleId::DuplicatedHandlers,
                RuleId::UnclearOrganization,
                RuleId::TightCoupling
            ]
        );

        let below = fact(|f| {
            f.duplicate_handlers = 1;
            f.vague_methods = names("handle", 4);
            f.child_features = names("Child", 4);
        });
        assert!(DEFAULT_RULES.evaluate(&below).is_empty());
    }

    #[test]
    fn test_evaluation_is_independent_of_table_order() {
        let f = fact(|f| {
            f.state_properties = names("p", 20);
            f.closure_effects = names("c", 2);
            f.duplicate_handlers = 3;
            f.child_features = names("Child", 6);
        });
        let forward = DEFAULT_RULES.evaluate(&f);

        let mut reversed_rules = DEFAULT_RULES.rules().to_vec();
        reversed_rules.reverse();
        let reversed = RuleSet::new(reversed_rules).evaluate(&f);

        assert_eq!(forward, reversed);
        assert_eq!(
            rule_ids(&forward),
            vec![
                RuleId::MonolithicFeature,
                RuleId::UntestableClosure,
                RuleId::DuplicatedHandlers,
                RuleId::TightCoupling
            ]
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = RuleThresholds {
            max_state_properties: 2,
            ..Default::default()
        };
        let rules = RuleSet::from_thresholds(&thresholds);
        let f = fact(|f| f.state_properties = names("p", 3));
        assert_eq!(rule_ids(&rules.evaluate(&f)), vec![RuleId::MonolithicFeature]);
    }

    #[test]
    fn test_effort_for_rule_that_did_not_fire() {
        let f = fact(|f| f.vague_methods = names("handle", 1));
        assert_eq!(
            DEFAULT_RULES.effort_for(RuleId::UnclearOrganization, &f),
            EffortRange::new(4.0, 8.0)
        );
        assert_eq!(
            DEFAULT_RULES.effort_for(RuleId::UntestableClosure, &f),
            EffortRange::fixed(2.0)
        );
    }
}
