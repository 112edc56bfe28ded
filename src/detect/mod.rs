//! Rule evaluation for feature facts.

mod rules;
mod runner;
mod suppress;
mod types;

pub use rules::{
    Clause, Comparison, EffortPolicy, RuleSet, RuleSpec, SeverityPolicy, DEFAULT_RULES,
};
pub use runner::Runner;
pub use suppress::{
    filter_suppressed, matches_suppression, parse_suppressions, SuppressedViolation, Suppression,
};
pub use types::{EffortRange, RuleId, Severity, Violation};
