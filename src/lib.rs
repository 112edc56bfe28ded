//! composecheck - architecture health checks for reducer-based Swift features.
//!
//! composecheck reads features written in the unidirectional
//! state/action/reducer/effect style and reports on their structure:
//! rule violations, a testability score, how features compose each other,
//! and an ordered plan for splitting up the worst offenders.
//!
//! # Architecture
//!
//! Data flows strictly forward:
//!
//! - `corpus`: reads source files; unreadable files are recorded, not fatal
//! - `extract`: lexical fact extraction, one fact-sheet per feature
//! - `detect`: the rule table, inline suppressions and the pipeline runner
//! - `score`: testability score with a deduction trail
//! - `graph`: composition graph, cycles and coupling metrics
//! - `plan`: prioritized extraction candidates
//! - `report`: verdict plus human and JSON output
//! - `config`: YAML configuration and validated settings

pub mod cli;
pub mod config;
pub mod corpus;
pub mod detect;
pub mod error;
pub mod extract;
pub mod graph;
pub mod plan;
pub mod report;
pub mod score;

pub use config::{Config, Settings};
pub use corpus::{Corpus, SourceUnit};
pub use detect::{RuleId, RuleSet, Runner, Severity, Violation};
pub use error::{AuditError, ParseSkipped};
pub use extract::{extract, FeatureFact};
pub use graph::CompositionGraph;
pub use plan::{ExtractionCandidate, Priority};
pub use report::Report;
pub use score::TestabilityScore;

/// Analyze an in-memory corpus with the given settings.
pub fn analyze(corpus: &Corpus, settings: &Settings) -> Result<Report, AuditError> {
    Runner::new(settings.clone()).run(".", corpus)
}
