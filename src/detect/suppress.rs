//! Inline suppression of violations via comments.
//!
//! A unit opts out of a rule with a file-level directive:
//! - `// composecheck:ignore-file <rule> - <reason>`
//! - `/* composecheck:ignore-file <rule> - <reason> */`
//!
//! `<rule>` is a rule id (`1.2`), a rule name (`untestable_closure`) or `*`.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{RuleId, Violation};
use crate::extract::lexer;

/// An inline suppression directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Rule to suppress (e.g., "1.2", "tight_coupling") or "*" for all
    pub rule: String,
    /// Human-readable reason
    pub reason: String,
    /// File containing the suppression
    pub file: String,
    /// Line of the directive
    pub line: usize,
}

/// A violation that was suppressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressedViolation {
    pub violation: Violation,
    pub suppression: Suppression,
}

lazy_static::lazy_static! {
    static ref SUPPRESSION_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"//\s*composecheck:ignore-file\s+(\S+)\s*(?:-\s*(.*))?").unwrap(),
        Regex::new(r"/\*\s*composecheck:ignore-file\s+(\S+)\s*(?:-\s*(.*?))?\s*\*/").unwrap(),
    ];
}

/// Parse suppression directives from raw file content.
///
/// Only comments count; a directive inside a string literal is ignored.
pub fn parse_suppressions(file_path: &str, content: &str) -> Vec<Suppression> {
    let mut suppressions = Vec::new();
    let scanned = lexer::strip_strings(content);

    for (line_num, line) in scanned.lines().enumerate() {
        for pattern in SUPPRESSION_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(line) {
                let rule = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                let reason = caps
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default();

                suppressions.push(Suppression {
                    rule: rule.to_string(),
                    reason,
                    file: file_path.to_string(),
                    line: line_num + 1,
                });
                break; // Only one suppression per line
            }
        }
    }

    suppressions
}

/// Check if a violation matches a suppression.
pub fn matches_suppression(violation: &Violation, suppression: &Suppression) -> bool {
    if violation.file != suppression.file {
        return false;
    }

    if suppression.rule == "*" {
        return true;
    }
    RuleId::parse(&suppression.rule) == Some(violation.rule)
}

/// Separate violations into active and suppressed based on suppressions.
pub fn filter_suppressed(
    violations: Vec<Violation>,
    suppressions: &[Suppression],
) -> (Vec<Violation>, Vec<SuppressedViolation>) {
    let mut active = Vec::new();
    let mut suppressed = Vec::new();

    for violation in violations {
        match suppressions
            .iter()
            .find(|s| matches_suppression(&violation, s))
        {
            Some(suppression) => suppressed.push(SuppressedViolation {
                violation,
                suppression: suppression.clone(),
            }),
            None => active.push(violation),
        }
    }

    (active, suppressed)
}
