//! Core types for rule evaluation results.

use serde::{Deserialize, Serialize};

/// Severity levels for violations, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Glyph used by the human report.
    pub fn glyph(&self) -> &'static str {
        match self {
            Severity::Low => "·",
            Severity::Medium => "▲",
            Severity::High => "✖",
            Severity::Critical => "‼",
        }
    }

    /// HIGH and CRITICAL fail a strict run.
    pub fn is_blocking(&self) -> bool {
        *self >= Severity::High
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Identifiers of the architecture rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleId {
    #[serde(rename = "1.1")]
    MonolithicFeature,
    #[serde(rename = "1.2")]
    UntestableClosure,
    #[serde(rename = "1.3")]
    DuplicatedHandlers,
    #[serde(rename = "1.4")]
    UnclearOrganization,
    #[serde(rename = "1.5")]
    TightCoupling,
}

impl RuleId {
    pub const ALL: [RuleId; 5] = [
        RuleId::MonolithicFeature,
        RuleId::UntestableClosure,
        RuleId::DuplicatedHandlers,
        RuleId::UnclearOrganization,
        RuleId::TightCoupling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::MonolithicFeature => "1.1",
            RuleId::UntestableClosure => "1.2",
            RuleId::DuplicatedHandlers => "1.3",
            RuleId::UnclearOrganization => "1.4",
            RuleId::TightCoupling => "1.5",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleId::MonolithicFeature => "monolithic_feature",
            RuleId::UntestableClosure => "untestable_closure",
            RuleId::DuplicatedHandlers => "duplicated_handlers",
            RuleId::UnclearOrganization => "unclear_organization",
            RuleId::TightCoupling => "tight_coupling",
        }
    }

    /// Accepts either the numeric id or the rule name.
    pub fn parse(s: &str) -> Option<Self> {
        RuleId::ALL
            .into_iter()
            .find(|rule| rule.as_str() == s || rule.name() == s)
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Estimated remediation effort in hours.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffortRange {
    pub min_hours: f64,
    pub max_hours: f64,
}

impl EffortRange {
    pub const fn new(min_hours: f64, max_hours: f64) -> Self {
        Self {
            min_hours,
            max_hours,
        }
    }

    pub const fn fixed(hours: f64) -> Self {
        Self::new(hours, hours)
    }

    pub fn add(self, other: EffortRange) -> Self {
        Self::new(self.min_hours + other.min_hours, self.max_hours + other.max_hours)
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.min_hours * factor, self.max_hours * factor)
    }

    /// Clamp both ends to `max`.
    pub fn cap(self, max: f64) -> Self {
        Self::new(self.min_hours.min(max), self.max_hours.min(max))
    }
}

impl std::fmt::Display for EffortRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.min_hours == self.max_hours {
            write!(f, "{}h", self.min_hours)
        } else {
            write!(f, "{}-{}h", self.min_hours, self.max_hours)
        }
    }
}

/// A single rule violation for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule: RuleId,
    pub rule_name: String,
    pub severity: Severity,
    pub message: String,
    pub unit: String,
    pub file: String,
    pub effort: EffortRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert!(Severity::High.is_blocking());
        assert!(!Severity::Medium.is_blocking());
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
    }

    #[test]
    fn test_rule_id_parse() {
        assert_eq!(RuleId::parse("1.3"), Some(RuleId::DuplicatedHandlers));
        assert_eq!(RuleId::parse("tight_coupling"), Some(RuleId::TightCoupling));
        assert_eq!(RuleId::parse("1.9"), None);
        assert!(RuleId::MonolithicFeature < RuleId::TightCoupling);
    }

    #[test]
    fn test_rule_id_serializes_as_number() {
        let json = serde_json::to_string(&RuleId::UntestableClosure).unwrap();
        assert_eq!(json, "\"1.2\"");
    }

    #[test]
    fn test_effort_range_arithmetic() {
        let total = EffortRange::new(4.0, 8.0)
            .add(EffortRange::fixed(2.0).scale(3.0))
            .cap(12.0);
        assert_eq!(total, EffortRange::new(10.0, 12.0));
        assert_eq!(EffortRange::new(4.0, 8.0).to_string(), "4-8h");
        assert_eq!(EffortRange::fixed(2.0).to_string(), "2h");
    }
}
