//! Configuration schema for composecheck.
//!
//! A configuration file is optional YAML. Every field may be omitted; omitted
//! fields take the defaults below. [`Config::resolve`] validates the raw file
//! into [`Settings`] and is the only place thresholds are checked.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::AuditError;
use crate::score::DEFAULT_THRESHOLD;

/// Default cap on a combined effort estimate, in hours.
pub const DEFAULT_MAX_EFFORT_CAP_HOURS: f64 = 40.0;

/// Raw configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// "human" (default) or "json"
    #[serde(default)]
    pub mode: Option<String>,
    /// Fail on any HIGH or CRITICAL violation
    #[serde(default)]
    pub strict: Option<bool>,
    /// Minimum passing testability score (0-100)
    #[serde(default)]
    pub threshold: Option<i64>,
    /// Cap on combined effort estimates, in hours
    #[serde(default, alias = "maxEffortCapHours")]
    pub max_effort_cap_hours: Option<f64>,
    /// Fail the run when any file could not be read
    #[serde(default, alias = "failOnIngestionError")]
    pub fail_on_ingestion_error: Option<bool>,
    /// Whether to include test files in analysis (default: false)
    #[serde(default, alias = "includeTestFiles")]
    pub include_test_files: Option<bool>,
    /// Glob patterns for paths to exclude from analysis (e.g., "**/Generated/**")
    #[serde(default, alias = "excludedPaths")]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub rules: Option<RuleConfig>,
}

/// Per-rule thresholds as written in the file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default, alias = "maxStateProperties")]
    pub max_state_properties: Option<i64>,
    #[serde(default, alias = "maxActions")]
    pub max_actions: Option<i64>,
    #[serde(default, alias = "minDuplicateHandlers")]
    pub min_duplicate_handlers: Option<i64>,
    #[serde(default, alias = "minVagueMethods")]
    pub min_vague_methods: Option<i64>,
    #[serde(default, alias = "minChildFeatures")]
    pub min_child_features: Option<i64>,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, AuditError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AuditError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse_str(&content)
            .map_err(|e| AuditError::config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a configuration from YAML text. An empty document is the default.
    pub fn parse_str(content: &str) -> Result<Self, AuditError> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(content).map_err(|e| AuditError::config(e.to_string()))
    }

    /// Validate and apply defaults.
    pub fn resolve(&self) -> Result<Settings, AuditError> {
        let mode = match &self.mode {
            Some(m) => m.parse::<OutputMode>()?,
            None => OutputMode::Human,
        };

        let threshold = match self.threshold {
            Some(t) if !(0..=100).contains(&t) => {
                return Err(AuditError::config(format!(
                    "threshold must be between 0 and 100, got {}",
                    t
                )))
            }
            Some(t) => t as u32,
            None => DEFAULT_THRESHOLD,
        };

        let max_effort_cap_hours = match self.max_effort_cap_hours {
            Some(h) if !h.is_finite() || h <= 0.0 => {
                return Err(AuditError::config(format!(
                    "max_effort_cap_hours must be a positive number, got {}",
                    h
                )))
            }
            Some(h) => h,
            None => DEFAULT_MAX_EFFORT_CAP_HOURS,
        };

        let rules = match &self.rules {
            Some(r) => r.resolve()?,
            None => RuleThresholds::default(),
        };

        let excluded = build_glob_set(&self.excluded_paths)?;

        Ok(Settings {
            mode,
            strict: self.strict.unwrap_or(false),
            threshold,
            max_effort_cap_hours,
            fail_on_ingestion_error: self.fail_on_ingestion_error.unwrap_or(false),
            include_test_files: self.include_test_files.unwrap_or(false),
            excluded_paths: self.excluded_paths.clone(),
            excluded,
            rules,
        })
    }
}

impl RuleConfig {
    fn resolve(&self) -> Result<RuleThresholds, AuditError> {
        let defaults = RuleThresholds::default();
        Ok(RuleThresholds {
            max_state_properties: non_negative(
                "rules.max_state_properties",
                self.max_state_properties,
                defaults.max_state_properties,
            )?,
            max_actions: non_negative("rules.max_actions", self.max_actions, defaults.max_actions)?,
            min_duplicate_handlers: non_negative(
                "rules.min_duplicate_handlers",
                self.min_duplicate_handlers,
                defaults.min_duplicate_handlers,
            )?,
            min_vague_methods: non_negative(
                "rules.min_vague_methods",
                self.min_vague_methods,
                defaults.min_vague_methods,
            )?,
            min_child_features: non_negative(
                "rules.min_child_features",
                self.min_child_features,
                defaults.min_child_features,
            )?,
        })
    }
}

fn non_negative(field: &str, value: Option<i64>, default: u32) -> Result<u32, AuditError> {
    match value {
        None => Ok(default),
        Some(v) if v < 0 => Err(AuditError::config(format!(
            "{} must be a non-negative integer, got {}",
            field, v
        ))),
        Some(v) => u32::try_from(v)
            .map_err(|_| AuditError::config(format!("{} is too large: {}", field, v))),
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, AuditError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            AuditError::config(format!("invalid excluded_paths pattern {:?}: {}", pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| AuditError::config(format!("invalid excluded_paths: {}", e)))
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Human,
    Json,
}

impl FromStr for OutputMode {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(OutputMode::Human),
            "json" => Ok(OutputMode::Json),
            _ => Err(AuditError::config(format!(
                "invalid mode {:?}, must be 'human' or 'json'",
                s
            ))),
        }
    }
}

/// Rule thresholds after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleThresholds {
    /// Rule 1.1 fires above this many state properties
    pub max_state_properties: u32,
    /// Rule 1.1 fires above this many actions
    pub max_actions: u32,
    /// Rule 1.3 fires at this many duplicate handlers
    pub min_duplicate_handlers: u32,
    /// Rule 1.4 fires at this many vague methods
    pub min_vague_methods: u32,
    /// Rule 1.5 fires at this many child features
    pub min_child_features: u32,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            max_state_properties: 15,
            max_actions: 40,
            min_duplicate_handlers: 2,
            min_vague_methods: 5,
            min_child_features: 5,
        }
    }
}

/// Validated, read-only settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: OutputMode,
    pub strict: bool,
    pub threshold: u32,
    pub max_effort_cap_hours: f64,
    pub fail_on_ingestion_error: bool,
    pub include_test_files: bool,
    pub excluded_paths: Vec<String>,
    excluded: GlobSet,
    pub rules: RuleThresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: OutputMode::Human,
            strict: false,
            threshold: DEFAULT_THRESHOLD,
            max_effort_cap_hours: DEFAULT_MAX_EFFORT_CAP_HOURS,
            fail_on_ingestion_error: false,
            include_test_files: false,
            excluded_paths: Vec::new(),
            excluded: GlobSet::empty(),
            rules: RuleThresholds::default(),
        }
    }
}

impl Settings {
    /// Check a relative path against the `excluded_paths` globs.
    pub fn is_path_excluded(&self, path: &str) -> bool {
        !self.excluded_paths.is_empty() && self.excluded.is_match(path)
    }
}
