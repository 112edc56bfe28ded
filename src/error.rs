//! Error taxonomy for the analysis engine.
//!
//! Only configuration and internal-invariant errors abort a run. Per-unit
//! problems (skipped units, unreadable files) are collected into the report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors that abort an analysis run.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Bad threshold, option, or configuration file. Raised before analysis.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The engine produced data it cannot reconcile. Indicates a bug.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl AuditError {
    pub fn config(message: impl Into<String>) -> Self {
        AuditError::Configuration(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        AuditError::InternalInvariant(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, AuditError::Configuration(_))
    }
}

/// A unit that does not look like a feature of the architecture.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("skipped: {reason}")]
pub struct ParseSkipped {
    pub reason: String,
}

impl ParseSkipped {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
