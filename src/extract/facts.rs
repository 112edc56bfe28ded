//! Structural fact-sheet extracted from one source unit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything the rule engine, scorer, and graph builder know about a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFact {
    /// Unit identifier: the feature type name, or the file stem.
    pub id: String,
    /// Path relative to the scanned root.
    pub path: String,
    /// Stored instance properties of `State`.
    pub state_properties: Vec<String>,
    /// Cases of `Action`.
    pub actions: Vec<String>,
    /// Stored function values used to perform effects.
    pub closure_effects: Vec<String>,
    /// Injected capability identifiers, sorted and unique.
    pub dependencies: Vec<String>,
    /// Child feature names referenced by composition, sorted and unique.
    pub child_features: Vec<String>,
    /// Handler blocks whose body repeats an earlier handler.
    pub duplicate_handlers: usize,
    /// Methods with generic, meaningless names.
    pub vague_methods: Vec<String>,
}

impl FeatureFact {
    /// Read a named counter.
    pub fn count(&self, counter: Counter) -> usize {
        match counter {
            Counter::StateProperties => self.state_properties.len(),
            Counter::Actions => self.actions.len(),
            Counter::ClosureEffects => self.closure_effects.len(),
            Counter::Dependencies => self.dependencies.len(),
            Counter::DuplicateHandlers => self.duplicate_handlers,
            Counter::VagueMethods => self.vague_methods.len(),
            Counter::ChildFeatures => self.child_features.len(),
        }
    }
}

/// Named numeric views over a [`FeatureFact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    StateProperties,
    Actions,
    ClosureEffects,
    Dependencies,
    DuplicateHandlers,
    VagueMethods,
    ChildFeatures,
}

impl Counter {
    pub const ALL: [Counter; 7] = [
        Counter::StateProperties,
        Counter::Actions,
        Counter::ClosureEffects,
        Counter::Dependencies,
        Counter::DuplicateHandlers,
        Counter::VagueMethods,
        Counter::ChildFeatures,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::StateProperties => "state_properties",
            Counter::Actions => "actions",
            Counter::ClosureEffects => "closure_effects",
            Counter::Dependencies => "dependencies",
            Counter::DuplicateHandlers => "duplicate_handlers",
            Counter::VagueMethods => "vague_methods",
            Counter::ChildFeatures => "child_features",
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
