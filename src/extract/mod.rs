//! Fact extraction from feature source files.
//!
//! Extraction is lexical: comments and strings are blanked, declaration
//! boundaries are found by brace matching, and the feature's structure is
//! recognized from markers such as `@Reducer`, `struct State`, `enum Action`
//! and `@Dependency(...)`. Files that do not look like a feature produce a
//! [`ParseSkipped`] instead of a guess.

mod facts;
pub mod lexer;
mod swift;

pub use facts::{Counter, FeatureFact};
pub use swift::is_vague_name;

use std::collections::BTreeSet;

use crate::corpus::SourceUnit;
use crate::error::ParseSkipped;

/// Produce the fact-sheet for one unit.
///
/// A unit is analyzable when it declares a reducer feature with a `State` or
/// `Action`, or, without a recognizable feature type, declares both.
pub fn extract(unit: &SourceUnit) -> Result<FeatureFact, ParseSkipped> {
    if unit.text.trim().is_empty() {
        return Err(ParseSkipped::new("empty source"));
    }

    let code = lexer::sanitize(&unit.text);
    let feature = swift::find_feature(&code);
    let scope = feature
        .as_ref()
        .map(|f| &code[f.body.clone()])
        .unwrap_or(code.as_str());

    let state = swift::state_body(scope).or_else(|| swift::state_body(&code));
    let action = swift::action_body(scope).or_else(|| swift::action_body(&code));

    let recognized = match feature {
        Some(_) => state.is_some() || action.is_some(),
        None => state.is_some() && action.is_some(),
    };
    if !recognized {
        let reason = if feature.is_some() || state.is_some() || action.is_some() {
            "incomplete feature: missing state or action declaration"
        } else {
            "no state or action declaration"
        };
        return Err(ParseSkipped::new(reason));
    }

    let id = feature
        .as_ref()
        .map(|f| f.name.clone())
        .unwrap_or_else(|| unit.stem().to_string());

    let state_properties = state.map(swift::stored_properties).unwrap_or_default();
    let actions = action.map(swift::enum_cases).unwrap_or_default();

    let mut closure_effects = Vec::new();
    if feature.is_some() {
        closure_effects.extend(swift::closure_properties(scope));
    }
    if let Some(body) = state {
        closure_effects.extend(swift::closure_properties(body));
    }

    Ok(FeatureFact {
        child_features: child_features(&code, &id, state, action),
        dependencies: swift::dependencies(&code),
        duplicate_handlers: swift::duplicate_handlers(&code),
        vague_methods: swift::vague_methods(&code),
        id,
        path: unit.path.clone(),
        state_properties,
        actions,
        closure_effects,
    })
}

/// Explicitly composed children, `@Reducer` enum case payloads, and
/// `Child.State`/`Child.Action` mentions.
///
/// Type mentions naming the feature itself or a type declared in the same
/// file are internal; explicit composition is always kept so recursive
/// features show up as self-loops.
fn child_features(
    code: &str,
    id: &str,
    state: Option<&str>,
    action: Option<&str>,
) -> Vec<String> {
    let local = swift::declared_types(code);
    let mut children: BTreeSet<String> = swift::composed_children(code);
    children.extend(swift::reducer_enum_children(code));

    for body in [state, action].into_iter().flatten() {
        children.extend(
            swift::mentioned_children(body)
                .into_iter()
                .filter(|name| name != id && !local.contains(name)),
        );
    }

    children.into_iter().collect()
}
