//! Recognition of feature-reducer declarations in sanitized Swift text.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

use super::lexer::{self, Declaration};

lazy_static! {
    static ref TYPE_DECL: Regex = Regex::new(
        r"\b(struct|enum|class)\s+([A-Z][A-Za-z0-9_]*)\s*(?:<[^{>]*>)?\s*(?::\s*([^{]*))?\{"
    )
    .unwrap();
    static ref REDUCER_MARKER: Regex = Regex::new(r"@Reducer\b").unwrap();
    static ref REDUCER_CONFORMANCE: Regex = Regex::new(r"\bReducer(?:Protocol)?\b").unwrap();
    static ref STATE_DECL: Regex = Regex::new(r"\bstruct\s+State\b[^{]*\{").unwrap();
    static ref ACTION_DECL: Regex = Regex::new(r"\benum\s+Action\b[^{]*\{").unwrap();
    static ref DEPENDENCY: Regex = Regex::new(
        r"@Dependency\s*\(\s*(?:\\\.([A-Za-z_][A-Za-z0-9_]*)(?:\.[A-Za-z_][A-Za-z0-9_]*)*|([A-Za-z_][A-Za-z0-9_.]*)\.self)\s*\)"
    )
    .unwrap();
    static ref SCOPE_CHILD: Regex =
        Regex::new(r"\bScope\s*\(\s*state\s*:[^{}]*\)\s*\{\s*([A-Z][A-Za-z0-9_]*)\s*\(").unwrap();
    static ref COMPOSE_CHILD: Regex = Regex::new(
        r"\.(?:ifLet|forEach|ifCaseLet)\s*\([^{}]*\)\s*\{\s*([A-Z][A-Za-z0-9_]*)\s*\("
    )
    .unwrap();
    static ref CASE_PAYLOAD: Regex =
        Regex::new(r"^`?[A-Za-z_][A-Za-z0-9_]*`?\s*\(\s*([A-Z][A-Za-z0-9_]*)\s*\)$").unwrap();
    static ref TYPE_MENTION: Regex =
        Regex::new(r"\b([A-Z][A-Za-z0-9_]*)\.(?:State|Action)\b").unwrap();
    static ref SWITCH_ACTION: Regex = Regex::new(r"\bswitch\s+action\s*\{").unwrap();
    static ref FUNC_NAME: Regex = Regex::new(r"\bfunc\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap();
    static ref VAGUE_NAME: Regex = Regex::new(
        r"^(?:(?:handle|process|perform|manage|do|update|execute|run)(?:It|Stuff|Things|Data|Action|Actions|Event|Events|Logic|Work|Info|Misc|All|Everything|Changes)?|helpers?|misc|stuff|things|utils?)[0-9]*$"
    )
    .unwrap();
}

/// Handler bodies that carry no logic worth comparing.
const TRIVIAL_HANDLERS: &[&str] = &["", "return .none", "break", "return .none;"];

/// A type declaration located in sanitized text.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub is_enum: bool,
    pub body: Range<usize>,
}

/// Types marked `@Reducer` or conforming to `Reducer`, in source order.
pub fn reducer_types(code: &str) -> Vec<TypeDecl> {
    TYPE_DECL
        .captures_iter(code)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let conforms = caps
                .get(3)
                .map(|m| REDUCER_CONFORMANCE.is_match(m.as_str()))
                .unwrap_or(false);
            if !conforms && !has_reducer_attribute(code, whole.start()) {
                return None;
            }
            Some(TypeDecl {
                name: caps[2].to_string(),
                is_enum: &caps[1] == "enum",
                body: lexer::block_body(code, whole.end() - 1),
            })
        })
        .collect()
}

/// The feature type of a unit.
///
/// Helper reducers such as `@Reducer enum Path` may precede the feature, so
/// the first reducer type declaring its own `State` or `Action` wins; failing
/// that, the first reducer type.
pub fn find_feature(code: &str) -> Option<TypeDecl> {
    let mut reducers = reducer_types(code);
    if reducers.is_empty() {
        return None;
    }
    let index = reducers
        .iter()
        .position(|t| {
            let body = &code[t.body.clone()];
            STATE_DECL.is_match(body) || ACTION_DECL.is_match(body)
        })
        .unwrap_or(0);
    Some(reducers.swap_remove(index))
}

/// Look back from a declaration keyword to the previous statement boundary.
fn has_reducer_attribute(code: &str, decl_start: usize) -> bool {
    let prefix = &code[..decl_start];
    let window_start = prefix
        .rfind(|c| c == '{' || c == '}' || c == ';')
        .map(|i| i + 1)
        .unwrap_or(0);
    REDUCER_MARKER.is_match(&prefix[window_start..])
}

/// Names of every type declared in the text.
pub fn declared_types(code: &str) -> BTreeSet<String> {
    TYPE_DECL
        .captures_iter(code)
        .map(|caps| caps[2].to_string())
        .collect()
}

/// Body of the first block introduced by `decl`.
fn find_block<'a>(code: &'a str, decl: &Regex) -> Option<&'a str> {
    let m = decl.find(code)?;
    let body = lexer::block_body(code, m.end() - 1);
    Some(&code[body])
}

pub fn state_body(code: &str) -> Option<&str> {
    find_block(code, &STATE_DECL)
}

pub fn action_body(code: &str) -> Option<&str> {
    find_block(code, &ACTION_DECL)
}

/// Stored instance property names of a block body.
pub fn stored_properties(body: &str) -> Vec<String> {
    lexer::declarations(body)
        .iter()
        .filter(|d| !d.is_static)
        .filter_map(lexer::property)
        .filter(|p| !p.is_computed)
        .map(|p| p.name.to_string())
        .collect()
}

/// Stored closure-typed properties that are not injected dependencies.
pub fn closure_properties(body: &str) -> Vec<String> {
    lexer::declarations(body)
        .iter()
        .filter(|d| !d.is_static && !d.has_attribute("Dependency"))
        .filter_map(|d| lexer::property(d).map(|p| (d, p)))
        .filter(|(_, p)| p.is_closure_typed())
        .map(|(_, p)| p.name.to_string())
        .collect()
}

/// Case names declared directly in an enum body.
pub fn enum_cases(body: &str) -> Vec<String> {
    lexer::declarations(body)
        .iter()
        .filter(|d| lexer::starts_with_keyword(d.text, "case"))
        .flat_map(|d: &Declaration<'_>| lexer::split_depth0(&d.text[4..]))
        .map(|case| lexer::identifier(case.trim_start_matches('`')).to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Injected capability identifiers, sorted and unique.
pub fn dependencies(code: &str) -> Vec<String> {
    let found: BTreeSet<String> = DEPENDENCY
        .captures_iter(code)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect();
    found.into_iter().collect()
}

/// Children composed with `Scope`, `.ifLet`, `.forEach`, or `.ifCaseLet`.
pub fn composed_children(code: &str) -> BTreeSet<String> {
    SCOPE_CHILD
        .captures_iter(code)
        .chain(COMPOSE_CHILD.captures_iter(code))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Features held by the cases of `@Reducer` enums (destinations, stack paths).
pub fn reducer_enum_children(code: &str) -> BTreeSet<String> {
    reducer_types(code)
        .into_iter()
        .filter(|t| t.is_enum)
        .flat_map(|t| case_payloads(&code[t.body]))
        .collect()
}

/// Single-type payloads of `case name(Type)` declarations.
fn case_payloads(body: &str) -> Vec<String> {
    lexer::declarations(body)
        .iter()
        .filter(|d| lexer::starts_with_keyword(d.text, "case"))
        .flat_map(|d: &Declaration<'_>| lexer::split_depth0(&d.text[4..]))
        .filter_map(|case| CASE_PAYLOAD.captures(case.trim()).map(|caps| caps[1].to_string()))
        .collect()
}

/// Features named through `Child.State` / `Child.Action` type mentions.
pub fn mentioned_children(text: &str) -> BTreeSet<String> {
    TYPE_MENTION
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .filter(|name| name != "Self")
        .collect()
}

/// Number of `switch action` handler blocks that repeat an earlier block.
pub fn duplicate_handlers(code: &str) -> usize {
    let mut seen: HashMap<String, usize> = HashMap::new();

    for m in SWITCH_ACTION.find_iter(code) {
        let body = &code[lexer::block_body(code, m.end() - 1)];
        for handler in handler_bodies(body) {
            if TRIVIAL_HANDLERS.contains(&handler.as_str()) {
                continue;
            }
            *seen.entry(handler).or_insert(0) += 1;
        }
    }

    seen.values().map(|n| n - 1).sum()
}

/// Whitespace-normalized bodies of each `case`/`default` handler.
fn handler_bodies(switch_body: &str) -> Vec<String> {
    let mut handlers = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for stmt in lexer::statements(switch_body) {
        let (_, _, rest) = lexer::strip_prefix(stmt);
        if let Some(after_label) = label_remainder(rest) {
            if let Some(parts) = current.take() {
                handlers.push(normalize(&parts));
            }
            current = Some(vec![after_label]);
        } else if let Some(parts) = current.as_mut() {
            parts.push(stmt);
        }
    }
    if let Some(parts) = current {
        handlers.push(normalize(&parts));
    }

    handlers
}

fn label_remainder(stmt: &str) -> Option<&str> {
    if !(lexer::starts_with_keyword(stmt, "case") || lexer::starts_with_keyword(stmt, "default"))
    {
        return None;
    }
    let colon = lexer::find_depth0(stmt, b":")?;
    Some(stmt[colon + 1..].trim())
}

fn normalize(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every `func` whose name says nothing about what it does, in source order.
pub fn vague_methods(code: &str) -> Vec<String> {
    FUNC_NAME
        .captures_iter(code)
        .map(|caps| caps[1].to_string())
        .filter(|name| is_vague_name(name))
        .collect()
}

pub fn is_vague_name(name: &str) -> bool {
    VAGUE_NAME.is_match(name)
}
