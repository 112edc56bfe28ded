//! Token-level scanning helpers.
//!
//! Nothing here parses Swift. The helpers blank out comments and string
//! literals, match braces, and split block bodies into depth-0 statements,
//! which is enough structure to recognize declarations in partial or
//! syntactically broken files.

use std::ops::Range;

/// Modifiers stripped from the front of a declaration.
const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "fileprivate",
    "internal",
    "package",
    "open",
    "final",
    "lazy",
    "weak",
    "unowned",
    "nonisolated",
    "override",
    "mutating",
    "nonmutating",
    "static",
    "dynamic",
    "required",
    "convenience",
    "indirect",
];

fn blank(c: char) -> char {
    if c == '\n' {
        '\n'
    } else {
        ' '
    }
}

/// Replace comments and string literal contents with spaces.
///
/// Newlines and string delimiters are preserved so line structure and
/// statement boundaries survive. Unterminated comments and strings run to the
/// end of the text (or, for single-line strings, to the end of the line).
pub fn sanitize(source: &str) -> String {
    scan(source, false)
}

/// Replace string literal contents with spaces, keeping comments verbatim.
pub fn strip_strings(source: &str) -> String {
    scan(source, true)
}

fn scan(source: &str, keep_comments: bool) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c == '/' && next == Some('/') {
            while i < chars.len() && chars[i] != '\n' {
                out.push(if keep_comments { chars[i] } else { ' ' });
                i += 1;
            }
            continue;
        }
        if c == '/' && next == Some('*') {
            let mut blanked = String::new();
            let end = blank_block_comment(&chars, i, &mut blanked);
            if keep_comments {
                out.extend(&chars[i..end]);
            } else {
                out.push_str(&blanked);
            }
            i = end;
            continue;
        }
        if c == '"' || (c == '#' && is_raw_string_start(&chars, i)) {
            i = blank_string(&chars, i, &mut out);
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

/// Swift block comments nest.
fn blank_block_comment(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut i = start;
    let mut depth = 0usize;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if c == '/' && next == Some('*') {
            depth += 1;
            out.push_str("  ");
            i += 2;
        } else if c == '*' && next == Some('/') {
            depth = depth.saturating_sub(1);
            out.push_str("  ");
            i += 2;
            if depth == 0 {
                break;
            }
        } else {
            out.push(blank(c));
            i += 1;
        }
    }

    i
}

fn is_raw_string_start(chars: &[char], start: usize) -> bool {
    let mut i = start;
    while chars.get(i) == Some(&'#') {
        i += 1;
    }
    i > start && chars.get(i) == Some(&'"')
}

fn blank_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut i = start;
    let mut hashes = 0;
    while chars.get(i) == Some(&'#') {
        out.push('#');
        hashes += 1;
        i += 1;
    }

    let multiline = chars.get(i + 1) == Some(&'"') && chars.get(i + 2) == Some(&'"');
    let quotes = if multiline { 3 } else { 1 };
    for _ in 0..quotes {
        out.push('"');
    }
    i += quotes;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && hashes == 0 {
            if chars.get(i + 1) == Some(&'(') {
                i = blank_interpolation(chars, i, out);
                continue;
            }
            out.push(' ');
            i += 1;
            if let Some(&escaped) = chars.get(i) {
                out.push(blank(escaped));
                i += 1;
            }
            continue;
        }

        if c == '"' && closes_string(chars, i, quotes, hashes) {
            for _ in 0..quotes {
                out.push('"');
            }
            for _ in 0..hashes {
                out.push('#');
            }
            return i + quotes + hashes;
        }

        if c == '\n' && !multiline {
            return i;
        }

        out.push(blank(c));
        i += 1;
    }

    i
}

fn closes_string(chars: &[char], at: usize, quotes: usize, hashes: usize) -> bool {
    (0..quotes).all(|k| chars.get(at + k) == Some(&'"'))
        && (0..hashes).all(|k| chars.get(at + quotes + k) == Some(&'#'))
}

/// Blank a `\( ... )` interpolation, including any nested string literals.
fn blank_interpolation(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut i = start + 2;
    let mut depth = 1usize;
    let mut in_nested = false;
    out.push_str("  ");

    while i < chars.len() && depth > 0 {
        let c = chars[i];
        if in_nested {
            if c == '\\' {
                out.push(' ');
                i += 1;
            } else if c == '"' || c == '\n' {
                in_nested = false;
            }
        } else {
            match c {
                '"' => in_nested = true,
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
        }
        if i < chars.len() {
            out.push(blank(chars[i]));
            i += 1;
        }
    }

    i
}

/// Body range of the block whose opening brace sits at byte `open`.
///
/// An unbalanced block extends to the end of the text.
pub fn block_body(code: &str, open: usize) -> Range<usize> {
    let bytes = code.as_bytes();
    let mut depth = 0usize;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (open + 1)..i;
                }
            }
            _ => {}
        }
    }

    (open + 1).min(code.len())..code.len()
}

/// Split a block body into statements at depth-0 newlines and semicolons.
///
/// A line ending in `,` continues on the next line.
pub fn statements(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut depth = 0i32;
    let mut start = 0;
    let mut out = Vec::new();

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth = (depth - 1).max(0),
            b'\n' | b';' if depth == 0 => {
                let segment = body[start..i].trim();
                if segment.ends_with(',') && b == b'\n' {
                    continue;
                }
                if !segment.is_empty() {
                    out.push(segment);
                }
                start = i + 1;
            }
            _ => {}
        }
    }

    let tail = body[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

/// A depth-0 statement with its leading attributes and modifiers peeled off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration<'a> {
    pub attributes: Vec<&'a str>,
    pub is_static: bool,
    pub text: &'a str,
}

impl Declaration<'_> {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| {
            a.strip_prefix('@')
                .map(|rest| identifier(rest) == name)
                .unwrap_or(false)
        })
    }
}

/// Declarations of a block body. Attribute-only lines attach to the next one.
pub fn declarations(body: &str) -> Vec<Declaration<'_>> {
    let mut out = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    let mut pending_static = false;

    for stmt in statements(body) {
        let (mut attributes, is_static, text) = strip_prefix(stmt);
        if text.is_empty() {
            pending.append(&mut attributes);
            pending_static |= is_static;
            continue;
        }
        let mut all = std::mem::take(&mut pending);
        all.append(&mut attributes);
        out.push(Declaration {
            attributes: all,
            is_static: is_static || pending_static,
            text,
        });
        pending_static = false;
    }

    out
}

/// Strip leading `@Attribute(...)` markers and modifiers.
pub fn strip_prefix(stmt: &str) -> (Vec<&str>, bool, &str) {
    let mut attributes = Vec::new();
    let mut is_static = false;
    let mut rest = stmt.trim_start();

    loop {
        if rest.starts_with('@') {
            let end = attribute_end(rest);
            attributes.push(&rest[..end]);
            rest = rest[end..].trim_start();
            continue;
        }

        let word = identifier(rest);
        if !word.is_empty() && MODIFIERS.contains(&word) {
            is_static |= word == "static";
            rest = rest[word.len()..].trim_start();
            // private(set), unowned(unsafe)
            if rest.starts_with('(') {
                if let Some(close) = rest.find(')') {
                    rest = rest[close + 1..].trim_start();
                }
            }
            continue;
        }
        break;
    }

    (attributes, is_static, rest.trim())
}

fn attribute_end(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
    {
        i += 1;
    }
    if bytes.get(i) == Some(&b'(') {
        let mut depth = 0usize;
        while i < bytes.len() {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }
    i.min(s.len())
}

/// Leading identifier of `s` (ASCII word characters).
pub fn identifier(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    &s[..end]
}

/// Whether `s` starts with `keyword` as a whole word.
pub fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    s.starts_with(keyword)
        && s[keyword.len()..]
            .chars()
            .next()
            .map(|c| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(true)
}

/// Byte index of the first `target` outside any bracket pair.
pub fn find_depth0(s: &str, targets: &[u8]) -> Option<usize> {
    let mut depth = 0i32;
    for (i, &b) in s.as_bytes().iter().enumerate() {
        if depth == 0 && targets.contains(&b) {
            return Some(i);
        }
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Split `s` at depth-0 commas.
pub fn split_depth0(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(i) = find_depth0(rest, b",") {
        parts.push(rest[..i].trim());
        rest = &rest[i + 1..];
    }
    parts.push(rest.trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// A stored or computed `var`/`let` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property<'a> {
    pub name: &'a str,
    pub type_annotation: Option<&'a str>,
    pub initializer: Option<&'a str>,
    pub is_computed: bool,
}

impl Property<'_> {
    /// Stored function value: `-> ` in the annotation or a bare closure initializer.
    pub fn is_closure_typed(&self) -> bool {
        if self.is_computed {
            return false;
        }
        if self.type_annotation.map(|t| t.contains("->")).unwrap_or(false) {
            return true;
        }
        match self.initializer {
            Some(init) if init.starts_with('{') => block_body(init, 0).end + 1 == init.len(),
            _ => false,
        }
    }
}

/// Parse a `var`/`let` declaration. Returns `None` for anything else,
/// including tuple destructuring.
pub fn property<'a>(decl: &Declaration<'a>) -> Option<Property<'a>> {
    let text = decl.text;
    let after = if starts_with_keyword(text, "var") || starts_with_keyword(text, "let") {
        text[3..].trim_start()
    } else {
        return None;
    };

    let unquoted = after.trim_start_matches('`');
    let name = identifier(unquoted);
    if name.is_empty() {
        return None;
    }
    let mut rest = unquoted[name.len()..].trim_start_matches('`').trim_start();

    let mut type_annotation = None;
    if let Some(stripped) = rest.strip_prefix(':') {
        let end = find_depth0(stripped, b"={").unwrap_or(stripped.len());
        type_annotation = Some(stripped[..end].trim());
        rest = stripped[end..].trim_start();
    }

    let mut initializer = None;
    let mut is_computed = false;
    if let Some(init) = rest.strip_prefix('=') {
        initializer = Some(init.trim());
    } else if rest.starts_with('{') {
        let body = rest[block_body(rest, 0)].trim_start();
        is_computed = !(starts_with_keyword(body, "didSet") || starts_with_keyword(body, "willSet"));
    }

    Some(Property {
        name,
        type_annotation,
        initializer,
        is_computed,
    })
}
