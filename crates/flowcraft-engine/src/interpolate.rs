//! `{{placeholder}}` interpolation against node input and context
//!
//! Placeholders resolve against the node's input map first, then the
//! context variable bag. Unresolved placeholders are left literally in
//! place — they neither error nor disappear. Dot-separated names
//! traverse nested objects.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("static regex"))
}

/// Resolve a dot-path inside a value (`user.name` -> `value["user"]["name"]`)
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Look up a possibly-dotted name in input first, then variables.
pub fn resolve_name<'a>(
    name: &str,
    input: &'a HashMap<String, Value>,
    variables: &'a HashMap<String, Value>,
) -> Option<&'a Value> {
    let (head, rest) = match name.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (name, None),
    };

    let root = input.get(head).or_else(|| variables.get(head))?;
    match rest {
        Some(path) => lookup_path(root, path),
        None => Some(root),
    }
}

/// Stringify a value for substitution: strings verbatim, everything
/// else compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a template, substituting each `{{name}}` placeholder.
pub fn render(
    template: &str,
    input: &HashMap<String, Value>,
    variables: &HashMap<String, Value>,
) -> String {
    placeholder_re()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match resolve_name(name, input, variables) {
                Some(value) => stringify(value),
                // Unresolved: keep the placeholder literal
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
