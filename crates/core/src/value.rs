// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers for reading loosely-typed JSON bags.
//!
//! Job producers disagree on which fields exist and what type they carry, so
//! lookups here never fail: a missing or mistyped field reads as absent.

use serde_json::{Map, Value};

/// An empty JSON object, used wherever a bag is absent.
pub fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Whether a value counts as "present" for first-match lookups.
///
/// `null`, `false`, `0`, and `""` are absent; arrays and objects are present
/// even when empty.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Walk a dotted path of object keys, returning the value only if truthy.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    truthy(current).then_some(current)
}

/// Like [`lookup`] but only yields non-empty strings.
pub fn lookup_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    lookup(root, path)?.as_str()
}

/// Clone `value` if it is an object, otherwise produce an empty object.
pub fn object_or_empty(value: Option<&Value>) -> Value {
    match value {
        Some(v @ Value::Object(_)) => v.clone(),
        _ => empty_object(),
    }
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    crate::id::short(s, max)
}

/// Two-space indented JSON, matching what producers and the orchestrator
/// expect to read back.
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Render a scalar the way it would be interpolated into text: strings
/// verbatim, everything else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
