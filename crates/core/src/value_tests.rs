// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[yare::parameterized(
    null         = { json!(null),  false },
    false_bool   = { json!(false), false },
    true_bool    = { json!(true),  true },
    zero         = { json!(0),     false },
    zero_float   = { json!(0.0),   false },
    number       = { json!(3),     true },
    empty_string = { json!(""),    false },
    string       = { json!("x"),   true },
    empty_array  = { json!([]),    true },
    empty_object = { json!({}),    true },
)]
fn truthy_cases(value: Value, expected: bool) {
    assert_eq!(truthy(&value), expected);
}

#[test]
fn lookup_walks_nested_objects() {
    let doc = json!({"task": {"params": {"context": "ctx"}}});
    assert_eq!(lookup_str(&doc, &["task", "params", "context"]), Some("ctx"));
    assert_eq!(lookup(&doc, &["task", "missing"]), None);
    assert_eq!(lookup(&doc, &["task", "params", "context", "deeper"]), None);
}

#[test]
fn lookup_treats_falsy_leaf_as_absent() {
    let doc = json!({"prompt": ""});
    assert_eq!(lookup(&doc, &["prompt"]), None);
}

#[test]
fn lookup_str_ignores_non_strings() {
    let doc = json!({"prompt": {"text": "hi"}});
    assert_eq!(lookup_str(&doc, &["prompt"]), None);
}

#[test]
fn object_or_empty_replaces_non_objects() {
    assert_eq!(object_or_empty(Some(&json!([1, 2]))), json!({}));
    assert_eq!(object_or_empty(None), json!({}));
    assert_eq!(object_or_empty(Some(&json!({"a": 1}))), json!({"a": 1}));
}

#[test]
fn pretty_uses_two_space_indent() {
    assert_eq!(pretty(&json!({"a": 1})), "{\n  \"a\": 1\n}");
}

#[test]
fn display_value_keeps_strings_verbatim() {
    assert_eq!(display_value(&json!("plain")), "plain");
    assert_eq!(display_value(&json!({"k": [1]})), "{\"k\":[1]}");
}
