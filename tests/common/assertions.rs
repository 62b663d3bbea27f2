//! Custom assertion helpers for tests.
#![allow(dead_code)]

use serde_json::Value;
use tracing::error;

#[must_use]
pub fn assert_json_has_fields(json_str: &str, fields: &[&str]) -> Value {
    let value: Value = serde_json::from_str(json_str).expect("invalid JSON payload");
    for field in fields {
        if value.get(field).is_none() {
            error!(field, json = %value, "Missing expected JSON field");
            panic!("Missing JSON field: {field}");
        }
    }
    value
}

pub fn assert_no_ansi(output: &str) {
    if output.contains("\u{1b}[") {
        error!("ANSI escape sequence detected");
        panic!("Expected no ANSI escape sequences");
    }
}

pub fn assert_contains_all(output: &str, expected: &[&str]) {
    for needle in expected {
        if !output.contains(needle) {
            error!(needle, "Missing expected substring");
            panic!("Missing expected substring: {needle}\nIn:\n{output}");
        }
    }
}

/// Assert the top-level keys appear in exactly this order.
pub fn assert_key_order<S: AsRef<str>>(actual: &[S], expected: &[&str]) {
    let actual: Vec<&str> = actual.iter().map(AsRef::as_ref).collect();
    if actual != expected {
        error!(?actual, ?expected, "Unexpected key order");
        panic!("Key order mismatch\n  actual:   {actual:?}\n  expected: {expected:?}");
    }
}
