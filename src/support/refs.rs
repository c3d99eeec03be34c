//! Extraction of `{token.name}` references from arbitrary JSON values.

use serde_json::Value;

/// A pure alias value: a string that is exactly one `{name}` reference.
///
/// Returns the referenced name without braces.
pub fn alias_target(value: &Value) -> Option<&str> {
    let s = value.as_str()?;
    let inner = s.strip_prefix('{')?.strip_suffix('}')?;
    // A composite like "{a} {b}" is not a pure alias.
    (!inner.contains(['{', '}'])).then_some(inner)
}

/// Walk any JSON value recursively and collect token names from `{…}`
/// substrings, in encounter order.
pub fn extract_references(value: &Value) -> Vec<String> {
    let mut refs = Vec::new();
    collect(value, &mut refs);
    refs
}

fn collect(value: &Value, refs: &mut Vec<String>) {
    match value {
        Value::String(s) => scan_string(s, refs),
        Value::Array(items) => {
            for item in items {
                collect(item, refs);
            }
        }
        Value::Object(entries) => {
            for entry in entries.values() {
                collect(entry, refs);
            }
        }
        _ => {}
    }
}

fn scan_string(s: &str, refs: &mut Vec<String>) {
    let mut rest = s;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return;
        };
        let name = &after[..close];
        if !name.is_empty() && !name.contains('{') {
            refs.push(name.to_string());
        }
        rest = &after[close + 1..];
    }
}
