//! DTCG document parsing: validation, `$extends` inheritance, and
//! flattening into a [`TokenMap`].

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::error::TinctureError;
use crate::support::refs;
use crate::tokens::{Deprecated, ResolvedToken, TokenMap, types};
use crate::warnings::{TinctureWarning, WarningSink};

/// `$`-prefixed keys recognized on tokens and groups.
const RESERVED_KEYS: &[&str] = &[
    "$root",
    "$value",
    "$ref",
    "$type",
    "$description",
    "$deprecated",
    "$extends",
    "$extensions",
];

/// Parse a DTCG document into a flat token map.
///
/// `$ref` nodes must already be substituted (the reference resolver runs
/// first); aliases are left for the alias resolver. Group `$extends`
/// inheritance is applied before flattening.
pub fn parse_document(doc: &Value, sink: &mut WarningSink) -> Result<TokenMap, TinctureError> {
    let doc = resolve_extends(doc)?;
    let mut flattener = Flattener::default();
    let mut path = Vec::new();
    flattener.walk_group(&doc, &mut path, None, sink)?;
    Ok(flattener.map)
}

#[derive(Default)]
struct Flattener {
    map: TokenMap,
    seen_lowercase: HashMap<String, String>,
}

impl Flattener {
    fn walk_group(
        &mut self,
        node: &Value,
        path: &mut Vec<String>,
        inherited_type: Option<&str>,
        sink: &mut WarningSink,
    ) -> Result<(), TinctureError> {
        let Some(obj) = node.as_object() else {
            sink.report(TinctureWarning::InvalidToken {
                message: format!("'{}' must be an object", path.join(".")),
            })?;
            return Ok(());
        };

        let own_type = obj.get("$type").and_then(Value::as_str);
        let group_type = own_type.or(inherited_type);

        if obj.contains_key("$value") {
            return self.emit_token(obj, path, group_type, sink);
        }

        for (key, child) in obj {
            if key == "$root" {
                if path.is_empty() {
                    sink.report(TinctureWarning::InvalidToken {
                        message: "$root is only valid inside a named group".to_string(),
                    })?;
                    continue;
                }
                let Some(root_obj) = child.as_object() else {
                    sink.report(TinctureWarning::InvalidToken {
                        message: format!("$root of '{}' must be a token", path.join(".")),
                    })?;
                    continue;
                };
                self.emit_token(root_obj, path, group_type, sink)?;
            } else if key.starts_with('$') {
                if !RESERVED_KEYS.contains(&key.as_str()) {
                    sink.report(TinctureWarning::InvalidToken {
                        message: format!("unrecognized key '{key}' in '{}'", path.join(".")),
                    })?;
                }
            } else if key.contains(['{', '}', '.']) {
                sink.report(TinctureWarning::InvalidToken {
                    message: format!("token name '{key}' must not contain '{{', '}}', or '.'"),
                })?;
            } else {
                path.push(key.clone());
                self.walk_group(child, path, group_type, sink)?;
                path.pop();
            }
        }
        Ok(())
    }

    fn emit_token(
        &mut self,
        obj: &Map<String, Value>,
        path: &[String],
        inherited_type: Option<&str>,
        sink: &mut WarningSink,
    ) -> Result<(), TinctureError> {
        let name = path.join(".");

        // A leaf carrying child tokens is malformed.
        let has_children = obj
            .keys()
            .any(|key| !key.starts_with('$') || key == "$root");
        if has_children {
            sink.report(TinctureWarning::InvalidToken {
                message: format!("'{name}' carries both a $value and child tokens"),
            })?;
        }

        let Some(value) = obj.get("$value") else {
            sink.report(TinctureWarning::InvalidToken {
                message: format!("'{name}' has neither $value nor $ref"),
            })?;
            return Ok(());
        };

        let token_type = obj
            .get("$type")
            .and_then(Value::as_str)
            .or(inherited_type)
            .map(str::to_string);

        if token_type.is_none() && refs::alias_target(value).is_none() {
            sink.report(TinctureWarning::InvalidToken {
                message: format!("'{name}' has no $type and no alias target to infer one from"),
            })?;
        }

        if let Some(declared) = &token_type {
            if let Err(error) = types::validate_value(declared, value) {
                sink.report(TinctureWarning::InvalidToken {
                    message: format!("'{name}': {error}"),
                })?;
            }
        }

        let deprecated = match obj.get("$deprecated") {
            Some(Value::Bool(flag)) => Some(Deprecated::Flag(*flag)),
            Some(Value::String(reason)) => Some(Deprecated::Reason(reason.clone())),
            Some(other) => {
                sink.report(TinctureWarning::InvalidToken {
                    message: format!("'{name}': $deprecated must be a bool or string, got {other}"),
                })?;
                None
            }
            None => None,
        };

        let lowercase = name.to_lowercase();
        if let Some(previous) = self.seen_lowercase.get(&lowercase) {
            if previous != &name {
                sink.advise(TinctureWarning::CaseCollision {
                    first: previous.clone(),
                    second: name.clone(),
                });
            }
        } else {
            self.seen_lowercase.insert(lowercase, name.clone());
        }

        self.map.insert(ResolvedToken {
            name,
            path: path.to_vec(),
            token_type,
            value: value.clone(),
            original_value: value.clone(),
            description: obj
                .get("$description")
                .and_then(Value::as_str)
                .map(str::to_string),
            deprecated,
            is_alias: false,
            source_set: None,
            source_modifier: None,
        });
        Ok(())
    }
}

// ── $extends resolution ────────────────────────────────────────

/// Maximum expansion passes; copied subtrees can surface new `$extends`
/// keys, but nesting beyond this depth indicates a pathological document.
const MAX_EXTENDS_PASSES: usize = 64;

/// Apply group `$extends` inheritance across the document.
///
/// Groups are merged in dependency order: each extended path contributes
/// its post-merge content, shallow-merged in listing order, with the
/// extending group winning on conflicts.
fn resolve_extends(doc: &Value) -> Result<Value, TinctureError> {
    let mut root = doc.clone();
    for _ in 0..MAX_EXTENDS_PASSES {
        let targets = collect_extends_paths(&root);
        if targets.is_empty() {
            return Ok(root);
        }
        let mut done = HashSet::new();
        let mut stack = Vec::new();
        for path in &targets {
            expand_group(&mut root, path, &mut done, &mut stack)?;
        }
    }
    Err(TinctureError::CircularReference {
        chain: "$extends nesting exceeded maximum depth".to_string(),
    })
}

fn collect_extends_paths(root: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    let mut current = Vec::new();
    collect_into(root, &mut current, &mut paths);
    paths
}

fn collect_into(node: &Value, current: &mut Vec<String>, paths: &mut Vec<String>) {
    let Some(obj) = node.as_object() else { return };
    if obj.contains_key("$extends") && !current.is_empty() {
        paths.push(current.join("."));
    }
    for (key, child) in obj {
        if !key.starts_with('$') {
            current.push(key.clone());
            collect_into(child, current, paths);
            current.pop();
        }
    }
}

fn expand_group(
    root: &mut Value,
    path: &str,
    done: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> Result<(), TinctureError> {
    if done.contains(path) {
        return Ok(());
    }
    if stack.iter().any(|p| p == path) {
        let mut chain = stack.clone();
        chain.push(path.to_string());
        return Err(TinctureError::CircularReference {
            chain: chain.join(" -> "),
        });
    }

    let Some(group) = get_path(root, path).cloned() else {
        // Already merged away by an ancestor expansion.
        done.insert(path.to_string());
        return Ok(());
    };
    let Some(group_obj) = group.as_object() else {
        done.insert(path.to_string());
        return Ok(());
    };
    let Some(extends) = group_obj.get("$extends") else {
        done.insert(path.to_string());
        return Ok(());
    };

    let bases: Vec<String> = match extends.as_array() {
        Some(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    TinctureError::Validation {
                        message: format!("$extends entries in '{path}' must be strings"),
                    }
                })
            })
            .collect::<Result<_, _>>()?,
        None => {
            return Err(TinctureError::Validation {
                message: format!("$extends in '{path}' must be an array of group paths"),
            });
        }
    };

    stack.push(path.to_string());
    let mut merged = Map::new();
    for base in &bases {
        expand_group(root, base, done, stack)?;
        let Some(base_group) = get_path(root, base).and_then(Value::as_object) else {
            stack.pop();
            return Err(TinctureError::Validation {
                message: format!("$extends target '{base}' in '{path}' not found"),
            });
        };
        for (key, value) in base_group {
            if key != "$extends" {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    for (key, value) in group_obj {
        if key != "$extends" {
            merged.insert(key.clone(), value.clone());
        }
    }
    stack.pop();

    set_path(root, path, Value::Object(merged));
    done.insert(path.to_string());
    Ok(())
}

fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.split('.') {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

fn set_path(root: &mut Value, path: &str, new_value: Value) {
    let mut node = root;
    let segments: Vec<&str> = path.split('.').collect();
    for (i, segment) in segments.iter().enumerate() {
        let Some(obj) = node.as_object_mut() else { return };
        if i == segments.len() - 1 {
            obj.insert((*segment).to_string(), new_value);
            return;
        }
        let Some(next) = obj.get_mut(*segment) else { return };
        node = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warnings::ValidationMode;
    use serde_json::json;

    fn parse(doc: &Value) -> Result<TokenMap, TinctureError> {
        let mut sink = WarningSink::new(ValidationMode::Error);
        parse_document(doc, &mut sink)
    }

    fn parse_lenient(doc: &Value) -> (TokenMap, Vec<String>) {
        let mut sink = WarningSink::new(ValidationMode::Warn);
        let map = parse_document(doc, &mut sink).expect("lenient parse succeeds");
        let warnings = sink.warnings().iter().map(ToString::to_string).collect();
        (map, warnings)
    }

    #[test]
    fn flattens_nested_groups() {
        let map = parse(&json!({
            "color": {
                "$type": "color",
                "brand": {
                    "primary": {"$value": "#0066cc"},
                    "secondary": {"$value": "#663399"}
                }
            }
        }))
        .expect("valid document");
        assert_eq!(map.len(), 2);
        let primary = map.get("color.brand.primary").expect("token exists");
        assert_eq!(primary.token_type.as_deref(), Some("color"));
        assert_eq!(primary.path, vec!["color", "brand", "primary"]);
    }

    #[test]
    fn type_inherited_from_nearest_group() {
        let map = parse(&json!({
            "outer": {
                "$type": "color",
                "inner": {
                    "$type": "dimension",
                    "token": {"$value": {"value": 4, "unit": "px"}}
                }
            }
        }))
        .expect("valid document");
        let token = map.get("outer.inner.token").expect("token exists");
        assert_eq!(token.token_type.as_deref(), Some("dimension"));
    }

    #[test]
    fn root_contributes_group_token() {
        let map = parse(&json!({
            "spacing": {
                "$type": "dimension",
                "$root": {"$value": {"value": 8, "unit": "px"}},
                "lg": {"$value": {"value": 16, "unit": "px"}}
            }
        }))
        .expect("valid document");
        assert!(map.contains("spacing"));
        assert!(map.contains("spacing.lg"));
    }

    #[test]
    fn extends_merges_in_order() {
        let map = parse(&json!({
            "base": {
                "$type": "color",
                "a": {"$value": "#111111"},
                "b": {"$value": "#222222"}
            },
            "variant": {
                "$extends": ["base"],
                "$type": "color",
                "b": {"$value": "#999999"}
            }
        }))
        .expect("valid document");
        assert_eq!(map.get("variant.a").map(|t| &t.value), Some(&json!("#111111")));
        // Extending group wins on conflict.
        assert_eq!(map.get("variant.b").map(|t| &t.value), Some(&json!("#999999")));
    }

    #[test]
    fn extends_cycle_is_detected() {
        let result = parse(&json!({
            "a": {"$extends": ["b"], "$type": "color"},
            "b": {"$extends": ["a"], "$type": "color"}
        }));
        assert!(matches!(result, Err(TinctureError::CircularReference { .. })));
    }

    #[test]
    fn rejects_dotted_names() {
        let result = parse(&json!({
            "color.bad": {"$type": "color", "$value": "#000000"}
        }));
        assert!(matches!(result, Err(TinctureError::Validation { .. })));
    }

    #[test]
    fn rejects_unknown_dollar_keys() {
        let result = parse(&json!({
            "color": {"$bogus": true, "a": {"$type": "color", "$value": "#000000"}}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_value_with_children() {
        let result = parse(&json!({
            "color": {
                "$type": "color",
                "$value": "#000000",
                "child": {"$value": "#ffffff"}
            }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_type_without_alias_is_an_error() {
        let result = parse(&json!({"naked": {"$value": 12}}));
        assert!(result.is_err());
    }

    #[test]
    fn alias_token_may_omit_type() {
        let map = parse(&json!({
            "semantic": {"bg": {"$value": "{color.neutral.white}"}}
        }))
        .expect("alias without type parses");
        assert!(map.get("semantic.bg").map(|t| t.token_type.is_none()).expect("present"));
    }

    #[test]
    fn case_collision_is_advisory() {
        let (map, warnings) = parse_lenient(&json!({
            "Color": {"$type": "color", "$value": "#000000"},
            "color": {"$type": "color", "$value": "#ffffff"}
        }));
        assert_eq!(map.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("differ only in case")));
    }

    #[test]
    fn lenient_mode_skips_invalid_entries() {
        let (map, warnings) = parse_lenient(&json!({
            "ok": {"$type": "color", "$value": "#000000"},
            "bad.name": {"$type": "color", "$value": "#ffffff"}
        }));
        assert!(map.contains("ok"));
        assert!(!map.contains("bad.name"));
        assert!(!warnings.is_empty());
    }

    #[test]
    fn deprecated_forms() {
        let map = parse(&json!({
            "old": {"$type": "color", "$value": "#000000", "$deprecated": true},
            "older": {"$type": "color", "$value": "#000000", "$deprecated": "use 'new' instead"}
        }))
        .expect("valid document");
        assert!(map.get("old").expect("present").is_deprecated());
        assert_eq!(
            map.get("older").and_then(|t| t.deprecated.as_ref().and_then(Deprecated::reason)),
            Some("use 'new' instead")
        );
    }
}
