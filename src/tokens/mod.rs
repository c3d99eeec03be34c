//! The resolved-token data model.
//!
//! A [`ResolvedToken`] is the central record of the pipeline: parsing
//! flattens DTCG groups into them, composition layers them, and every
//! downstream consumer (transforms, renderers, lint rules) reads them.

pub mod alias;
pub mod parser;
pub mod types;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// `$deprecated` marker: a bare flag or a reason string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Deprecated {
    Flag(bool),
    Reason(String),
}

impl Deprecated {
    pub fn is_active(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Reason(_) => true,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Flag(_) => None,
            Self::Reason(reason) => Some(reason),
        }
    }
}

/// A flattened, resolved design token.
///
/// Fields outside the serialized surface (`is_alias`, `source_set`,
/// `source_modifier`) are internal metadata and are stripped before the
/// token is exposed to user renderers or persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedToken {
    pub name: String,
    pub path: Vec<String>,
    #[serde(rename = "$type")]
    pub token_type: Option<String>,
    #[serde(rename = "$value")]
    pub value: Value,
    /// The pre-transform value; for aliases, the literal `{…}` string.
    pub original_value: Value,
    #[serde(rename = "$description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "$deprecated", skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,
    #[serde(skip)]
    pub is_alias: bool,
    #[serde(skip)]
    pub source_set: Option<String>,
    #[serde(skip)]
    pub source_modifier: Option<String>,
}

impl ResolvedToken {
    /// A minimal token for construction sites that fill fields
    /// incrementally.
    pub fn new(path: Vec<String>, value: Value) -> Self {
        Self {
            name: path.join("."),
            path,
            token_type: None,
            original_value: value.clone(),
            value,
            description: None,
            deprecated: None,
            is_alias: false,
            source_set: None,
            source_modifier: None,
        }
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated.as_ref().is_some_and(Deprecated::is_active)
    }
}

/// A flat map from token name to resolved token.
///
/// Insertion order is an internal detail; every public traversal yields
/// tokens in ascending case-insensitive name order (raw name as
/// tie-break) so emitted artifacts are deterministic.
#[derive(Debug, Clone, Default)]
pub struct TokenMap {
    entries: IndexMap<String, ResolvedToken>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: ResolvedToken) -> Option<ResolvedToken> {
        self.entries.insert(token.name.clone(), token)
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedToken> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ResolvedToken> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ResolvedToken> {
        self.entries.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Token names in traversal order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then(a.cmp(b)));
        names
    }

    /// Tokens in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedToken> {
        self.names()
            .into_iter()
            .filter_map(|name| self.entries.get(name))
    }
}

/// Reconstruct a minimal nested group structure from a flat map.
///
/// Parsing the result back recovers the same resolved map (alias values
/// have already been substituted, so no references remain). Tokens whose
/// name is a prefix of another token's group become that group's `$root`.
pub fn to_nested_document(map: &TokenMap) -> Value {
    let mut root = Value::Object(serde_json::Map::new());
    for token in map.iter() {
        let mut leaf = serde_json::Map::new();
        if let Some(token_type) = &token.token_type {
            leaf.insert("$type".to_string(), Value::String(token_type.clone()));
        }
        leaf.insert("$value".to_string(), token.value.clone());
        if let Some(description) = &token.description {
            leaf.insert("$description".to_string(), Value::String(description.clone()));
        }
        if let Some(deprecated) = &token.deprecated {
            let marker = serde_json::to_value(deprecated).unwrap_or(Value::Bool(true));
            leaf.insert("$deprecated".to_string(), marker);
        }
        insert_nested(&mut root, &token.path, Value::Object(leaf));
    }
    root
}

fn insert_nested(root: &mut Value, path: &[String], leaf: Value) {
    let mut node = root;
    let Some((last, parents)) = path.split_last() else { return };
    for segment in parents {
        let obj = match node.as_object_mut() {
            Some(obj) => obj,
            None => return,
        };
        let child = obj
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        // A token already sits where a group must go: demote it to $root.
        if child.as_object().is_some_and(|o| o.contains_key("$value")) {
            let token = std::mem::replace(child, Value::Object(serde_json::Map::new()));
            if let Some(group) = child.as_object_mut() {
                group.insert("$root".to_string(), token);
            }
        }
        node = child;
    }
    let Some(obj) = node.as_object_mut() else { return };
    match obj.get_mut(last) {
        // A group already exists under this name: the token is its $root.
        Some(Value::Object(group)) if !group.contains_key("$value") => {
            group.insert("$root".to_string(), leaf);
        }
        _ => {
            obj.insert(last.clone(), leaf);
        }
    }
}

impl FromIterator<ResolvedToken> for TokenMap {
    fn from_iter<I: IntoIterator<Item = ResolvedToken>>(iter: I) -> Self {
        let mut map = Self::new();
        for token in iter {
            map.insert(token);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token(name: &str) -> ResolvedToken {
        ResolvedToken::new(name.split('.').map(str::to_string).collect(), json!("#fff"))
    }

    #[test]
    fn traversal_is_case_insensitive_sorted() {
        let mut map = TokenMap::new();
        map.insert(token("zebra"));
        map.insert(token("Apple"));
        map.insert(token("apple.pie"));
        let names: Vec<&str> = map.names();
        assert_eq!(names, vec!["Apple", "apple.pie", "zebra"]);
    }

    #[test]
    fn insert_replaces_by_name() {
        let mut map = TokenMap::new();
        map.insert(token("color.bg"));
        let mut second = token("color.bg");
        second.value = json!("#000");
        map.insert(second);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("color.bg").map(|t| &t.value), Some(&json!("#000")));
    }

    #[test]
    fn nested_document_round_trips() {
        use crate::warnings::{ValidationMode, WarningSink};

        let mut map = TokenMap::new();
        let mut bg = token("color.bg");
        bg.token_type = Some("color".to_string());
        map.insert(bg);
        let mut group_root = token("color");
        group_root.token_type = Some("color".to_string());
        map.insert(group_root);

        let nested = to_nested_document(&map);
        assert!(nested["color"]["$root"]["$value"].is_string());

        let mut sink = WarningSink::new(ValidationMode::Error);
        let reparsed = crate::tokens::parser::parse_document(&nested, &mut sink)
            .expect("nested document parses");
        assert_eq!(reparsed.names(), map.names());
        for name in map.names() {
            assert_eq!(
                reparsed.get(name).map(|t| &t.value),
                map.get(name).map(|t| &t.value)
            );
        }
    }

    #[test]
    fn internal_metadata_is_not_serialized() {
        let mut t = token("color.bg");
        t.is_alias = true;
        t.source_set = Some("base".to_string());
        let json = serde_json::to_value(&t).expect("serializable");
        assert!(json.get("is_alias").is_none());
        assert!(json.get("source_set").is_none());
        assert!(json.get("$value").is_some());
    }
}
