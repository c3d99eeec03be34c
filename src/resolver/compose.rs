//! Composition of sets and modifier overlays in `resolutionOrder`.

use std::rc::Rc;

use serde_json::Value;

use crate::build::processors::Preprocessor;
use crate::error::TinctureError;
use crate::resolver::ResolverDocument;
use crate::resolver::modifiers::ModifierInputs;
use crate::resolver::reference::{LoadedDocument, ReferenceResolver};
use crate::tokens::{TokenMap, alias, parser};
use crate::warnings::WarningSink;

/// Which `resolutionOrder` entry a document belongs to, for stamping.
#[derive(Debug, Clone, Copy)]
enum Layer<'a> {
    Set(&'a str),
    Modifier(&'a str),
}

/// Compose the token maps of every `resolutionOrder` entry, later
/// entries winning on identical names, then resolve aliases across the
/// accumulated map.
pub fn compose(
    document: &ResolverDocument,
    resolved_inputs: &ModifierInputs,
    references: &ReferenceResolver,
    preprocessors: &[Rc<dyn Preprocessor>],
    sink: &mut WarningSink,
) -> Result<TokenMap, TinctureError> {
    let mut accumulator = TokenMap::new();

    for entry in &document.resolution_order {
        let reference = entry.reference.as_str();
        if let Some(set_name) = reference.strip_prefix("#/sets/") {
            let set = document.sets.get(set_name).ok_or_else(|| {
                TinctureError::RefNotFound {
                    reference: reference.to_string(),
                }
            })?;
            merge_sources(
                &set.sources,
                Layer::Set(set_name),
                &mut accumulator,
                references,
                preprocessors,
                sink,
            )?;
        } else if let Some(modifier_name) = reference.strip_prefix("#/modifiers/") {
            let modifier = document.modifiers.get(modifier_name).ok_or_else(|| {
                TinctureError::RefNotFound {
                    reference: reference.to_string(),
                }
            })?;
            let Some(context) = resolved_inputs.get(modifier_name) else {
                return Err(TinctureError::BasePermutation {
                    message: format!("no context selected for modifier '{modifier_name}'"),
                });
            };
            let sources = modifier.contexts.get(context).ok_or_else(|| {
                TinctureError::BasePermutation {
                    message: format!(
                        "modifier '{modifier_name}' has no context '{context}'"
                    ),
                }
            })?;
            merge_sources(
                sources,
                Layer::Modifier(modifier_name),
                &mut accumulator,
                references,
                preprocessors,
                sink,
            )?;
        } else {
            return Err(TinctureError::Validation {
                message: format!(
                    "resolutionOrder entry '{reference}' must point at #/sets/ or #/modifiers/"
                ),
            });
        }
    }

    alias::resolve_aliases(&mut accumulator, sink)?;
    Ok(accumulator)
}

/// Load, `$ref`-resolve, parse, and merge one entry's source documents.
fn merge_sources(
    sources: &[Value],
    layer: Layer<'_>,
    accumulator: &mut TokenMap,
    references: &ReferenceResolver,
    preprocessors: &[Rc<dyn Preprocessor>],
    sink: &mut WarningSink,
) -> Result<(), TinctureError> {
    for source in sources {
        let loaded = load_source(source, references)?;
        let mut resolved = references.resolve_deep(&loaded.value, Some(&loaded))?;
        for preprocessor in preprocessors {
            resolved = preprocessor.run(&resolved)?;
        }
        let flat = parser::parse_document(&resolved, sink)?;
        merge_layer(accumulator, flat, layer);
    }
    Ok(())
}

/// A source is either an inline token document or a `{$ref}` to one.
fn load_source(
    source: &Value,
    references: &ReferenceResolver,
) -> Result<LoadedDocument, TinctureError> {
    let reference = source
        .as_object()
        .and_then(|obj| obj.get("$ref"))
        .and_then(Value::as_str);
    match reference {
        Some(path) if !path.starts_with('#') => {
            let (file_part, _) = path.split_once('#').unwrap_or((path, ""));
            let loaded = references.load_file(std::path::Path::new(file_part))?;
            // Re-resolve through the full grammar so fragments apply.
            let value = references.resolve(source, Some(&loaded))?;
            Ok(LoadedDocument {
                value: std::rc::Rc::new(value),
                path: loaded.path,
            })
        }
        Some(_) => Err(TinctureError::Validation {
            message: "set sources must be inline documents or file references".to_string(),
        }),
        None => Ok(LoadedDocument::inline(source.clone())),
    }
}

/// Shallow merge of a layer's flat map into the accumulator.
///
/// Later entries win on identical names; the overriding token inherits
/// missing `$type`/`$description` from the token it replaces, and the
/// layer stamp always records the latest contributor.
fn merge_layer(accumulator: &mut TokenMap, overlay: TokenMap, layer: Layer<'_>) {
    for mut token in overlay.iter().cloned().collect::<Vec<_>>() {
        match layer {
            Layer::Set(name) => {
                token.source_set = Some(name.to_string());
                token.source_modifier = None;
            }
            Layer::Modifier(name) => {
                token.source_modifier = Some(name.to_string());
                token.source_set = None;
            }
        }
        if let Some(base) = accumulator.get(&token.name) {
            if token.token_type.is_none() {
                token.token_type = base.token_type.clone();
            }
            if token.description.is_none() {
                token.description = base.description.clone();
            }
        }
        accumulator.insert(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::reference::DocumentCache;
    use crate::resolver::{OrderRef, TokenSet};
    use crate::warnings::ValidationMode;
    use indexmap::IndexMap;
    use serde_json::json;

    fn resolver_doc(sets: Vec<(&str, Value)>, order: Vec<&str>) -> ResolverDocument {
        let sets = sets
            .into_iter()
            .map(|(name, doc)| {
                (
                    name.to_string(),
                    TokenSet {
                        description: None,
                        sources: vec![doc],
                    },
                )
            })
            .collect();
        ResolverDocument {
            version: "2025.10".to_string(),
            sets,
            modifiers: IndexMap::new(),
            resolution_order: order
                .into_iter()
                .map(|reference| OrderRef {
                    reference: reference.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn later_entries_override_and_restamp() {
        let doc = resolver_doc(
            vec![
                ("base", json!({"color": {"$type": "color", "bg": {"$value": "#ffffff"}}})),
                ("brand", json!({"color": {"$type": "color", "bg": {"$value": "#0066cc"}}})),
            ],
            vec!["#/sets/base", "#/sets/brand"],
        );
        let dir = tempfile::tempdir().expect("tempdir");
        let references = ReferenceResolver::new(dir.path(), DocumentCache::new());
        let mut sink = WarningSink::new(ValidationMode::Error);
        let map = compose(&doc, &IndexMap::new(), &references, &[], &mut sink).expect("composes");

        let bg = map.get("color.bg").expect("present");
        assert_eq!(bg.value, json!("#0066cc"));
        assert_eq!(bg.source_set.as_deref(), Some("brand"));
    }

    #[test]
    fn override_inherits_type_and_description() {
        let doc = resolver_doc(
            vec![
                (
                    "base",
                    json!({"color": {"$type": "color", "bg": {
                        "$value": "#ffffff", "$description": "Page background"
                    }}}),
                ),
                // Override without $type or $description at the group level.
                ("dark", json!({"color": {"bg": {"$value": "{color.black}", "$type": "color"},
                                 "black": {"$type": "color", "$value": "#000000"}}})),
            ],
            vec!["#/sets/base", "#/sets/dark"],
        );
        let dir = tempfile::tempdir().expect("tempdir");
        let references = ReferenceResolver::new(dir.path(), DocumentCache::new());
        let mut sink = WarningSink::new(ValidationMode::Error);
        let map = compose(&doc, &IndexMap::new(), &references, &[], &mut sink).expect("composes");

        let bg = map.get("color.bg").expect("present");
        assert_eq!(bg.description.as_deref(), Some("Page background"));
        assert_eq!(bg.value, json!("#000000"));
        assert!(bg.is_alias);
    }

    #[test]
    fn unknown_order_reference_errors() {
        let doc = resolver_doc(vec![], vec!["#/sets/ghost"]);
        let dir = tempfile::tempdir().expect("tempdir");
        let references = ReferenceResolver::new(dir.path(), DocumentCache::new());
        let mut sink = WarningSink::new(ValidationMode::Error);
        assert!(matches!(
            compose(&doc, &IndexMap::new(), &references, &[], &mut sink),
            Err(TinctureError::RefNotFound { .. })
        ));
    }

    #[test]
    fn malformed_order_reference_errors() {
        let doc = resolver_doc(vec![], vec!["#/elsewhere/x"]);
        let dir = tempfile::tempdir().expect("tempdir");
        let references = ReferenceResolver::new(dir.path(), DocumentCache::new());
        let mut sink = WarningSink::new(ValidationMode::Error);
        assert!(matches!(
            compose(&doc, &IndexMap::new(), &references, &[], &mut sink),
            Err(TinctureError::Validation { .. })
        ));
    }
}
