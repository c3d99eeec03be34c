//! Resolver documents and the permutation engine.
//!
//! A resolver document declares named token sets, conditional modifiers
//! (theme, density, platform, …), and the order in which they layer. The
//! [`TokenResolver`] turns it into resolved token maps, one per modifier
//! permutation.

pub mod compose;
pub mod modifiers;
pub mod reference;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Deserialize;
use serde_json::Value;

use crate::build::processors::Preprocessor;
use crate::error::TinctureError;
use crate::tokens::TokenMap;
use crate::warnings::WarningSink;
use self::modifiers::ModifierInputs;
use self::reference::{DocumentCache, ReferenceResolver};

/// The resolver document version this engine understands.
pub const RESOLVER_VERSION: &str = "2025.10";

/// A named bundle of token documents loaded together.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSet {
    #[serde(default)]
    pub description: Option<String>,
    pub sources: Vec<Value>,
}

/// A named dimension with alternative contexts, each carrying overlay
/// documents.
#[derive(Debug, Clone, Deserialize)]
pub struct Modifier {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
    pub contexts: IndexMap<String, Vec<Value>>,
}

impl Modifier {
    /// The declared default context, falling back to the first one.
    pub fn default_context(&self) -> Option<&str> {
        self.default
            .as_deref()
            .or_else(|| self.contexts.keys().next().map(String::as_str))
    }
}

/// One entry of `resolutionOrder`: a `{$ref}` into `#/sets/` or
/// `#/modifiers/`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRef {
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// The parsed resolver document.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverDocument {
    pub version: String,
    #[serde(default)]
    pub sets: IndexMap<String, TokenSet>,
    #[serde(default)]
    pub modifiers: IndexMap<String, Modifier>,
    #[serde(rename = "resolutionOrder", default)]
    pub resolution_order: Vec<OrderRef>,
}

impl ResolverDocument {
    /// Deserialize and validate a resolver document value.
    pub fn from_value(value: &Value) -> Result<Self, TinctureError> {
        let document: Self =
            serde_json::from_value(value.clone()).map_err(|error| TinctureError::Validation {
                message: format!("invalid resolver document: {error}"),
            })?;
        document.validate()?;
        Ok(document)
    }

    fn validate(&self) -> Result<(), TinctureError> {
        if self.version != RESOLVER_VERSION {
            return Err(TinctureError::Validation {
                message: format!(
                    "unsupported resolver version '{}', expected '{RESOLVER_VERSION}'",
                    self.version
                ),
            });
        }
        for (name, modifier) in &self.modifiers {
            if modifier.contexts.is_empty() {
                return Err(TinctureError::Validation {
                    message: format!("modifier '{name}' declares no contexts"),
                });
            }
            if let Some(default) = &modifier.default {
                if !modifier.contexts.contains_key(default) {
                    return Err(TinctureError::Validation {
                        message: format!(
                            "modifier '{name}' defaults to unknown context '{default}'"
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// The number of permutations this document produces.
    pub fn permutation_count(&self) -> usize {
        self.modifiers
            .values()
            .map(|modifier| modifier.contexts.len().max(1))
            .product()
    }
}

/// A tuple of (modifier → context) choices and the tokens it resolves to.
#[derive(Debug, Clone)]
pub struct Permutation {
    pub modifier_inputs: ModifierInputs,
    pub tokens: TokenMap,
}

impl Permutation {
    /// Whether every modifier is at its default context.
    pub fn is_base(&self, document: &ResolverDocument) -> bool {
        self.modifier_inputs.iter().all(|(name, context)| {
            document
                .modifiers
                .get(name)
                .and_then(Modifier::default_context)
                .is_some_and(|default| default == context)
        })
    }
}

/// Resolves a [`ResolverDocument`] into per-permutation token maps.
pub struct TokenResolver {
    document: ResolverDocument,
    references: ReferenceResolver,
    preprocessors: Vec<Rc<dyn Preprocessor>>,
}

impl TokenResolver {
    pub fn new(
        document: ResolverDocument,
        base_dir: impl Into<PathBuf>,
        cache: DocumentCache,
    ) -> Result<Self, TinctureError> {
        document.validate()?;
        Ok(Self {
            references: ReferenceResolver::new(base_dir, cache),
            document,
            preprocessors: Vec::new(),
        })
    }

    /// Install build-level preprocessors, applied to every raw document
    /// before parsing.
    pub fn set_preprocessors(&mut self, preprocessors: Vec<Rc<dyn Preprocessor>>) {
        self.preprocessors = preprocessors;
    }

    /// Load a resolver document from disk; file references resolve
    /// against its parent directory.
    pub fn from_file(path: &Path, cache: DocumentCache) -> Result<Self, TinctureError> {
        let base_dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let references = ReferenceResolver::new(base_dir, cache);
        let loaded = references.load_file(path)?;
        let document = ResolverDocument::from_value(&loaded.value)?;
        Ok(Self {
            document,
            references,
            preprocessors: Vec::new(),
        })
    }

    pub fn document(&self) -> &ResolverDocument {
        &self.document
    }

    pub fn references(&self) -> &ReferenceResolver {
        &self.references
    }

    /// Resolve the token map for one set of modifier inputs.
    pub fn resolve_tokens(
        &self,
        inputs: &ModifierInputs,
        sink: &mut WarningSink,
    ) -> Result<TokenMap, TinctureError> {
        let prepared = modifiers::prepare(&self.document, inputs, sink)?;
        compose::compose(
            &self.document,
            &prepared.resolved,
            &self.references,
            &self.preprocessors,
            sink,
        )
    }

    /// Resolve the base permutation (every modifier at its default).
    pub fn resolve_base(&self, sink: &mut WarningSink) -> Result<Permutation, TinctureError> {
        let inputs = self.default_inputs()?;
        let tokens = self.resolve_tokens(&inputs, sink)?;
        Ok(Permutation {
            modifier_inputs: inputs,
            tokens,
        })
    }

    /// Enumerate the Cartesian product of modifier contexts, in modifier
    /// declaration order, and resolve each permutation.
    ///
    /// The base permutation is always index 0. Every physical document
    /// is read and parsed at most once per build via the shared cache.
    pub fn resolve_all_permutations(
        &self,
        sink: &mut WarningSink,
    ) -> Result<Vec<Permutation>, TinctureError> {
        let axes = self.axes()?;
        if axes.is_empty() {
            return Ok(vec![Permutation {
                modifier_inputs: IndexMap::new(),
                tokens: self.resolve_tokens(&IndexMap::new(), sink)?,
            }]);
        }

        let mut permutations = Vec::new();
        for combo in axes.into_iter().map(Vec::into_iter).multi_cartesian_product() {
            let inputs: ModifierInputs = combo.into_iter().collect();
            tracing::debug!(?inputs, "resolving permutation");
            let tokens = self.resolve_tokens(&inputs, sink)?;
            permutations.push(Permutation {
                modifier_inputs: inputs,
                tokens,
            });
        }
        Ok(permutations)
    }

    /// All modifiers at their default context.
    pub fn default_inputs(&self) -> Result<ModifierInputs, TinctureError> {
        self.document
            .modifiers
            .iter()
            .map(|(name, modifier)| {
                modifier
                    .default_context()
                    .map(|context| (name.clone(), context.to_string()))
                    .ok_or_else(|| TinctureError::BasePermutation {
                        message: format!("modifier '{name}' declares no contexts"),
                    })
            })
            .collect()
    }

    /// Per-modifier context lists with the default context first, so the
    /// all-defaults tuple enumerates first.
    fn axes(&self) -> Result<Vec<Vec<(String, String)>>, TinctureError> {
        self.document
            .modifiers
            .iter()
            .map(|(name, modifier)| {
                let default = modifier.default_context().ok_or_else(|| {
                    TinctureError::BasePermutation {
                        message: format!("modifier '{name}' declares no contexts"),
                    }
                })?;
                let default = default.to_string();
                let mut contexts: Vec<String> = modifier.contexts.keys().cloned().collect();
                contexts.sort_by_key(|context| *context != default);
                Ok(contexts
                    .into_iter()
                    .map(|context| (name.clone(), context))
                    .collect())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warnings::ValidationMode;
    use serde_json::json;

    fn two_theme_resolver() -> Value {
        json!({
            "version": "2025.10",
            "sets": {
                "base": {
                    "sources": [{
                        "color": {
                            "$type": "color",
                            "neutral": {
                                "white": {"$value": {"colorSpace": "srgb", "components": [1, 1, 1]}},
                                "black": {"$value": {"colorSpace": "srgb", "components": [0, 0, 0]}}
                            },
                            "brand": {
                                "primary": {"$value": {"colorSpace": "srgb", "components": [0, 0.4, 0.8]}},
                                "secondary": {"$value": {"colorSpace": "srgb", "components": [0.4, 0.2, 0.6]}}
                            }
                        }
                    }]
                }
            },
            "modifiers": {
                "theme": {
                    "default": "light",
                    "contexts": {
                        "light": [{
                            "semantic": {"background": {"$type": "color", "$value": "{color.neutral.white}"}}
                        }],
                        "dark": [{
                            "semantic": {"background": {"$type": "color", "$value": "{color.neutral.black}"}}
                        }]
                    }
                }
            },
            "resolutionOrder": [
                {"$ref": "#/sets/base"},
                {"$ref": "#/modifiers/theme"}
            ]
        })
    }

    fn resolver_for(value: &Value) -> TokenResolver {
        let document = ResolverDocument::from_value(value).expect("valid resolver");
        let dir = std::env::temp_dir();
        TokenResolver::new(document, dir, DocumentCache::new()).expect("valid")
    }

    #[test]
    fn version_is_enforced() {
        let result = ResolverDocument::from_value(&json!({
            "version": "1.0",
            "resolutionOrder": []
        }));
        assert!(matches!(result, Err(TinctureError::Validation { .. })));
    }

    #[test]
    fn two_permutations_with_correct_overlays() {
        let resolver = resolver_for(&two_theme_resolver());
        let mut sink = WarningSink::new(ValidationMode::Error);
        let permutations = resolver
            .resolve_all_permutations(&mut sink)
            .expect("resolves");

        assert_eq!(permutations.len(), 2);
        assert!(permutations[0].is_base(resolver.document()));
        assert_eq!(
            permutations[0].modifier_inputs.get("theme").map(String::as_str),
            Some("light")
        );

        let dark = &permutations[1];
        assert_eq!(dark.modifier_inputs.get("theme").map(String::as_str), Some("dark"));
        let background = dark.tokens.get("semantic.background").expect("present");
        assert_eq!(
            background.value,
            json!({"colorSpace": "srgb", "components": [0, 0, 0]})
        );
        assert_eq!(background.source_modifier.as_deref(), Some("theme"));
    }

    #[test]
    fn permutation_count_is_product_of_contexts() {
        let mut value = two_theme_resolver();
        value["modifiers"]["density"] = json!({
            "contexts": {
                "regular": [{}],
                "compact": [{}],
                "spacious": [{}]
            }
        });
        let resolver = resolver_for(&value);
        let mut sink = WarningSink::new(ValidationMode::Error);
        let permutations = resolver
            .resolve_all_permutations(&mut sink)
            .expect("resolves");
        assert_eq!(permutations.len(), 6);
        assert_eq!(resolver.document().permutation_count(), 6);

        // Every tuple is unique.
        let mut seen = std::collections::HashSet::new();
        for permutation in &permutations {
            let key = format!("{:?}", permutation.modifier_inputs);
            assert!(seen.insert(key), "duplicate permutation");
        }
    }

    #[test]
    fn non_first_default_still_enumerates_base_first() {
        let mut value = two_theme_resolver();
        value["modifiers"]["theme"]["default"] = json!("dark");
        let resolver = resolver_for(&value);
        let mut sink = WarningSink::new(ValidationMode::Error);
        let permutations = resolver
            .resolve_all_permutations(&mut sink)
            .expect("resolves");
        assert_eq!(
            permutations[0].modifier_inputs.get("theme").map(String::as_str),
            Some("dark")
        );
    }

    #[test]
    fn unknown_default_context_is_invalid() {
        let mut value = two_theme_resolver();
        value["modifiers"]["theme"]["default"] = json!("midnight");
        assert!(ResolverDocument::from_value(&value).is_err());
    }
}
