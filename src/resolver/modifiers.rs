//! Modifier-input processing: normalization, defaulting, validation,
//! and re-casing against the resolver's declarations.

use indexmap::IndexMap;

use crate::error::TinctureError;
use crate::resolver::ResolverDocument;
use crate::support::suggest;
use crate::warnings::{TinctureWarning, ValidationMode, WarningSink};

/// User modifier inputs, keyed modifier name → context name.
pub type ModifierInputs = IndexMap<String, String>;

/// The two forms produced by [`prepare`]: lowercased, and re-cased to
/// match the resolver's declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedInputs {
    pub normalized: ModifierInputs,
    pub resolved: ModifierInputs,
}

/// Normalize, default, validate, and re-case modifier inputs.
///
/// Unknown modifiers and contexts are errors in `error` mode; in `warn`
/// mode they are reported and the lenient fallback applies (unknown
/// modifiers ignored, unknown contexts replaced by the default).
pub fn prepare(
    document: &ResolverDocument,
    inputs: &ModifierInputs,
    sink: &mut WarningSink,
) -> Result<PreparedInputs, TinctureError> {
    if document.modifiers.is_empty() && !inputs.is_empty() {
        return Err(TinctureError::Modifier {
            message: "No modifiers defined".to_string(),
            suggestions: String::new(),
        });
    }

    // Lowercase both sides of every supplied entry.
    let mut normalized: ModifierInputs = IndexMap::new();
    for (name, context) in inputs {
        let key = name.to_lowercase();
        let value = context.to_lowercase();

        let known = document
            .modifiers
            .keys()
            .any(|declared| declared.to_lowercase() == key);
        if !known {
            if sink.mode() == ValidationMode::Error {
                let candidates: Vec<&str> =
                    document.modifiers.keys().map(String::as_str).collect();
                return Err(TinctureError::Modifier {
                    message: format!("unknown modifier '{name}'"),
                    suggestions: suggest::did_you_mean(&key, candidates),
                });
            }
            sink.report(TinctureWarning::UnknownModifier { name: name.clone() })?;
            continue;
        }
        normalized.insert(key, value);
    }

    // Fill every declared modifier, defaulting missing entries, and
    // re-case to the declared spelling.
    let mut filled: ModifierInputs = IndexMap::new();
    let mut resolved: ModifierInputs = IndexMap::new();
    for (declared_name, modifier) in &document.modifiers {
        let key = declared_name.to_lowercase();
        let default_context = modifier.default_context().ok_or_else(|| {
            TinctureError::Validation {
                message: format!("modifier '{declared_name}' declares no contexts"),
            }
        })?;

        let requested = normalized
            .get(&key)
            .cloned()
            .unwrap_or_else(|| default_context.to_lowercase());

        let declared_context = modifier
            .contexts
            .keys()
            .find(|context| context.to_lowercase() == requested);
        let context = match declared_context {
            Some(context) => context.clone(),
            None => {
                if sink.mode() == ValidationMode::Error {
                    let candidates: Vec<&str> =
                        modifier.contexts.keys().map(String::as_str).collect();
                    return Err(TinctureError::Modifier {
                        message: format!(
                            "unknown context '{requested}' for modifier '{declared_name}'"
                        ),
                        suggestions: suggest::did_you_mean(&requested, candidates),
                    });
                }
                sink.report(TinctureWarning::UnknownContext {
                    modifier: declared_name.clone(),
                    context: requested.clone(),
                })?;
                default_context.to_string()
            }
        };

        filled.insert(key, context.to_lowercase());
        resolved.insert(declared_name.clone(), context);
    }

    Ok(PreparedInputs {
        normalized: filled,
        resolved,
    })
}
