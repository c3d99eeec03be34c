//! Renderer dispatch: the [`Renderer`] trait, render contexts, and the
//! built-in renderer registry.
//!
//! A renderer is a single-operation object: `format(context)` returns a
//! [`FileTree`]. Built-ins and user-supplied renderers are
//! indistinguishable at the dispatch site.

pub mod android;
pub mod css;
pub mod ios;
pub mod js;
pub mod json;
pub mod tailwind;

use std::collections::BTreeMap;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::build::output::OutputConfig;
use crate::error::TinctureError;
use crate::resolver::ResolverDocument;
use crate::resolver::modifiers::ModifierInputs;
use crate::support::{casing, color, dimension, refs};
use crate::tokens::{ResolvedToken, TokenMap, types};

/// Rendered files: relative path → UTF-8 content. Path-sorted so
/// traversal is deterministic.
pub type FileTree = BTreeMap<String, String>;

/// One permutation as seen by a renderer, after the processor chain.
#[derive(Debug, Clone)]
pub struct PermutationView {
    pub modifier_inputs: ModifierInputs,
    pub tokens: TokenMap,
    pub is_base: bool,
}

/// Everything a renderer invocation can see.
pub struct RenderContext<'a> {
    pub descriptor: &'a OutputConfig,
    pub document: &'a ResolverDocument,
    /// Per preset: all permutations (`bundle`), base + one overlay
    /// (`modifier`), or exactly one (`standalone`).
    pub permutations: &'a [PermutationView],
    /// The resolved primary output file name.
    pub file: &'a str,
    pub options: &'a Value,
}

/// Emits one or more files for a render invocation.
pub trait Renderer {
    fn name(&self) -> &str;
    /// Default output file name when the descriptor omits `file`.
    fn default_file(&self, inputs: &ModifierInputs) -> String;
    fn format(&self, context: &RenderContext<'_>) -> Result<FileTree, TinctureError>;
}

/// The built-in renderer registry, keyed by renderer name.
pub fn builtin_renderers() -> IndexMap<String, Rc<dyn Renderer>> {
    let renderers: Vec<Rc<dyn Renderer>> = vec![
        Rc::new(css::CssRenderer),
        Rc::new(json::JsonRenderer),
        Rc::new(js::JsRenderer),
        Rc::new(tailwind::TailwindRenderer),
        Rc::new(ios::IosRenderer),
        Rc::new(android::AndroidRenderer),
    ];
    renderers
        .into_iter()
        .map(|renderer| (renderer.name().to_string(), renderer))
        .collect()
}

/// Tokens of `overlay` that are new or differ from `base` by value or
/// type.
pub fn delta(base: &TokenMap, overlay: &TokenMap) -> TokenMap {
    overlay
        .iter()
        .filter(|token| {
            base.get(&token.name).is_none_or(|existing| {
                existing.value != token.value || existing.token_type != token.token_type
            })
        })
        .cloned()
        .collect()
}

/// Look up the post-transform name of the token whose *original* dotted
/// name is `target` (name transforms rename `name` but keep `path`).
pub fn reference_name(tokens: &TokenMap, target: &str) -> Option<String> {
    tokens
        .iter()
        .find(|token| token.path.join(".") == target)
        .map(|token| token.name.clone())
}

/// `.dark.compact`-style file suffix from a permutation's contexts.
pub(crate) fn file_suffix(inputs: &ModifierInputs) -> String {
    let contexts: Vec<String> = inputs.values().map(|context| context.to_lowercase()).collect();
    if contexts.is_empty() {
        String::new()
    } else {
        format!(".{}", contexts.join("."))
    }
}

/// Non-default (modifier, context) pairs of a permutation.
pub(crate) fn non_default_inputs<'a>(
    document: &'a ResolverDocument,
    inputs: &'a ModifierInputs,
) -> Vec<(&'a str, &'a str)> {
    inputs
        .iter()
        .filter(|(name, context)| {
            document
                .modifiers
                .get(name.as_str())
                .and_then(crate::resolver::Modifier::default_context)
                .is_none_or(|default| default != context.as_str())
        })
        .map(|(name, context)| (name.as_str(), context.as_str()))
        .collect()
}

/// The permutation where `modifier` is at `context` and every other
/// modifier sits at its default.
pub(crate) fn single_modifier_view<'a>(
    render: &'a RenderContext<'_>,
    modifier: &str,
    context: &str,
) -> Option<&'a PermutationView> {
    render.permutations.iter().find(|view| {
        view.modifier_inputs.iter().all(|(name, selected)| {
            if name == modifier {
                selected == context
            } else {
                render
                    .document
                    .modifiers
                    .get(name)
                    .and_then(crate::resolver::Modifier::default_context)
                    .is_some_and(|default| default == selected)
            }
        })
    })
}

/// Format a token value as CSS declaration text.
///
/// Alias values (preserved references) become `var(--…)` indirections;
/// typed values get their canonical CSS spelling; anything else falls
/// back to its JSON rendering.
pub(crate) fn css_value(token: &ResolvedToken, tokens: &TokenMap) -> String {
    if let Some(target) = refs::alias_target(&token.value) {
        let name = reference_name(tokens, target).unwrap_or_else(|| target.to_string());
        return format!("var(--{})", casing::to_kebab_case(&name));
    }

    match token.token_type.as_deref() {
        Some("color") => color::rgba_from_value(&token.value)
            .map(color::to_hex)
            .unwrap_or_else(|_| plain_value(&token.value)),
        Some("dimension") => dimension::parse_dimension(&token.value)
            .map(|d| d.to_string())
            .unwrap_or_else(|_| plain_value(&token.value)),
        Some("fontFamily") => font_family_value(&token.value),
        Some("fontWeight") => types::font_weight_to_number(&token.value)
            .map(|weight| color::format_channel(weight))
            .unwrap_or_else(|_| plain_value(&token.value)),
        Some("duration") => duration_value(&token.value),
        _ => plain_value(&token.value),
    }
}

fn font_family_value(value: &Value) -> String {
    let quote = |family: &str| {
        if family.contains(' ') {
            format!("\"{family}\"")
        } else {
            family.to_string()
        }
    };
    match value {
        Value::String(family) => quote(family),
        Value::Array(families) => families
            .iter()
            .filter_map(Value::as_str)
            .map(quote)
            .collect::<Vec<_>>()
            .join(", "),
        other => plain_value(other),
    }
}

fn duration_value(value: &Value) -> String {
    let Some(obj) = value.as_object() else {
        return plain_value(value);
    };
    match (obj.get("value").and_then(Value::as_f64), obj.get("unit").and_then(Value::as_str)) {
        (Some(amount), Some(unit)) => format!("{}{unit}", color::format_channel(amount)),
        _ => plain_value(value),
    }
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token(name: &str, token_type: Option<&str>, value: Value) -> ResolvedToken {
        let mut t = ResolvedToken::new(name.split('.').map(str::to_string).collect(), value);
        t.token_type = token_type.map(str::to_string);
        t
    }

    #[test]
    fn delta_keeps_new_and_changed_tokens() {
        let base: TokenMap = vec![
            token("a", Some("color"), json!("#ffffff")),
            token("b", Some("color"), json!("#000000")),
        ]
        .into_iter()
        .collect();
        let overlay: TokenMap = vec![
            token("a", Some("color"), json!("#ffffff")),
            token("b", Some("color"), json!("#111111")),
            token("c", Some("color"), json!("#222222")),
        ]
        .into_iter()
        .collect();
        let diff = delta(&base, &overlay);
        assert_eq!(diff.names(), vec!["b", "c"]);
    }

    #[test]
    fn css_values_by_type() {
        let tokens = TokenMap::new();
        assert_eq!(
            css_value(
                &token("c", Some("color"), json!({"colorSpace": "srgb", "components": [0, 0.4, 0.8]})),
                &tokens
            ),
            "#0066cc"
        );
        assert_eq!(
            css_value(&token("d", Some("dimension"), json!({"value": 16, "unit": "px"})), &tokens),
            "16px"
        );
        assert_eq!(
            css_value(
                &token("f", Some("fontFamily"), json!(["Inter", "Helvetica Neue", "sans-serif"])),
                &tokens
            ),
            "Inter, \"Helvetica Neue\", sans-serif"
        );
        assert_eq!(
            css_value(&token("w", Some("fontWeight"), json!("semi-bold")), &tokens),
            "600"
        );
        assert_eq!(
            css_value(&token("t", Some("duration"), json!({"value": 300, "unit": "ms"})), &tokens),
            "300ms"
        );
    }

    #[test]
    fn alias_value_emits_var_reference() {
        let mut target = token("color.brand.primary", Some("color"), json!("#0066cc"));
        // Simulate a rename transform having run.
        target.name = "color-brand-primary".to_string();
        let tokens: TokenMap = vec![target].into_iter().collect();
        let alias = token("semantic.accent", Some("color"), json!("{color.brand.primary}"));
        assert_eq!(css_value(&alias, &tokens), "var(--color-brand-primary)");
    }

    #[test]
    fn registry_contains_all_builtins() {
        let registry = builtin_renderers();
        for name in ["css", "json", "js", "tailwind", "ios", "android"] {
            assert!(registry.contains_key(name), "missing renderer '{name}'");
        }
    }
}
