//! CSS custom-property renderer.
//!
//! `bundle` emits one file: a base selector plus one
//! `[data-<modifier>="<context>"]` block per (modifier, context) pair
//! containing that context's contributed tokens. `standalone` emits the
//! whole permutation under the base selector; `modifier` emits the delta
//! against base under the permutation's non-default attribute selectors.

use serde_json::Value;

use crate::error::TinctureError;
use crate::render::{
    FileTree, PermutationView, RenderContext, Renderer, css_value, delta, file_suffix,
    non_default_inputs, single_modifier_view,
};
use crate::resolver::modifiers::ModifierInputs;
use crate::support::casing;
use crate::tokens::TokenMap;
use crate::build::output::Preset;

pub struct CssRenderer;

const DEFAULT_SELECTOR: &str = ":root";
const DEFAULT_INDENT: &str = "  ";

impl Renderer for CssRenderer {
    fn name(&self) -> &str {
        "css"
    }

    fn default_file(&self, inputs: &ModifierInputs) -> String {
        format!("tokens{}.css", file_suffix(inputs))
    }

    fn format(&self, context: &RenderContext<'_>) -> Result<FileTree, TinctureError> {
        let selector = context
            .options
            .get("selector")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SELECTOR);
        let indent = context
            .options
            .get("indent")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_INDENT);

        let mut out = String::new();
        match context.descriptor.preset {
            Preset::Bundle => format_bundle(context, selector, indent, &mut out)?,
            Preset::Standalone => {
                let view = single_view(context)?;
                write_block(&mut out, selector, &view.tokens, &view.tokens, indent);
            }
            Preset::Modifier => {
                let (base, overlay) = base_and_overlay(context)?;
                let changed = delta(&base.tokens, &overlay.tokens);
                let selector = overlay_selector(context, &overlay.modifier_inputs)
                    .unwrap_or_else(|| selector.to_string());
                write_block(&mut out, &selector, &changed, &overlay.tokens, indent);
            }
        }

        let mut files = FileTree::new();
        files.insert(context.file.to_string(), out);
        Ok(files)
    }
}

fn format_bundle(
    context: &RenderContext<'_>,
    selector: &str,
    indent: &str,
    out: &mut String,
) -> Result<(), TinctureError> {
    let base = context
        .permutations
        .iter()
        .find(|view| view.is_base)
        .ok_or_else(|| TinctureError::BasePermutation {
            message: "bundle output requires the base permutation".to_string(),
        })?;
    write_block(out, selector, &base.tokens, &base.tokens, indent);

    for (modifier_name, modifier) in &context.document.modifiers {
        for context_name in modifier.contexts.keys() {
            let Some(view) =
                single_modifier_view(context, modifier_name, context_name)
            else {
                continue;
            };
            let contributed: TokenMap = view
                .tokens
                .iter()
                .filter(|token| token.source_modifier.as_deref() == Some(modifier_name))
                .cloned()
                .collect();
            if contributed.is_empty() {
                continue;
            }
            let block_selector = format!(
                "[data-{}=\"{}\"]",
                casing::to_kebab_case(modifier_name),
                context_name
            );
            out.push('\n');
            write_block(out, &block_selector, &contributed, &view.tokens, indent);
        }
    }
    Ok(())
}

fn single_view<'a>(context: &'a RenderContext<'_>) -> Result<&'a PermutationView, TinctureError> {
    context
        .permutations
        .first()
        .ok_or_else(|| TinctureError::RenderFailed {
            renderer: "css".to_string(),
            message: "no permutation supplied".to_string(),
        })
}

fn base_and_overlay<'a>(
    context: &'a RenderContext<'_>,
) -> Result<(&'a PermutationView, &'a PermutationView), TinctureError> {
    let base = context
        .permutations
        .iter()
        .find(|view| view.is_base)
        .ok_or_else(|| TinctureError::BasePermutation {
            message: "modifier output requires the base permutation".to_string(),
        })?;
    let overlay = context
        .permutations
        .iter()
        .find(|view| !view.is_base)
        .ok_or_else(|| TinctureError::RenderFailed {
            renderer: "css".to_string(),
            message: "modifier output requires an overlay permutation".to_string(),
        })?;
    Ok((base, overlay))
}

/// `[data-theme="dark"][data-density="compact"]` from the permutation's
/// non-default contexts.
fn overlay_selector(context: &RenderContext<'_>, inputs: &ModifierInputs) -> Option<String> {
    let pairs = non_default_inputs(context.document, inputs);
    if pairs.is_empty() {
        return None;
    }
    Some(
        pairs
            .into_iter()
            .map(|(modifier, selected)| {
                format!("[data-{}=\"{selected}\"]", casing::to_kebab_case(modifier))
            })
            .collect(),
    )
}

fn write_block(
    out: &mut String,
    selector: &str,
    tokens: &TokenMap,
    lookup: &TokenMap,
    indent: &str,
) {
    out.push_str(selector);
    out.push_str(" {\n");
    for token in tokens.iter() {
        if let Some(description) = &token.description {
            out.push_str(indent);
            out.push_str(&format!("/* {description} */\n"));
        }
        if token.is_deprecated() {
            let note = token
                .deprecated
                .as_ref()
                .and_then(crate::tokens::Deprecated::reason)
                .map_or_else(String::new, |reason| format!(" {reason}"));
            out.push_str(indent);
            out.push_str(&format!("/* @deprecated{note} */\n"));
        }
        out.push_str(indent);
        out.push_str(&format!(
            "--{}: {};\n",
            casing::to_kebab_case(&token.name),
            css_value(token, lookup)
        ));
    }
    out.push_str("}\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverDocument;
    use crate::tokens::ResolvedToken;
    use indexmap::IndexMap;
    use serde_json::json;

    fn token(name: &str, value: Value, source_modifier: Option<&str>) -> ResolvedToken {
        let mut t = ResolvedToken::new(name.split('.').map(str::to_string).collect(), value);
        t.token_type = Some("color".to_string());
        t.source_modifier = source_modifier.map(str::to_string);
        t
    }

    fn descriptor(preset: &str) -> crate::build::output::OutputConfig {
        serde_json::from_value(json!({
            "name": "css",
            "renderer": "css",
            "preset": preset
        }))
        .expect("valid descriptor")
    }

    fn document() -> ResolverDocument {
        ResolverDocument::from_value(&json!({
            "version": "2025.10",
            "modifiers": {
                "theme": {
                    "default": "light",
                    "contexts": {"light": [{}], "dark": [{}]}
                }
            },
            "resolutionOrder": []
        }))
        .expect("valid document")
    }

    fn inputs(pairs: &[(&str, &str)]) -> ModifierInputs {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn bundle_emits_root_and_context_blocks() {
        let document = document();
        let descriptor = descriptor("bundle");
        let permutations = vec![
            PermutationView {
                modifier_inputs: inputs(&[("theme", "light")]),
                tokens: vec![
                    token("color.bg", json!("#ffffff"), None),
                    token("semantic.surface", json!("#fafafa"), Some("theme")),
                ]
                .into_iter()
                .collect(),
                is_base: true,
            },
            PermutationView {
                modifier_inputs: inputs(&[("theme", "dark")]),
                tokens: vec![
                    token("color.bg", json!("#ffffff"), None),
                    token("semantic.surface", json!("#111111"), Some("theme")),
                ]
                .into_iter()
                .collect(),
                is_base: false,
            },
        ];
        let options = json!({});
        let context = RenderContext {
            descriptor: &descriptor,
            document: &document,
            permutations: &permutations,
            file: "tokens.css",
            options: &options,
        };
        let files = CssRenderer.format(&context).expect("renders");
        let css = files.get("tokens.css").expect("file present");

        assert!(css.contains(":root {"));
        assert!(css.contains("--color-bg: #ffffff;"));
        assert!(css.contains("[data-theme=\"light\"] {"));
        assert!(css.contains("[data-theme=\"dark\"] {"));
        assert!(css.contains("--semantic-surface: #111111;"));
    }

    #[test]
    fn modifier_preset_emits_delta_under_attribute_selector() {
        let document = document();
        let descriptor = descriptor("modifier");
        let permutations = vec![
            PermutationView {
                modifier_inputs: inputs(&[("theme", "light")]),
                tokens: vec![
                    token("color.bg", json!("#ffffff"), None),
                    token("color.fg", json!("#111111"), None),
                ]
                .into_iter()
                .collect(),
                is_base: true,
            },
            PermutationView {
                modifier_inputs: inputs(&[("theme", "dark")]),
                tokens: vec![
                    token("color.bg", json!("#000000"), None),
                    token("color.fg", json!("#111111"), None),
                ]
                .into_iter()
                .collect(),
                is_base: false,
            },
        ];
        let options = json!({});
        let context = RenderContext {
            descriptor: &descriptor,
            document: &document,
            permutations: &permutations,
            file: "tokens.dark.css",
            options: &options,
        };
        let files = CssRenderer.format(&context).expect("renders");
        let css = files.get("tokens.dark.css").expect("file present");

        assert!(css.contains("[data-theme=\"dark\"] {"));
        assert!(css.contains("--color-bg: #000000;"));
        // Unchanged token is not part of the delta.
        assert!(!css.contains("--color-fg"));
    }

    #[test]
    fn preserved_reference_emits_var() {
        let document = ResolverDocument::from_value(&json!({
            "version": "2025.10",
            "resolutionOrder": []
        }))
        .expect("valid document");
        let descriptor = descriptor("standalone");
        let mut alias = token("semantic.accent", json!("{color.brand.primary}"), None);
        alias.is_alias = true;
        let permutations = vec![PermutationView {
            modifier_inputs: IndexMap::new(),
            tokens: vec![token("color.brand.primary", json!("#0066cc"), None), alias]
                .into_iter()
                .collect(),
            is_base: true,
        }];
        let options = json!({});
        let context = RenderContext {
            descriptor: &descriptor,
            document: &document,
            permutations: &permutations,
            file: "tokens.css",
            options: &options,
        };
        let files = CssRenderer.format(&context).expect("renders");
        let css = files.get("tokens.css").expect("file present");

        assert!(css.contains("--color-brand-primary: #0066cc;"));
        assert!(css.contains("--semantic-accent: var(--color-brand-primary);"));
    }
}
