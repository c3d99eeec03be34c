//! Tailwind v4 `@theme` renderer.
//!
//! Emits the base permutation as an `@theme` block; non-default contexts
//! become plain attribute-selector overrides so theme switching keeps
//! working through custom properties.

use crate::build::output::Preset;
use crate::error::TinctureError;
use crate::render::{
    FileTree, RenderContext, Renderer, css_value, delta, file_suffix, non_default_inputs,
};
use crate::resolver::modifiers::ModifierInputs;
use crate::support::casing;
use crate::tokens::TokenMap;

pub struct TailwindRenderer;

impl Renderer for TailwindRenderer {
    fn name(&self) -> &str {
        "tailwind"
    }

    fn default_file(&self, inputs: &ModifierInputs) -> String {
        format!("theme{}.css", file_suffix(inputs))
    }

    fn format(&self, context: &RenderContext<'_>) -> Result<FileTree, TinctureError> {
        let base = context
            .permutations
            .iter()
            .find(|view| view.is_base)
            .or_else(|| context.permutations.first())
            .ok_or_else(|| TinctureError::RenderFailed {
                renderer: "tailwind".to_string(),
                message: "no permutation supplied".to_string(),
            })?;

        let mut out = String::new();
        write_theme_block(&mut out, "@theme", &base.tokens, &base.tokens);

        if context.descriptor.preset == Preset::Bundle {
            for view in context.permutations.iter().filter(|view| !view.is_base) {
                let pairs = non_default_inputs(context.document, &view.modifier_inputs);
                // Single-modifier overlays only; combined permutations
                // repeat their per-modifier deltas.
                if pairs.len() != 1 {
                    continue;
                }
                let changed = delta(&base.tokens, &view.tokens);
                if changed.is_empty() {
                    continue;
                }
                let (modifier, selected) = pairs[0];
                let selector = format!(
                    "[data-{}=\"{selected}\"]",
                    casing::to_kebab_case(modifier)
                );
                out.push('\n');
                write_theme_block(&mut out, &selector, &changed, &view.tokens);
            }
        }

        let mut files = FileTree::new();
        files.insert(context.file.to_string(), out);
        Ok(files)
    }
}

fn write_theme_block(out: &mut String, selector: &str, tokens: &TokenMap, lookup: &TokenMap) {
    out.push_str(selector);
    out.push_str(" {\n");
    for token in tokens.iter() {
        out.push_str(&format!(
            "  --{}: {};\n",
            casing::to_kebab_case(&token.name),
            css_value(token, lookup)
        ));
    }
    out.push_str("}\n");
}
