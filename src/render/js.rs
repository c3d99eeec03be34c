//! JavaScript renderer: an ESM module of camelCase constants plus a
//! TypeScript declaration companion.

use serde_json::Value;

use crate::build::output::Preset;
use crate::error::TinctureError;
use crate::render::{FileTree, RenderContext, Renderer, css_value, delta, file_suffix};
use crate::resolver::modifiers::ModifierInputs;
use crate::support::casing;
use crate::tokens::TokenMap;

pub struct JsRenderer;

const HEADER: &str = "// Generated by tincture. Do not edit directly.\n";

impl Renderer for JsRenderer {
    fn name(&self) -> &str {
        "js"
    }

    fn default_file(&self, inputs: &ModifierInputs) -> String {
        format!("tokens{}.js", file_suffix(inputs))
    }

    fn format(&self, context: &RenderContext<'_>) -> Result<FileTree, TinctureError> {
        let view = match context.descriptor.preset {
            Preset::Modifier => context
                .permutations
                .iter()
                .find(|view| !view.is_base)
                .ok_or_else(|| TinctureError::RenderFailed {
                    renderer: "js".to_string(),
                    message: "modifier output requires an overlay permutation".to_string(),
                })?,
            _ => context
                .permutations
                .iter()
                .find(|view| view.is_base)
                .or_else(|| context.permutations.first())
                .ok_or_else(|| TinctureError::RenderFailed {
                    renderer: "js".to_string(),
                    message: "no permutation supplied".to_string(),
                })?,
        };
        let tokens = match context.descriptor.preset {
            Preset::Modifier => {
                let base = context
                    .permutations
                    .iter()
                    .find(|v| v.is_base)
                    .ok_or_else(|| TinctureError::BasePermutation {
                        message: "modifier output requires the base permutation".to_string(),
                    })?;
                delta(&base.tokens, &view.tokens)
            }
            _ => view.tokens.clone(),
        };

        let mut module = String::from(HEADER);
        module.push_str("export const tokens = {\n");
        let mut declarations = String::from(HEADER);
        declarations.push_str("export declare const tokens: {\n");

        for token in tokens.iter() {
            let key = casing::to_camel_case(&token.name);
            if let Some(description) = &token.description {
                module.push_str(&format!("  /** {description} */\n"));
                declarations.push_str(&format!("  /** {description} */\n"));
            }
            if token.is_deprecated() {
                let note = token
                    .deprecated
                    .as_ref()
                    .and_then(crate::tokens::Deprecated::reason)
                    .map_or_else(String::new, |reason| format!(" {reason}"));
                module.push_str(&format!("  /** @deprecated{note} */\n"));
                declarations.push_str(&format!("  /** @deprecated{note} */\n"));
            }
            let (literal, ts_type) = js_literal(token, &view.tokens);
            module.push_str(&format!("  {key}: {literal},\n"));
            declarations.push_str(&format!("  readonly {key}: {ts_type};\n"));
        }
        module.push_str("};\n");
        declarations.push_str("};\n");

        let mut files = FileTree::new();
        files.insert(context.file.to_string(), module);
        files.insert(declaration_file(context.file), declarations);
        Ok(files)
    }
}

fn declaration_file(file: &str) -> String {
    file.strip_suffix(".js")
        .map_or_else(|| format!("{file}.d.ts"), |stem| format!("{stem}.d.ts"))
}

/// JS literal plus its TypeScript type for one token.
fn js_literal(
    token: &crate::tokens::ResolvedToken,
    lookup: &TokenMap,
) -> (String, &'static str) {
    match &token.value {
        Value::Number(number) => (number.to_string(), "number"),
        Value::Bool(flag) => (flag.to_string(), "boolean"),
        _ => {
            let formatted = css_value(token, lookup);
            (
                serde_json::to_string(&formatted).unwrap_or_else(|_| "\"\"".to_string()),
                "string",
            )
        }
    }
}
