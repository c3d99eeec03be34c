//! JSON renderer: flat name → value maps, or nested DTCG-shaped trees
//! with `options.nested`.

use serde_json::{Map, Value};

use crate::build::output::Preset;
use crate::error::TinctureError;
use crate::render::{FileTree, RenderContext, Renderer, delta, file_suffix};
use crate::resolver::modifiers::ModifierInputs;
use crate::tokens::{TokenMap, to_nested_document};

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn default_file(&self, inputs: &ModifierInputs) -> String {
        format!("tokens{}.json", file_suffix(inputs))
    }

    fn format(&self, context: &RenderContext<'_>) -> Result<FileTree, TinctureError> {
        let nested = context
            .options
            .get("nested")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let value = match context.descriptor.preset {
            Preset::Bundle if context.permutations.len() > 1 => bundle_value(context, nested)?,
            Preset::Modifier => {
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
                        renderer: "json".to_string(),
                        message: "modifier output requires an overlay permutation".to_string(),
                    })?;
                emit_map(&delta(&base.tokens, &overlay.tokens), nested)
            }
            _ => {
                let view = context.permutations.first().ok_or_else(|| {
                    TinctureError::RenderFailed {
                        renderer: "json".to_string(),
                        message: "no permutation supplied".to_string(),
                    }
                })?;
                emit_map(&view.tokens, nested)
            }
        };

        let mut text = serde_json::to_string_pretty(&value).map_err(|error| {
            TinctureError::RenderFailed {
                renderer: "json".to_string(),
                message: error.to_string(),
            }
        })?;
        text.push('\n');

        let mut files = FileTree::new();
        files.insert(context.file.to_string(), text);
        Ok(files)
    }
}

/// `{base: {...}, overlays: {modifier: {context: {delta}}}}`.
fn bundle_value(context: &RenderContext<'_>, nested: bool) -> Result<Value, TinctureError> {
    let base = context
        .permutations
        .iter()
        .find(|view| view.is_base)
        .ok_or_else(|| TinctureError::BasePermutation {
            message: "bundle output requires the base permutation".to_string(),
        })?;

    let mut overlays = Map::new();
    for (modifier_name, modifier) in &context.document.modifiers {
        let mut contexts = Map::new();
        for context_name in modifier.contexts.keys() {
            let Some(view) =
                crate::render::single_modifier_view(context, modifier_name, context_name)
            else {
                continue;
            };
            let changed = delta(&base.tokens, &view.tokens);
            if changed.is_empty() {
                continue;
            }
            contexts.insert(context_name.clone(), emit_map(&changed, nested));
        }
        if !contexts.is_empty() {
            overlays.insert(modifier_name.clone(), Value::Object(contexts));
        }
    }

    let mut out = Map::new();
    out.insert("base".to_string(), emit_map(&base.tokens, nested));
    out.insert("overlays".to_string(), Value::Object(overlays));
    Ok(Value::Object(out))
}

fn emit_map(tokens: &TokenMap, nested: bool) -> Value {
    if nested {
        return to_nested_document(tokens);
    }
    let mut out = Map::new();
    for token in tokens.iter() {
        out.insert(token.name.clone(), token.value.clone());
    }
    Value::Object(out)
}
