//! iOS Swift renderer: a `public enum` of static token constants.

use serde_json::Value;

use crate::error::TinctureError;
use crate::render::{FileTree, RenderContext, Renderer, file_suffix};
use crate::resolver::modifiers::ModifierInputs;
use crate::support::{casing, color, dimension, refs};
use crate::tokens::{ResolvedToken, types};

pub struct IosRenderer;

const DEFAULT_TYPE_NAME: &str = "DesignTokens";

impl Renderer for IosRenderer {
    fn name(&self) -> &str {
        "ios"
    }

    fn default_file(&self, inputs: &ModifierInputs) -> String {
        format!("{DEFAULT_TYPE_NAME}{}.swift", file_suffix(inputs))
    }

    fn format(&self, context: &RenderContext<'_>) -> Result<FileTree, TinctureError> {
        let view = context
            .permutations
            .iter()
            .find(|view| view.is_base)
            .or_else(|| context.permutations.first())
            .ok_or_else(|| TinctureError::RenderFailed {
                renderer: "ios".to_string(),
                message: "no permutation supplied".to_string(),
            })?;
        let type_name = context
            .options
            .get("typeName")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TYPE_NAME);

        let mut out = String::from("import UIKit\n\n");
        out.push_str(&format!("public enum {type_name} {{\n"));
        for token in view.tokens.iter() {
            if let Some(description) = &token.description {
                out.push_str(&format!("    /// {description}\n"));
            }
            let member = casing::to_camel_case(&token.name);
            out.push_str(&format!("    public static let {member} = {}\n", swift_value(token)));
        }
        out.push_str("}\n");

        let mut files = FileTree::new();
        files.insert(context.file.to_string(), out);
        Ok(files)
    }
}

fn swift_value(token: &ResolvedToken) -> String {
    // Preserved references point at the sibling constant.
    if let Some(target) = refs::alias_target(&token.value) {
        return format!("Self.{}", casing::to_camel_case(target));
    }
    match token.token_type.as_deref() {
        Some("color") => color::rgba_from_value(&token.value).map_or_else(
            |_| string_literal(&token.value),
            |rgba| {
                format!(
                    "UIColor(red: {:.3}, green: {:.3}, blue: {:.3}, alpha: {:.3})",
                    rgba.r, rgba.g, rgba.b, rgba.a
                )
            },
        ),
        Some("dimension") => dimension::parse_dimension(&token.value).map_or_else(
            |_| string_literal(&token.value),
            |d| format!("CGFloat({})", color::format_channel(d.to_px(16.0).value)),
        ),
        Some("fontWeight") => types::font_weight_to_number(&token.value)
            .map_or_else(|_| string_literal(&token.value), |w| color::format_channel(w)),
        Some("duration") => types::duration_to_ms(&token.value).map_or_else(
            |_| string_literal(&token.value),
            |ms| format!("TimeInterval({})", color::format_channel(ms / 1000.0)),
        ),
        _ => string_literal(&token.value),
    }
}

fn string_literal(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
