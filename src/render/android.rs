//! Android Kotlin renderer: an `object` of token constants with colors
//! as `0xAARRGGBB` longs.

use serde_json::Value;

use crate::error::TinctureError;
use crate::render::{FileTree, RenderContext, Renderer, file_suffix};
use crate::resolver::modifiers::ModifierInputs;
use crate::support::{casing, color, dimension, refs};
use crate::tokens::{ResolvedToken, types};

pub struct AndroidRenderer;

const DEFAULT_OBJECT_NAME: &str = "DesignTokens";

impl Renderer for AndroidRenderer {
    fn name(&self) -> &str {
        "android"
    }

    fn default_file(&self, inputs: &ModifierInputs) -> String {
        format!("{DEFAULT_OBJECT_NAME}{}.kt", file_suffix(inputs))
    }

    fn format(&self, context: &RenderContext<'_>) -> Result<FileTree, TinctureError> {
        let view = context
            .permutations
            .iter()
            .find(|view| view.is_base)
            .or_else(|| context.permutations.first())
            .ok_or_else(|| TinctureError::RenderFailed {
                renderer: "android".to_string(),
                message: "no permutation supplied".to_string(),
            })?;
        let object_name = context
            .options
            .get("objectName")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_OBJECT_NAME);

        let mut out = String::new();
        if let Some(package) = context.options.get("package").and_then(Value::as_str) {
            out.push_str(&format!("package {package}\n\n"));
        }
        out.push_str(&format!("object {object_name} {{\n"));
        for token in view.tokens.iter() {
            if let Some(description) = &token.description {
                out.push_str(&format!("    /** {description} */\n"));
            }
            let member = casing::to_screaming_snake_case(&token.name);
            let (kotlin_type, literal) = kotlin_value(token);
            out.push_str(&format!("    const val {member}: {kotlin_type} = {literal}\n"));
        }
        out.push_str("}\n");

        let mut files = FileTree::new();
        files.insert(context.file.to_string(), out);
        Ok(files)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn kotlin_value(token: &ResolvedToken) -> (&'static str, String) {
    if let Some(target) = refs::alias_target(&token.value) {
        return ("Long", casing::to_screaming_snake_case(target));
    }
    match token.token_type.as_deref() {
        Some("color") => match color::rgba_from_value(&token.value) {
            Ok(rgba) => {
                let byte = |channel: f64| (channel.clamp(0.0, 1.0) * 255.0).round() as u32;
                let argb = format!(
                    "0x{:02X}{:02X}{:02X}{:02X}",
                    byte(rgba.a),
                    byte(rgba.r),
                    byte(rgba.g),
                    byte(rgba.b)
                );
                ("Long", argb)
            }
            Err(_) => ("String", kotlin_string(&token.value)),
        },
        Some("dimension") => match dimension::parse_dimension(&token.value) {
            Ok(parsed) => (
                "Float",
                format!("{}f", color::format_channel(parsed.to_px(16.0).value)),
            ),
            Err(_) => ("String", kotlin_string(&token.value)),
        },
        Some("fontWeight") => match types::font_weight_to_number(&token.value) {
            Ok(weight) => ("Int", color::format_channel(weight)),
            Err(_) => ("String", kotlin_string(&token.value)),
        },
        Some("duration") => match types::duration_to_ms(&token.value) {
            Ok(ms) => ("Long", format!("{}L", color::format_channel(ms))),
            Err(_) => ("String", kotlin_string(&token.value)),
        },
        _ => ("String", kotlin_string(&token.value)),
    }
}

fn kotlin_string(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token(name: &str, token_type: &str, value: Value) -> ResolvedToken {
        let mut t = ResolvedToken::new(name.split('.').map(str::to_string).collect(), value);
        t.token_type = Some(token_type.to_string());
        t
    }

    #[test]
    fn kotlin_color_is_argb_long() {
        let (kotlin_type, literal) = kotlin_value(&token(
            "color.brand.primary",
            "color",
            json!({"colorSpace": "srgb", "components": [0.0, 0.4, 0.8]}),
        ));
        assert_eq!(kotlin_type, "Long");
        assert_eq!(literal, "0xFF0066CC");
    }

    #[test]
    fn kotlin_duration_is_ms_long() {
        let (kotlin_type, literal) =
            kotlin_value(&token("motion.fast", "duration", json!({"value": 0.3, "unit": "s"})));
        assert_eq!(kotlin_type, "Long");
        assert_eq!(literal, "300L");
    }

    #[test]
    fn kotlin_dimension_is_px_float() {
        let (kotlin_type, literal) =
            kotlin_value(&token("spacing.lg", "dimension", json!({"value": 1, "unit": "rem"})));
        assert_eq!(kotlin_type, "Float");
        assert_eq!(literal, "16f");
    }
}
