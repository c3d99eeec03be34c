//! Shape validation and typed views for the built-in token types.

use serde_json::Value;

use crate::error::TinctureError;
use crate::support::{color, dimension, refs};

/// Named font weights and their numeric equivalents.
const NAMED_WEIGHTS: &[(&str, f64)] = &[
    ("thin", 100.0),
    ("hairline", 100.0),
    ("extra-light", 200.0),
    ("ultra-light", 200.0),
    ("light", 300.0),
    ("normal", 400.0),
    ("regular", 400.0),
    ("medium", 500.0),
    ("semi-bold", 600.0),
    ("demi-bold", 600.0),
    ("bold", 700.0),
    ("extra-bold", 800.0),
    ("ultra-bold", 800.0),
    ("black", 900.0),
    ("heavy", 900.0),
    ("extra-black", 950.0),
    ("ultra-black", 950.0),
];

/// Convert a fontWeight value (number or named weight) to its number.
pub fn font_weight_to_number(value: &Value) -> Result<f64, TinctureError> {
    match value {
        Value::Number(n) => {
            let weight = n.as_f64().unwrap_or(f64::NAN);
            if (1.0..=1000.0).contains(&weight) {
                Ok(weight)
            } else {
                Err(invalid("fontWeight", value))
            }
        }
        Value::String(s) => NAMED_WEIGHTS
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, weight)| *weight)
            .ok_or_else(|| invalid("fontWeight", value)),
        _ => Err(invalid("fontWeight", value)),
    }
}

/// Convert a duration value to milliseconds.
pub fn duration_to_ms(value: &Value) -> Result<f64, TinctureError> {
    let obj = value.as_object().ok_or_else(|| invalid("duration", value))?;
    let number = obj
        .get("value")
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid("duration", value))?;
    match obj.get("unit").and_then(Value::as_str) {
        Some("ms") => Ok(number),
        Some("s") => Ok(number * 1000.0),
        _ => Err(invalid("duration", value)),
    }
}

fn invalid(token_type: &str, value: &Value) -> TinctureError {
    TinctureError::Validation {
        message: format!("value {value} does not match $type '{token_type}'"),
    }
}

/// Validate a non-alias `$value` against its declared `$type`.
///
/// Opaque user types always pass; alias strings are validated after
/// resolution. Color component ranges are only enforced for the
/// channel-normalized spaces (`srgb`, `display-p3`).
pub fn validate_value(token_type: &str, value: &Value) -> Result<(), TinctureError> {
    if refs::alias_target(value).is_some() {
        return Ok(());
    }
    match token_type {
        "color" => validate_color(value),
        "dimension" => dimension::parse_dimension(value).map(|_| ()).map_err(|_| {
            invalid("dimension", value)
        }),
        "fontFamily" => validate_font_family(value),
        "fontWeight" => font_weight_to_number(value).map(|_| ()),
        "duration" => duration_to_ms(value).map(|_| ()),
        _ => Ok(()),
    }
}

fn validate_color(value: &Value) -> Result<(), TinctureError> {
    match value {
        Value::String(_) => color::parse_hex(value.as_str().unwrap_or_default())
            .map(|_| ())
            .map_err(|_| invalid("color", value)),
        Value::Object(obj) => {
            let components = obj
                .get("components")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid("color", value))?;
            if components.len() != 3 && components.len() != 4 {
                return Err(invalid("color", value));
            }
            let space = obj
                .get("colorSpace")
                .and_then(Value::as_str)
                .unwrap_or("srgb");
            let normalized = space == "srgb" || space == "display-p3";
            for component in components {
                let Some(channel) = component.as_f64() else {
                    return Err(invalid("color", value));
                };
                if normalized && !(0.0..=1.0).contains(&channel) {
                    return Err(invalid("color", value));
                }
            }
            if let Some(alpha) = obj.get("alpha") {
                let Some(a) = alpha.as_f64() else {
                    return Err(invalid("color", value));
                };
                if !(0.0..=1.0).contains(&a) {
                    return Err(invalid("color", value));
                }
            }
            Ok(())
        }
        _ => Err(invalid("color", value)),
    }
}

fn validate_font_family(value: &Value) -> Result<(), TinctureError> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(()),
        Value::Array(families) if !families.is_empty() => {
            if families.iter().all(|f| f.as_str().is_some_and(|s| !s.is_empty())) {
                Ok(())
            } else {
                Err(invalid("fontFamily", value))
            }
        }
        _ => Err(invalid("fontFamily", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn named_weights_map_to_numbers() {
        assert_eq!(font_weight_to_number(&json!("bold")).ok(), Some(700.0));
        assert_eq!(font_weight_to_number(&json!("demi-bold")).ok(), Some(600.0));
        assert_eq!(font_weight_to_number(&json!(450)).ok(), Some(450.0));
    }

    #[test]
    fn weight_out_of_range_rejected() {
        assert!(font_weight_to_number(&json!(0)).is_err());
        assert!(font_weight_to_number(&json!(1001)).is_err());
        assert!(font_weight_to_number(&json!("chunky")).is_err());
    }

    #[test]
    fn duration_units() {
        assert_eq!(duration_to_ms(&json!({"value": 300, "unit": "ms"})).ok(), Some(300.0));
        assert_eq!(duration_to_ms(&json!({"value": 1.5, "unit": "s"})).ok(), Some(1500.0));
        assert!(duration_to_ms(&json!({"value": 1, "unit": "min"})).is_err());
    }

    #[test]
    fn color_shapes() {
        assert!(validate_value("color", &json!("#0066cc")).is_ok());
        assert!(validate_value("color", &json!({"colorSpace": "srgb", "components": [0, 0.4, 0.8]})).is_ok());
        assert!(validate_value("color", &json!({"colorSpace": "oklch", "components": [0.7, 0.1, 250]})).is_ok());
        assert!(validate_value("color", &json!({"components": [0, 0.4]})).is_err());
        assert!(validate_value("color", &json!(12)).is_err());
    }

    #[test]
    fn alias_values_skip_shape_checks() {
        assert!(validate_value("color", &json!("{color.brand.primary}")).is_ok());
    }

    #[test]
    fn font_family_shapes() {
        assert!(validate_value("fontFamily", &json!(["Inter", "sans-serif"])).is_ok());
        assert!(validate_value("fontFamily", &json!("Inter")).is_ok());
        assert!(validate_value("fontFamily", &json!([])).is_err());
    }

    #[test]
    fn opaque_types_pass() {
        assert!(validate_value("cubicBezier", &json!([0.4, 0.0, 0.2, 1.0])).is_ok());
    }
}
