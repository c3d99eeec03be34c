//! Dimension parsing and px/rem conversion.

use std::fmt;

use serde_json::Value;

use crate::error::TinctureError;

/// Base font size for rem conversions, overridable per transform.
pub const DEFAULT_BASE_FONT_SIZE: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionUnit {
    Px,
    Rem,
}

impl DimensionUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Rem => "rem",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    pub value: f64,
    pub unit: DimensionUnit,
}

impl Dimension {
    /// Convert to rem against the given base font size.
    pub fn to_rem(self, base_font_size: f64) -> Self {
        match self.unit {
            DimensionUnit::Rem => self,
            DimensionUnit::Px => Self {
                value: self.value / base_font_size,
                unit: DimensionUnit::Rem,
            },
        }
    }

    /// Convert to px against the given base font size.
    pub fn to_px(self, base_font_size: f64) -> Self {
        match self.unit {
            DimensionUnit::Px => self,
            DimensionUnit::Rem => Self {
                value: self.value * base_font_size,
                unit: DimensionUnit::Px,
            },
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_number(self.value), self.unit.as_str())
    }
}

/// Format a dimension value without trailing zeros.
fn format_number(value: f64) -> String {
    let formatted = format!("{value:.4}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// Parse a dimension token `$value`.
///
/// Accepts the DTCG object form `{value, unit}` and the legacy string form
/// `"16px"` / `"1rem"`. Units other than `px` and `rem` (including `em`)
/// are rejected.
pub fn parse_dimension(value: &Value) -> Result<Dimension, TinctureError> {
    match value {
        Value::Object(obj) => {
            let number = obj.get("value").and_then(Value::as_f64).ok_or_else(|| {
                TinctureError::DimensionFormat {
                    value: value.to_string(),
                }
            })?;
            let unit = obj.get("unit").and_then(Value::as_str).ok_or_else(|| {
                TinctureError::DimensionFormat {
                    value: value.to_string(),
                }
            })?;
            Ok(Dimension {
                value: number,
                unit: parse_unit(unit, value)?,
            })
        }
        Value::String(s) => parse_dimension_str(s),
        other => Err(TinctureError::DimensionFormat {
            value: other.to_string(),
        }),
    }
}

fn parse_dimension_str(s: &str) -> Result<Dimension, TinctureError> {
    let trimmed = s.trim();
    let split = trimmed
        .char_indices()
        .find(|(_, c)| c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .ok_or_else(|| TinctureError::DimensionFormat {
            value: s.to_string(),
        })?;
    let (number, unit) = trimmed.split_at(split);
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| TinctureError::DimensionFormat {
            value: s.to_string(),
        })?;
    Ok(Dimension {
        value,
        unit: parse_unit(unit, &Value::String(s.to_string()))?,
    })
}

fn parse_unit(unit: &str, original: &Value) -> Result<DimensionUnit, TinctureError> {
    match unit {
        "px" => Ok(DimensionUnit::Px),
        "rem" => Ok(DimensionUnit::Rem),
        _ => Err(TinctureError::DimensionFormat {
            value: original.to_string(),
        }),
    }
}

/// Serialize back to the DTCG object form.
pub fn dimension_to_value(dimension: Dimension) -> Value {
    serde_json::json!({
        "value": dimension.value,
        "unit": dimension.unit.as_str(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_object_form() {
        let d = parse_dimension(&json!({"value": 16, "unit": "px"})).expect("valid");
        assert_eq!(d, Dimension { value: 16.0, unit: DimensionUnit::Px });
    }

    #[test]
    fn parses_string_form() {
        let d = parse_dimension(&json!("1.5rem")).expect("valid");
        assert_eq!(d.unit, DimensionUnit::Rem);
        assert!((d.value - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn px_to_rem_uses_base_font_size() {
        let d = Dimension { value: 24.0, unit: DimensionUnit::Px };
        let rem = d.to_rem(16.0);
        assert_eq!(rem.to_string(), "1.5rem");
    }

    #[test]
    fn rem_to_px() {
        let d = Dimension { value: 2.0, unit: DimensionUnit::Rem };
        assert_eq!(d.to_px(16.0).to_string(), "32px");
    }

    #[test]
    fn em_is_rejected() {
        let result = parse_dimension(&json!({"value": 1, "unit": "em"}));
        assert!(matches!(result, Err(TinctureError::DimensionFormat { .. })));
        assert!(parse_dimension(&json!("2em")).is_err());
    }

    #[test]
    fn display_trims_trailing_zeros() {
        let d = Dimension { value: 16.0, unit: DimensionUnit::Px };
        assert_eq!(d.to_string(), "16px");
    }
}
