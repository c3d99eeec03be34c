//! Color parsing and conversion between hex strings and DTCG component
//! objects.

use serde_json::Value;

use crate::error::TinctureError;

/// A color normalized to four channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// Parse a `#RRGGBB` or `#RRGGBBAA` hex string.
pub fn parse_hex(hex: &str) -> Result<Rgba, TinctureError> {
    let digits = hex.strip_prefix('#').ok_or_else(|| TinctureError::ColorParse {
        value: hex.to_string(),
    })?;
    if digits.len() != 6 && digits.len() != 8 {
        return Err(TinctureError::ColorParse {
            value: hex.to_string(),
        });
    }

    let channel = |range: std::ops::Range<usize>| -> Result<f64, TinctureError> {
        let slice = digits.get(range).ok_or_else(|| TinctureError::ColorParse {
            value: hex.to_string(),
        })?;
        u8::from_str_radix(slice, 16)
            .map(|byte| f64::from(byte) / 255.0)
            .map_err(|_| TinctureError::ColorParse {
                value: hex.to_string(),
            })
    };

    Ok(Rgba {
        r: channel(0..2)?,
        g: channel(2..4)?,
        b: channel(4..6)?,
        a: if digits.len() == 8 { channel(6..8)? } else { 1.0 },
    })
}

/// Extract a color from a token `$value`: either a hex string or a DTCG
/// `{colorSpace, components, alpha?}` object.
///
/// Only channel-compatible color spaces (`srgb`, `display-p3`) are
/// convertible; anything else is a parse error so callers can degrade
/// gracefully.
pub fn rgba_from_value(value: &Value) -> Result<Rgba, TinctureError> {
    match value {
        Value::String(s) => parse_hex(s),
        Value::Object(obj) => {
            let space = obj
                .get("colorSpace")
                .and_then(Value::as_str)
                .unwrap_or("srgb");
            if space != "srgb" && space != "display-p3" {
                return Err(TinctureError::ColorParse {
                    value: value.to_string(),
                });
            }
            let components = obj
                .get("components")
                .and_then(Value::as_array)
                .ok_or_else(|| TinctureError::ColorParse {
                    value: value.to_string(),
                })?;
            if components.len() != 3 && components.len() != 4 {
                return Err(TinctureError::ColorParse {
                    value: value.to_string(),
                });
            }
            let channel = |i: usize| -> Result<f64, TinctureError> {
                components
                    .get(i)
                    .and_then(Value::as_f64)
                    .filter(|c| (0.0..=1.0).contains(c))
                    .ok_or_else(|| TinctureError::ColorParse {
                        value: value.to_string(),
                    })
            };
            let alpha = match obj.get("alpha") {
                Some(a) => a.as_f64().filter(|a| (0.0..=1.0).contains(a)).ok_or_else(
                    || TinctureError::ColorParse {
                        value: value.to_string(),
                    },
                )?,
                None if components.len() == 4 => channel(3)?,
                None => 1.0,
            };
            Ok(Rgba {
                r: channel(0)?,
                g: channel(1)?,
                b: channel(2)?,
                a: alpha,
            })
        }
        other => Err(TinctureError::ColorParse {
            value: other.to_string(),
        }),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(channel: f64) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Format as `#rrggbb`, or `#rrggbbaa` when alpha is not fully opaque.
pub fn to_hex(color: Rgba) -> String {
    let (r, g, b) = (to_byte(color.r), to_byte(color.g), to_byte(color.b));
    if color.a < 1.0 {
        format!("#{r:02x}{g:02x}{b:02x}{:02x}", to_byte(color.a))
    } else {
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

/// Format as modern CSS `rgb(r g b)` / `rgb(r g b / a)` syntax.
pub fn to_rgb_string(color: Rgba) -> String {
    let (r, g, b) = (to_byte(color.r), to_byte(color.g), to_byte(color.b));
    if color.a < 1.0 {
        format!("rgb({r} {g} {b} / {})", format_channel(color.a))
    } else {
        format!("rgb({r} {g} {b})")
    }
}

/// Format a `[0, 1]` channel without trailing zeros.
pub fn format_channel(value: f64) -> String {
    let formatted = format!("{value:.4}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
