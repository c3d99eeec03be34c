//! The per-output processor chain: preprocessors, filters, and
//! transforms, applied in that order.
//!
//! Built-ins and user-supplied instances share the same traits and are
//! indistinguishable at the call site. Transform failures on individual
//! tokens degrade gracefully: the token is left unchanged and a warning
//! is recorded.

use std::rc::Rc;

use regex::Regex;
use serde_json::Value;

use crate::error::TinctureError;
use crate::support::{casing, color, dimension, refs};
use crate::tokens::{ResolvedToken, TokenMap, types};
use crate::warnings::{TinctureWarning, WarningSink};

/// Rewrites a raw token document before resolution.
pub trait Preprocessor {
    fn name(&self) -> &str;
    /// The output must still be a valid DTCG document.
    fn run(&self, document: &Value) -> Result<Value, TinctureError>;
}

/// Predicate over resolved tokens; a token is retained if *all* filters
/// of a descriptor accept it.
pub trait Filter {
    fn name(&self) -> &str;
    fn retain(&self, token: &ResolvedToken) -> bool;
}

/// Token-to-token rewrite with an optional matcher.
pub trait Transform {
    fn name(&self) -> &str;
    fn matches(&self, _token: &ResolvedToken) -> bool {
        true
    }
    /// Must return a new record; the input is never mutated.
    fn apply(&self, token: &ResolvedToken) -> Result<ResolvedToken, TinctureError>;
}

/// Run filters then transforms over a token map, producing a new map.
///
/// For a given filter/transform list this is a pure function of the
/// input map.
pub fn apply_chain(
    tokens: &TokenMap,
    filters: &[Rc<dyn Filter>],
    transforms: &[Rc<dyn Transform>],
    sink: &mut WarningSink,
) -> TokenMap {
    let mut out = TokenMap::new();
    for token in tokens.iter() {
        if !filters.iter().all(|filter| filter.retain(token)) {
            continue;
        }
        let mut current = token.clone();
        for transform in transforms {
            if !transform.matches(&current) {
                continue;
            }
            match transform.apply(&current) {
                Ok(next) => current = next,
                Err(error) => sink.advise(TinctureWarning::TransformSkipped {
                    transform: transform.name().to_string(),
                    token: current.name.clone(),
                    reason: error.to_string(),
                }),
            }
        }
        out.insert(current);
    }
    out
}

// ── Built-in filters ───────────────────────────────────────────

struct ByType(String);

impl Filter for ByType {
    fn name(&self) -> &str {
        "byType"
    }
    fn retain(&self, token: &ResolvedToken) -> bool {
        token.token_type.as_deref() == Some(self.0.as_str())
    }
}

struct ByPath(Regex);

impl Filter for ByPath {
    fn name(&self) -> &str {
        "byPath"
    }
    fn retain(&self, token: &ResolvedToken) -> bool {
        self.0.is_match(&token.name)
    }
}

struct IsAlias;

impl Filter for IsAlias {
    fn name(&self) -> &str {
        "isAlias"
    }
    fn retain(&self, token: &ResolvedToken) -> bool {
        token.is_alias || refs::alias_target(&token.value).is_some()
    }
}

struct IsBase;

impl Filter for IsBase {
    fn name(&self) -> &str {
        "isBase"
    }
    fn retain(&self, token: &ResolvedToken) -> bool {
        token.source_modifier.is_none()
    }
}

/// Construct a built-in filter from its configured name and argument.
pub fn builtin_filter(name: &str, argument: Option<&Value>) -> Result<Rc<dyn Filter>, TinctureError> {
    match (name, argument) {
        ("isAlias", None) => Ok(Rc::new(IsAlias)),
        ("isBase", None) => Ok(Rc::new(IsBase)),
        ("byType", Some(Value::String(token_type))) => Ok(Rc::new(ByType(token_type.clone()))),
        ("byPath", Some(Value::String(pattern))) => {
            let regex = Regex::new(pattern).map_err(|error| TinctureError::Configuration {
                message: format!("invalid byPath pattern '{pattern}': {error}"),
            })?;
            Ok(Rc::new(ByPath(regex)))
        }
        _ => Err(TinctureError::Configuration {
            message: format!("unknown filter '{name}'"),
        }),
    }
}

// ── Built-in transforms ────────────────────────────────────────

/// Matcher shared by the value conversions: typed tokens whose value is
/// concrete (alias strings are left for the renderer).
fn concrete_of_type(token: &ResolvedToken, token_type: &str) -> bool {
    token.token_type.as_deref() == Some(token_type)
        && refs::alias_target(&token.value).is_none()
}

struct ColorToHex;

impl Transform for ColorToHex {
    fn name(&self) -> &str {
        "colorToHex"
    }
    fn matches(&self, token: &ResolvedToken) -> bool {
        concrete_of_type(token, "color")
    }
    fn apply(&self, token: &ResolvedToken) -> Result<ResolvedToken, TinctureError> {
        let rgba = color::rgba_from_value(&token.value)?;
        let mut out = token.clone();
        out.value = Value::String(color::to_hex(rgba));
        Ok(out)
    }
}

struct ColorToRgb;

impl Transform for ColorToRgb {
    fn name(&self) -> &str {
        "colorToRgb"
    }
    fn matches(&self, token: &ResolvedToken) -> bool {
        concrete_of_type(token, "color")
    }
    fn apply(&self, token: &ResolvedToken) -> Result<ResolvedToken, TinctureError> {
        let rgba = color::rgba_from_value(&token.value)?;
        let mut out = token.clone();
        out.value = Value::String(color::to_rgb_string(rgba));
        Ok(out)
    }
}

struct DimensionToRem {
    base_font_size: f64,
}

impl Transform for DimensionToRem {
    fn name(&self) -> &str {
        "dimensionToRem"
    }
    fn matches(&self, token: &ResolvedToken) -> bool {
        concrete_of_type(token, "dimension")
    }
    fn apply(&self, token: &ResolvedToken) -> Result<ResolvedToken, TinctureError> {
        let parsed = dimension::parse_dimension(&token.value)?;
        let mut out = token.clone();
        out.value = dimension::dimension_to_value(parsed.to_rem(self.base_font_size));
        Ok(out)
    }
}

struct DimensionToPx {
    base_font_size: f64,
}

impl Transform for DimensionToPx {
    fn name(&self) -> &str {
        "dimensionToPx"
    }
    fn matches(&self, token: &ResolvedToken) -> bool {
        concrete_of_type(token, "dimension")
    }
    fn apply(&self, token: &ResolvedToken) -> Result<ResolvedToken, TinctureError> {
        let parsed = dimension::parse_dimension(&token.value)?;
        let mut out = token.clone();
        out.value = dimension::dimension_to_value(parsed.to_px(self.base_font_size));
        Ok(out)
    }
}

struct FontWeightToNumber;

impl Transform for FontWeightToNumber {
    fn name(&self) -> &str {
        "fontWeightToNumber"
    }
    fn matches(&self, token: &ResolvedToken) -> bool {
        concrete_of_type(token, "fontWeight")
    }
    fn apply(&self, token: &ResolvedToken) -> Result<ResolvedToken, TinctureError> {
        let weight = types::font_weight_to_number(&token.value)?;
        let mut out = token.clone();
        out.value = serde_json::json!(weight);
        Ok(out)
    }
}

struct DurationToMs;

impl Transform for DurationToMs {
    fn name(&self) -> &str {
        "durationToMs"
    }
    fn matches(&self, token: &ResolvedToken) -> bool {
        concrete_of_type(token, "duration")
    }
    fn apply(&self, token: &ResolvedToken) -> Result<ResolvedToken, TinctureError> {
        let ms = types::duration_to_ms(&token.value)?;
        let mut out = token.clone();
        out.value = serde_json::json!({"value": ms, "unit": "ms"});
        Ok(out)
    }
}

/// Rename transform: converts `name` while `path` keeps the original
/// segments, so reference targets stay recoverable.
struct RenameCase {
    label: &'static str,
    convert: fn(&str) -> String,
}

impl Transform for RenameCase {
    fn name(&self) -> &str {
        self.label
    }
    fn apply(&self, token: &ResolvedToken) -> Result<ResolvedToken, TinctureError> {
        let mut out = token.clone();
        out.name = (self.convert)(&token.name);
        Ok(out)
    }
}

fn base_font_size(options: Option<&Value>) -> f64 {
    options
        .and_then(|value| value.get("baseFontSize"))
        .and_then(Value::as_f64)
        .unwrap_or(dimension::DEFAULT_BASE_FONT_SIZE)
}

/// Construct a built-in transform from its configured name and options.
pub fn builtin_transform(
    name: &str,
    options: Option<&Value>,
) -> Result<Rc<dyn Transform>, TinctureError> {
    match name {
        "colorToHex" => Ok(Rc::new(ColorToHex)),
        "colorToRgb" => Ok(Rc::new(ColorToRgb)),
        "dimensionToRem" => Ok(Rc::new(DimensionToRem {
            base_font_size: base_font_size(options),
        })),
        "dimensionToPx" => Ok(Rc::new(DimensionToPx {
            base_font_size: base_font_size(options),
        })),
        "fontWeightToNumber" => Ok(Rc::new(FontWeightToNumber)),
        "durationToMs" => Ok(Rc::new(DurationToMs)),
        "nameKebabCase" => Ok(Rc::new(RenameCase {
            label: "nameKebabCase",
            convert: casing::to_kebab_case,
        })),
        "nameCamelCase" => Ok(Rc::new(RenameCase {
            label: "nameCamelCase",
            convert: casing::to_camel_case,
        })),
        "namePascalCase" => Ok(Rc::new(RenameCase {
            label: "namePascalCase",
            convert: casing::to_pascal_case,
        })),
        "nameSnakeCase" => Ok(Rc::new(RenameCase {
            label: "nameSnakeCase",
            convert: casing::to_snake_case,
        })),
        _ => Err(TinctureError::Configuration {
            message: format!("unknown transform '{name}'"),
        }),
    }
}
