//! Output descriptors: renderer selection, presets, processor lists,
//! and output file naming.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::resolver::modifiers::ModifierInputs;

/// Which permutations a renderer sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// One output collectively: the renderer receives all permutations
    /// and emits a single artifact containing base and overlays.
    #[default]
    Bundle,
    /// One output per non-base permutation, expressed as a delta from
    /// the base; the renderer receives base + one overlay.
    Modifier,
    /// One output file per permutation, independent of base.
    Standalone,
}

/// A configured filter: a bare name (`"isAlias"`) or a single-entry map
/// carrying the argument (`{"byType": "color"}`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FilterSpec {
    Name(String),
    WithArg(IndexMap<String, Value>),
}

/// A configured transform: a bare name or `{name: options}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TransformSpec {
    Name(String),
    WithOptions(IndexMap<String, Value>),
}

/// Programmatic file-name callback.
pub type FileNameFn = Rc<dyn Fn(&ModifierInputs) -> String>;

/// One rendered artifact family: a renderer plus its processor chain.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    pub name: String,
    pub renderer: String,
    /// File name template with `{modifier}` placeholders.
    #[serde(default)]
    pub file: Option<String>,
    /// Programmatic alternative to `file`; wins when both are set.
    #[serde(skip)]
    pub file_callback: Option<FileNameFn>,
    #[serde(default)]
    pub preset: Preset,
    #[serde(default)]
    pub preserve_references: bool,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
    #[serde(default)]
    pub preprocessors: Vec<String>,
    #[serde(default)]
    pub options: Value,
}

impl fmt::Debug for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputConfig")
            .field("name", &self.name)
            .field("renderer", &self.renderer)
            .field("file", &self.file)
            .field("preset", &self.preset)
            .field("preserve_references", &self.preserve_references)
            .finish_non_exhaustive()
    }
}

impl OutputConfig {
    /// Resolve the output file name for one permutation.
    ///
    /// Priority: callback, then template (with `{modifier}` placeholders
    /// interpolated from the permutation inputs), then the renderer's
    /// default.
    pub fn resolve_file_name(
        &self,
        inputs: &ModifierInputs,
        renderer_default: impl FnOnce() -> String,
    ) -> String {
        if let Some(callback) = &self.file_callback {
            return callback(inputs);
        }
        match &self.file {
            Some(template) => interpolate(template, inputs),
            None => renderer_default(),
        }
    }
}

/// Replace `{modifier}` placeholders with the permutation's context
/// names (case-insensitive lookup). Unknown placeholders are kept
/// verbatim.
pub fn interpolate(template: &str, inputs: &ModifierInputs) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let placeholder = &after[..close];
        let replacement = inputs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(placeholder))
            .map(|(_, context)| context.as_str());
        match replacement {
            Some(context) => out.push_str(context),
            None => {
                out.push('{');
                out.push_str(placeholder);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}
