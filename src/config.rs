//! Build configuration: the file shape consumed by the CLI and the
//! programmatic entry points.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::build::output::OutputConfig;
use crate::error::TinctureError;
use crate::lint::LintSettings;
use crate::warnings::ValidationMode;

/// The resolver input: a path to a resolver document, or the document
/// inline.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResolverSpec {
    Path(PathBuf),
    Inline(Value),
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ValidationSettings {
    #[serde(default)]
    pub mode: ValidationMode,
}

/// A full build configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub resolver: ResolverSpec,
    #[serde(default)]
    pub build_path: Option<PathBuf>,
    #[serde(default)]
    pub outputs: Vec<OutputConfig>,
    #[serde(default)]
    pub validation: ValidationSettings,
    #[serde(default)]
    pub lint: Option<LintSettings>,
}

/// Candidate config file names for discovery, in lookup order.
const CONFIG_CANDIDATES: &[&str] = &["tincture.config.json", "tincture.config.toml"];

impl Config {
    /// Load a config file, dispatching on extension (`.toml` or JSON).
    pub fn from_file(path: &Path) -> Result<Self, TinctureError> {
        let text = std::fs::read_to_string(path).map_err(|source| TinctureError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        let is_toml = path
            .extension()
            .is_some_and(|extension| extension == "toml");
        let parsed: Result<Self, String> = if is_toml {
            toml::from_str(&text).map_err(|error| error.to_string())
        } else {
            serde_json::from_str(&text).map_err(|error| error.to_string())
        };
        parsed.map_err(|message| TinctureError::Configuration {
            message: format!("{}: {message}", path.display()),
        })
    }

    pub fn from_value(value: Value) -> Result<Self, TinctureError> {
        serde_json::from_value(value).map_err(|error| TinctureError::Configuration {
            message: error.to_string(),
        })
    }
}

/// Locate `tincture.config.json` / `tincture.config.toml` in a directory.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_config_round_trips() {
        let config = Config::from_value(json!({
            "resolver": "./resolver.json",
            "buildPath": "dist",
            "outputs": [{
                "name": "css",
                "renderer": "css",
                "preset": "bundle",
                "preserveReferences": true,
                "transforms": ["nameKebabCase", "colorToHex"]
            }],
            "validation": {"mode": "warn"},
            "lint": {"rules": {"core/require-type": "error"}}
        }))
        .expect("valid config");

        assert!(matches!(config.resolver, ResolverSpec::Path(_)));
        assert_eq!(config.build_path.as_deref(), Some(Path::new("dist")));
        assert_eq!(config.outputs.len(), 1);
        assert!(config.outputs[0].preserve_references);
        assert_eq!(config.validation.mode, ValidationMode::Warn);
        assert!(config.lint.is_some());
    }

    #[test]
    fn inline_resolver_is_accepted() {
        let config = Config::from_value(json!({
            "resolver": {"version": "2025.10", "resolutionOrder": []},
            "outputs": []
        }))
        .expect("valid config");
        assert!(matches!(config.resolver, ResolverSpec::Inline(_)));
    }

    #[test]
    fn toml_config_parses() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tincture.config.toml");
        std::fs::write(
            &path,
            r#"
resolver = "./resolver.json"
buildPath = "dist"

[[outputs]]
name = "css"
renderer = "css"
"#,
        )
        .expect("fixture write");
        let config = Config::from_file(&path).expect("valid config");
        assert_eq!(config.outputs.len(), 1);
    }

    #[test]
    fn discovery_prefers_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("tincture.config.json"), "{}").expect("write");
        std::fs::write(dir.path().join("tincture.config.toml"), "").expect("write");
        let found = discover(dir.path()).expect("found");
        assert!(found.ends_with("tincture.config.json"));
    }

    #[test]
    fn malformed_config_is_configuration_error() {
        let result = Config::from_value(json!({"outputs": []}));
        assert!(matches!(result, Err(TinctureError::Configuration { .. })));
    }
}
