use serde::Serialize;
use tincture::{BuildResult, Config};
use wasm_bindgen::prelude::*;

/// Build outcome shape handed back to JavaScript.
#[derive(Serialize)]
struct JsBuildResult {
    success: bool,
    files: Vec<JsBuildFile>,
    errors: Vec<String>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct JsBuildFile {
    name: String,
    file: String,
    content: String,
    platform: String,
}

fn to_js_result(result: BuildResult) -> JsBuildResult {
    JsBuildResult {
        success: result.success,
        files: result
            .outputs
            .into_iter()
            .filter_map(|output| {
                output.content.map(|content| JsBuildFile {
                    name: output.name,
                    file: output.file,
                    content,
                    platform: output.platform,
                })
            })
            .collect(),
        errors: result
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.code.as_str(), error.message))
            .collect(),
        warnings: result.warnings.iter().map(ToString::to_string).collect(),
    }
}

/// Build token artifacts entirely in memory.
///
/// `config_json` must inline its resolver document; file references are
/// unavailable in the browser. Returns `{success, files, errors,
/// warnings}`.
#[wasm_bindgen]
pub fn build_tokens(config_json: &str) -> Result<JsValue, JsError> {
    let value: serde_json::Value =
        serde_json::from_str(config_json).map_err(|e| JsError::new(&e.to_string()))?;
    let mut config = Config::from_value(value).map_err(|e| JsError::new(&e.to_string()))?;
    // Never write to a filesystem from the browser.
    config.build_path = None;

    let result = tincture::build(config, ".");
    serde_wasm_bindgen::to_value(&to_js_result(result)).map_err(|e| JsError::new(&e.to_string()))
}

/// Validate a configuration, returning collected warnings.
#[wasm_bindgen]
pub fn validate_tokens(config_json: &str) -> Result<Vec<String>, JsError> {
    let value: serde_json::Value =
        serde_json::from_str(config_json).map_err(|e| JsError::new(&e.to_string()))?;
    let config = Config::from_value(value).map_err(|e| JsError::new(&e.to_string()))?;
    let warnings = tincture::validate(&config, std::path::Path::new("."))
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(warnings.iter().map(ToString::to_string).collect())
}
