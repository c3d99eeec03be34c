//! Insta snapshot tests for rendered artifact text.
//!
//! Each test builds a minimal inline resolver through the full pipeline
//! and snapshots one emitted file. Run `cargo insta review` to accept
//! changes.

use serde_json::{Value, json};

use tincture::Config;

/// Build one output over a two-token resolver and return its files.
fn build_files(output: Value) -> std::collections::BTreeMap<String, String> {
    let config = Config::from_value(json!({
        "resolver": {
            "version": "2025.10",
            "sets": {
                "base": {
                    "sources": [{
                        "color": {
                            "$type": "color",
                            "brand": {"primary": {"$value": "#0066cc"}}
                        },
                        "semantic": {
                            "$type": "color",
                            "accent": {"$value": "{color.brand.primary}"}
                        }
                    }]
                }
            },
            "resolutionOrder": [{"$ref": "#/sets/base"}]
        },
        "outputs": [output]
    }))
    .expect("valid config");

    let result = tincture::build(config, ".");
    assert!(result.success, "errors: {:?}", result.errors);
    result
        .outputs
        .into_iter()
        .filter_map(|output| output.content.map(|content| (output.file, content)))
        .collect()
}

#[test]
fn test_snapshot_css_bundle() {
    let files = build_files(json!({
        "name": "css",
        "renderer": "css",
        "file": "tokens.css",
        "preset": "bundle",
        "preserveReferences": true
    }));
    let css = files.get("tokens.css").expect("css file");
    insta::assert_snapshot!("css_bundle", css);
}

#[test]
fn test_snapshot_js_module() {
    let files = build_files(json!({
        "name": "js",
        "renderer": "js",
        "file": "tokens.js",
        "preset": "standalone"
    }));
    let module = files.get("tokens.js").expect("js file");
    insta::assert_snapshot!("js_module", module);
}

#[test]
fn test_snapshot_android_object() {
    let files = build_files(json!({
        "name": "android",
        "renderer": "android",
        "file": "DesignTokens.kt",
        "preset": "standalone"
    }));
    let kotlin = files.get("DesignTokens.kt").expect("kotlin file");
    insta::assert_snapshot!("android_object", kotlin);
}
