//! Lint runner behavior over resolved token maps.

use std::path::Path;

use serde_json::json;

use tincture::lint::{LintRunner, LintSettings, LintSeverity};
use tincture::{Config, ValidationMode, WarningSink};

fn resolve_fixture_tokens() -> tincture::TokenMap {
    let resolver = tincture::TokenResolver::from_file(
        Path::new("tests/fixtures/resolver.json"),
        tincture::DocumentCache::new(),
    )
    .expect("fixture resolver loads");
    let mut sink = WarningSink::new(ValidationMode::Error);
    resolver.resolve_base(&mut sink).expect("base resolves").tokens
}

#[test]
fn require_type_reports_exactly_one_issue() {
    let settings: LintSettings = serde_json::from_value(json!({
        "rules": {"core/require-type": "error"}
    }))
    .expect("valid settings");

    let mut tokens = tincture::TokenMap::new();
    let mut naked = tincture::ResolvedToken::new(vec!["naked".to_string()], json!("#000000"));
    naked.token_type = None;
    tokens.insert(naked);
    let mut typed = tincture::ResolvedToken::new(vec!["typed".to_string()], json!("#ffffff"));
    typed.token_type = Some("color".to_string());
    tokens.insert(typed);

    let result = LintRunner::new().run(&tokens, &settings).expect("runs");
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.error_count, 1);
    assert_eq!(result.warning_count, 0);
    assert_eq!(result.issues[0].severity, LintSeverity::Error);
    assert_eq!(result.issues[0].token, "naked");
}

#[test]
fn fixture_tokens_missing_descriptions_warn() {
    let tokens = resolve_fixture_tokens();
    let settings: LintSettings = serde_json::from_value(json!({
        "rules": {"core/require-description": "warn"}
    }))
    .expect("valid settings");

    let result = LintRunner::new().run(&tokens, &settings).expect("runs");
    // Only color.brand.primary carries a description in the fixtures.
    assert_eq!(result.error_count, 0);
    assert!(result.warning_count > 0);
    assert!(result.issues.iter().all(|issue| issue.token != "color.brand.primary"));
}

#[test]
fn lint_entry_point_uses_config_rules() {
    let config = Config::from_file(Path::new("tests/fixtures/config.json"))
        .expect("fixture config loads");
    let result = tincture::lint(&config, Path::new("tests/fixtures")).expect("lints");
    assert_eq!(result.error_count, 0);
    assert!(result.warning_count > 0);
}

#[test]
fn rules_run_in_declared_order() {
    let settings: LintSettings = serde_json::from_value(json!({
        "rules": {
            "core/require-description": "warn",
            "core/require-type": "warn"
        }
    }))
    .expect("valid settings");

    let mut tokens = tincture::TokenMap::new();
    let mut naked = tincture::ResolvedToken::new(vec!["naked".to_string()], json!("#000000"));
    naked.token_type = None;
    tokens.insert(naked);

    let result = LintRunner::new().run(&tokens, &settings).expect("runs");
    assert_eq!(result.issues.len(), 2);
    assert_eq!(result.issues[0].rule, "core/require-description");
    assert_eq!(result.issues[1].rule, "core/require-type");
}
