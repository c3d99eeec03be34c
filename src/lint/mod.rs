//! Lint engine: rule model, plugin registry, rule-config resolution,
//! and the runner.
//!
//! Rules are pure over the resolved token map and run independently, in
//! the declared configuration order. Lint issues are a separate result
//! stream from build errors, with their own severity counts.

pub mod rules;

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::TinctureError;
use crate::tokens::{ResolvedToken, TokenMap};

/// Rule identity and message templates.
#[derive(Debug, Clone, Copy)]
pub struct RuleMeta {
    pub name: &'static str,
    pub description: &'static str,
    /// `(message id, template)`; `{placeholder}` slots interpolate from
    /// report data, with `{token}` always bound to the token name.
    pub messages: &'static [(&'static str, &'static str)],
}

/// A lint rule: metadata, default options, and the check itself.
pub trait LintRule {
    fn meta(&self) -> RuleMeta;
    fn default_options(&self) -> Value {
        Value::Null
    }
    fn check(&self, context: &mut RuleContext<'_>);
}

/// A namespace's worth of rules.
#[derive(Clone, Default)]
pub struct LintPlugin {
    pub rules: Vec<Rc<dyn LintRule>>,
}

impl LintPlugin {
    fn rule(&self, name: &str) -> Option<&Rc<dyn LintRule>> {
        self.rules.iter().find(|rule| rule.meta().name == name)
    }
}

/// Severity a rule is configured at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    Off,
    Warn,
    Error,
}

impl fmt::Display for LintSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Warn => f.write_str("warn"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Lint configuration: `"ns/rule-name"` → severity or
/// `[severity, options]`. Rules are disabled by default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LintSettings {
    #[serde(default)]
    pub rules: IndexMap<String, Value>,
}

/// One reported issue with its interpolated message.
#[derive(Debug, Clone)]
pub struct LintIssue {
    pub rule: String,
    pub severity: LintSeverity,
    pub token: String,
    pub message: String,
}

/// Aggregated lint outcome.
#[derive(Debug, Default)]
pub struct LintResult {
    pub issues: Vec<LintIssue>,
    pub error_count: usize,
    pub warning_count: usize,
}

/// What a running rule sees: the token map, its merged options, and the
/// report callback.
pub struct RuleContext<'a> {
    pub tokens: &'a TokenMap,
    pub options: &'a Value,
    rule_id: &'a str,
    severity: LintSeverity,
    meta: RuleMeta,
    issues: &'a mut Vec<LintIssue>,
}

impl RuleContext<'_> {
    /// Append an issue for `token`, interpolating the rule's message
    /// template identified by `message_id`.
    pub fn report(&mut self, token: &ResolvedToken, message_id: &str, data: &[(&str, &str)]) {
        let template = self
            .meta
            .messages
            .iter()
            .find(|(id, _)| *id == message_id)
            .map_or(message_id, |(_, template)| template);
        let mut message = template.replace("{token}", &token.name);
        for (key, value) in data {
            message = message.replace(&format!("{{{key}}}"), value);
        }
        self.issues.push(LintIssue {
            rule: self.rule_id.to_string(),
            severity: self.severity,
            token: token.name.clone(),
            message,
        });
    }
}

/// Loads plugins, resolves rule configs, executes rules, and aggregates
/// issues.
pub struct LintRunner {
    plugins: IndexMap<String, LintPlugin>,
}

impl Default for LintRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl LintRunner {
    /// A runner with the built-in `core` plugin registered.
    pub fn new() -> Self {
        let mut plugins = IndexMap::new();
        plugins.insert("core".to_string(), rules::core_plugin());
        Self { plugins }
    }

    pub fn register_plugin(&mut self, namespace: impl Into<String>, plugin: LintPlugin) {
        self.plugins.insert(namespace.into(), plugin);
    }

    /// Execute every enabled rule over the token map.
    pub fn run(
        &self,
        tokens: &TokenMap,
        settings: &LintSettings,
    ) -> Result<LintResult, TinctureError> {
        let mut result = LintResult::default();

        for (rule_id, configured) in &settings.rules {
            let (severity, options) = parse_rule_config(rule_id, configured)?;
            if severity == LintSeverity::Off {
                continue;
            }

            let (namespace, rule_name) =
                rule_id
                    .split_once('/')
                    .ok_or_else(|| TinctureError::Configuration {
                        message: format!("lint rule '{rule_id}' must be namespaced as 'ns/rule'"),
                    })?;
            let plugin =
                self.plugins
                    .get(namespace)
                    .ok_or_else(|| TinctureError::Configuration {
                        message: format!("unknown lint plugin '{namespace}'"),
                    })?;
            let rule = plugin
                .rule(rule_name)
                .ok_or_else(|| TinctureError::Configuration {
                    message: format!("unknown lint rule '{rule_id}'"),
                })?;

            let merged = merge_options(&rule.default_options(), &options);
            tracing::debug!(rule = %rule_id, %severity, "running lint rule");
            let mut context = RuleContext {
                tokens,
                options: &merged,
                rule_id,
                severity,
                meta: rule.meta(),
                issues: &mut result.issues,
            };
            rule.check(&mut context);
        }

        result.error_count = result
            .issues
            .iter()
            .filter(|issue| issue.severity == LintSeverity::Error)
            .count();
        result.warning_count = result
            .issues
            .iter()
            .filter(|issue| issue.severity == LintSeverity::Warn)
            .count();
        Ok(result)
    }
}

/// `"error"` or `["error", {options}]`.
fn parse_rule_config(
    rule_id: &str,
    configured: &Value,
) -> Result<(LintSeverity, Value), TinctureError> {
    let invalid = || TinctureError::Configuration {
        message: format!(
            "rule '{rule_id}' must be configured as a severity or [severity, options]"
        ),
    };
    match configured {
        Value::String(_) => {
            let severity: LintSeverity =
                serde_json::from_value(configured.clone()).map_err(|_| invalid())?;
            Ok((severity, Value::Null))
        }
        Value::Array(entries) => {
            let severity_value = entries.first().ok_or_else(invalid)?;
            let severity: LintSeverity =
                serde_json::from_value(severity_value.clone()).map_err(|_| invalid())?;
            let options = entries.get(1).cloned().unwrap_or(Value::Null);
            Ok((severity, options))
        }
        _ => Err(invalid()),
    }
}

/// Shallow-merge configured options over the rule's defaults.
fn merge_options(defaults: &Value, configured: &Value) -> Value {
    match (defaults, configured) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (_, Value::Null) => defaults.clone(),
        _ => configured.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens_missing_type() -> TokenMap {
        let mut token = ResolvedToken::new(vec!["naked".to_string()], json!("#000000"));
        token.token_type = None;
        vec![token].into_iter().collect()
    }

    #[test]
    fn enabled_rule_reports_with_counts() {
        let runner = LintRunner::new();
        let settings: LintSettings = serde_json::from_value(json!({
            "rules": {"core/require-type": "error"}
        }))
        .expect("valid settings");
        let result = runner.run(&tokens_missing_type(), &settings).expect("runs");
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.warning_count, 0);
        assert_eq!(result.issues[0].token, "naked");
    }

    #[test]
    fn off_keeps_rule_disabled() {
        let runner = LintRunner::new();
        let settings: LintSettings = serde_json::from_value(json!({
            "rules": {"core/require-type": "off"}
        }))
        .expect("valid settings");
        let result = runner.run(&tokens_missing_type(), &settings).expect("runs");
        assert!(result.issues.is_empty());
    }

    #[test]
    fn unknown_rule_is_configuration_error() {
        let runner = LintRunner::new();
        let settings: LintSettings = serde_json::from_value(json!({
            "rules": {"core/ghost": "warn"}
        }))
        .expect("valid settings");
        assert!(matches!(
            runner.run(&TokenMap::new(), &settings),
            Err(TinctureError::Configuration { .. })
        ));
    }

    #[test]
    fn custom_plugin_namespace() {
        let mut runner = LintRunner::new();
        runner.register_plugin(
            "custom",
            LintPlugin {
                rules: rules::core_plugin().rules,
            },
        );
        let settings: LintSettings = serde_json::from_value(json!({
            "rules": {"custom/require-type": "error"}
        }))
        .expect("valid settings");
        let result = runner.run(&tokens_missing_type(), &settings).expect("runs");
        assert_eq!(result.error_count, 1);
    }

    #[test]
    fn options_merge_over_defaults() {
        let runner = LintRunner::new();
        let settings: LintSettings = serde_json::from_value(json!({
            "rules": {"core/max-nesting-depth": ["warn", {"max": 1}]}
        }))
        .expect("valid settings");
        let mut token =
            ResolvedToken::new(vec!["a".to_string(), "b".to_string()], json!("#000000"));
        token.token_type = Some("color".to_string());
        let tokens: TokenMap = vec![token].into_iter().collect();
        let result = runner.run(&tokens, &settings).expect("runs");
        assert_eq!(result.warning_count, 1);
    }
}
