//! Built-in lint rules (the `core` plugin). All disabled by default.

use std::rc::Rc;

use serde_json::{Value, json};

use crate::lint::{LintPlugin, LintRule, RuleContext, RuleMeta};
use crate::support::{casing, globs, refs};

/// The built-in plugin, registered under the `core` namespace.
pub fn core_plugin() -> LintPlugin {
    LintPlugin {
        rules: vec![
            Rc::new(RequireDescription),
            Rc::new(RequireType),
            Rc::new(NamingConvention),
            Rc::new(NoDeprecated),
            Rc::new(MaxNestingDepth),
            Rc::new(DuplicateValues),
        ],
    }
}

fn ignored(context: &RuleContext<'_>, name: &str) -> bool {
    let Some(patterns) = context.options.get("ignore").and_then(Value::as_array) else {
        return false;
    };
    let patterns: Vec<String> = patterns
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    globs::matches_any(name, &patterns)
}

struct RequireDescription;

impl LintRule for RequireDescription {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            name: "require-description",
            description: "Every token must carry a $description",
            messages: &[("missing", "'{token}' has no $description")],
        }
    }

    fn default_options(&self) -> Value {
        json!({"ignore": []})
    }

    fn check(&self, context: &mut RuleContext<'_>) {
        let tokens = context.tokens;
        for token in tokens.iter() {
            if token.description.is_none() && !ignored(context, &token.name) {
                context.report(token, "missing", &[]);
            }
        }
    }
}

struct RequireType;

impl LintRule for RequireType {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            name: "require-type",
            description: "Every token must resolve to a $type",
            messages: &[("missing", "'{token}' has no $type")],
        }
    }

    fn check(&self, context: &mut RuleContext<'_>) {
        let tokens = context.tokens;
        for token in tokens.iter() {
            if token.token_type.is_none() {
                context.report(token, "missing", &[]);
            }
        }
    }
}

struct NamingConvention;

impl NamingConvention {
    fn conforms(style: &str, segment: &str) -> bool {
        match style {
            "camel" => casing::to_camel_case(segment) == segment,
            "pascal" => casing::to_pascal_case(segment) == segment,
            "snake" => casing::to_snake_case(segment) == segment,
            _ => casing::to_kebab_case(segment) == segment,
        }
    }
}

impl LintRule for NamingConvention {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            name: "naming-convention",
            description: "Token path segments must follow one casing convention",
            messages: &[(
                "mismatch",
                "'{token}': segment '{segment}' is not {style} case",
            )],
        }
    }

    fn default_options(&self) -> Value {
        json!({"style": "kebab", "ignore": []})
    }

    fn check(&self, context: &mut RuleContext<'_>) {
        let style = context
            .options
            .get("style")
            .and_then(Value::as_str)
            .unwrap_or("kebab")
            .to_string();
        let tokens = context.tokens;
        for token in tokens.iter() {
            if ignored(context, &token.name) {
                continue;
            }
            if let Some(segment) = token
                .path
                .iter()
                .find(|segment| !Self::conforms(&style, segment))
            {
                let segment = segment.clone();
                context.report(token, "mismatch", &[("segment", &segment), ("style", &style)]);
            }
        }
    }
}

struct NoDeprecated;

impl LintRule for NoDeprecated {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            name: "no-deprecated",
            description: "Tokens must not reference deprecated tokens",
            messages: &[("deprecated", "'{token}' references deprecated token '{target}'")],
        }
    }

    fn check(&self, context: &mut RuleContext<'_>) {
        let tokens = context.tokens;
        for token in tokens.iter() {
            for target in refs::extract_references(&token.original_value) {
                let deprecated = tokens
                    .get(&target)
                    .is_some_and(crate::tokens::ResolvedToken::is_deprecated);
                if deprecated {
                    context.report(token, "deprecated", &[("target", &target)]);
                }
            }
        }
    }
}

struct MaxNestingDepth;

impl LintRule for MaxNestingDepth {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            name: "max-nesting-depth",
            description: "Token paths must not nest deeper than the configured maximum",
            messages: &[("deep", "'{token}' nests {depth} levels deep (max {max})")],
        }
    }

    fn default_options(&self) -> Value {
        json!({"max": 4})
    }

    fn check(&self, context: &mut RuleContext<'_>) {
        let max = context
            .options
            .get("max")
            .and_then(Value::as_u64)
            .unwrap_or(4) as usize;
        let tokens = context.tokens;
        for token in tokens.iter() {
            if token.path.len() > max {
                let depth = token.path.len().to_string();
                let max = max.to_string();
                context.report(token, "deep", &[("depth", &depth), ("max", &max)]);
            }
        }
    }
}

struct DuplicateValues;

impl LintRule for DuplicateValues {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            name: "duplicate-values",
            description: "Same-type tokens should not repeat identical literal values",
            messages: &[(
                "duplicate",
                "'{token}' repeats the value of '{original}'; consider an alias",
            )],
        }
    }

    fn check(&self, context: &mut RuleContext<'_>) {
        let tokens = context.tokens;
        let mut seen: Vec<(&str, &Value, &str)> = Vec::new();
        for token in tokens.iter() {
            // Aliases legitimately share their target's value.
            if token.is_alias || refs::alias_target(&token.value).is_some() {
                continue;
            }
            let Some(token_type) = token.token_type.as_deref() else {
                continue;
            };
            let duplicate_of = seen
                .iter()
                .find(|(seen_type, seen_value, _)| {
                    *seen_type == token_type && *seen_value == &token.value
                })
                .map(|(_, _, name)| (*name).to_string());
            match duplicate_of {
                Some(original) => context.report(token, "duplicate", &[("original", &original)]),
                None => seen.push((token_type, &token.value, &token.name)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::{LintRunner, LintSettings};
    use crate::tokens::{Deprecated, ResolvedToken, TokenMap};

    fn token(name: &str, token_type: Option<&str>, value: Value) -> ResolvedToken {
        let mut t = ResolvedToken::new(name.split('.').map(str::to_string).collect(), value);
        t.token_type = token_type.map(str::to_string);
        t
    }

    fn run(tokens: Vec<ResolvedToken>, rules: Value) -> crate::lint::LintResult {
        let settings: LintSettings =
            serde_json::from_value(json!({ "rules": rules })).expect("valid settings");
        let map: TokenMap = tokens.into_iter().collect();
        LintRunner::new().run(&map, &settings).expect("runs")
    }

    #[test]
    fn require_description_with_ignores() {
        let mut described = token("color.bg", Some("color"), json!("#ffffff"));
        described.description = Some("Background".to_string());
        let result = run(
            vec![
                described,
                token("color.fg", Some("color"), json!("#111111")),
                token("internal.scratch", Some("color"), json!("#222222")),
            ],
            json!({"core/require-description": ["warn", {"ignore": ["internal.*"]}]}),
        );
        assert_eq!(result.warning_count, 1);
        assert_eq!(result.issues[0].token, "color.fg");
    }

    #[test]
    fn naming_convention_flags_wrong_case() {
        let result = run(
            vec![
                token("color.brandPrimary", Some("color"), json!("#0066cc")),
                token("color.fg", Some("color"), json!("#111111")),
            ],
            json!({"core/naming-convention": "error"}),
        );
        assert_eq!(result.error_count, 1);
        assert!(result.issues[0].message.contains("brandPrimary"));
    }

    #[test]
    fn no_deprecated_follows_references() {
        let mut old = token("color.legacy", Some("color"), json!("#333333"));
        old.deprecated = Some(Deprecated::Reason("use color.bg".to_string()));
        let mut alias = token("semantic.surface", Some("color"), json!("#333333"));
        alias.original_value = json!("{color.legacy}");
        alias.is_alias = true;
        let result = run(
            vec![old, alias],
            json!({"core/no-deprecated": "error"}),
        );
        assert_eq!(result.error_count, 1);
        assert!(result.issues[0].message.contains("color.legacy"));
    }

    #[test]
    fn duplicate_values_skips_aliases() {
        let mut alias = token("semantic.surface", Some("color"), json!("#ffffff"));
        alias.is_alias = true;
        let result = run(
            vec![
                token("color.bg", Some("color"), json!("#ffffff")),
                token("color.paper", Some("color"), json!("#ffffff")),
                alias,
            ],
            json!({"core/duplicate-values": "warn"}),
        );
        assert_eq!(result.warning_count, 1);
        assert_eq!(result.issues[0].token, "color.paper");
    }
}
