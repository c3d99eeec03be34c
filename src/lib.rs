pub mod build;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod lint;
pub mod render;
pub mod resolver;
pub mod support;
pub mod tokens;
pub mod warnings;

use std::path::{Path, PathBuf};

pub use build::{BuildCoordinator, BuildError, BuildOutput, BuildResult};
pub use config::{Config, ResolverSpec};
pub use error::{ErrorCode, TinctureError};
pub use lint::{LintResult, LintRunner, LintSettings};
pub use resolver::{Permutation, ResolverDocument, TokenResolver};
pub use resolver::reference::DocumentCache;
pub use tokens::{ResolvedToken, TokenMap};
pub use warnings::{TinctureWarning, ValidationMode, WarningSink};

/// Run a full build: resolve permutations, apply each output's processor
/// chain, render, and (when `buildPath` is set) write artifacts to disk.
///
/// Never returns an error; failures are aggregated into the result.
pub fn build(config: Config, base_dir: impl Into<PathBuf>) -> BuildResult {
    BuildCoordinator::new(config, base_dir).build()
}

/// Construct the [`TokenResolver`] a configuration describes.
fn resolver_for(config: &Config, base_dir: &Path) -> Result<TokenResolver, TinctureError> {
    let cache = DocumentCache::new();
    match &config.resolver {
        ResolverSpec::Path(path) => {
            let full = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };
            TokenResolver::from_file(&full, cache)
        }
        ResolverSpec::Inline(value) => {
            let document = ResolverDocument::from_value(value)?;
            TokenResolver::new(document, base_dir, cache)
        }
    }
}

/// Run the configured lint rules over the base permutation.
pub fn lint(config: &Config, base_dir: &Path) -> Result<LintResult, TinctureError> {
    let resolver = resolver_for(config, base_dir)?;
    let mut sink = WarningSink::new(config.validation.mode);
    let base = resolver.resolve_base(&mut sink)?;
    let settings = config.lint.clone().unwrap_or_default();
    LintRunner::new().run(&base.tokens, &settings)
}

/// Validate a configuration: resolver document, the token documents it
/// reaches, and the base permutation. Returns collected warnings on
/// success.
pub fn validate(config: &Config, base_dir: &Path) -> Result<Vec<TinctureWarning>, TinctureError> {
    let resolver = resolver_for(config, base_dir)?;
    let mut sink = WarningSink::new(config.validation.mode);
    let base = resolver.resolve_base(&mut sink)?;
    tracing::debug!(tokens = base.tokens.len(), "validated base permutation");
    Ok(sink.into_warnings())
}
