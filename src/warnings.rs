use std::fmt;

use serde::Deserialize;

use crate::error::TinctureError;

/// Three-level validation policy carried through the parser, reference
/// resolver, and modifier processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Any validation issue raises an error.
    #[default]
    Error,
    /// Issues are collected as warnings; lenient semantics apply.
    Warn,
    /// Checks are skipped entirely.
    Off,
}

/// Non-fatal issues collected while resolving and building tokens.
///
/// Displayed after completion in default/verbose modes. Suppressed by
/// `--quiet`. Never cause non-zero exit codes.
#[derive(Debug, Clone)]
pub enum TinctureWarning {
    CaseCollision {
        first: String,
        second: String,
    },
    AliasTypeMismatch {
        token: String,
        declared: String,
        resolved: String,
    },
    UnknownModifier {
        name: String,
    },
    UnknownContext {
        modifier: String,
        context: String,
    },
    InvalidToken {
        message: String,
    },
    TransformSkipped {
        transform: String,
        token: String,
        reason: String,
    },
}

impl fmt::Display for TinctureWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CaseCollision { first, second } => {
                write!(f, "token names '{first}' and '{second}' differ only in case")
            }
            Self::AliasTypeMismatch {
                token,
                declared,
                resolved,
            } => {
                write!(
                    f,
                    "'{token}' declares $type '{declared}' but its alias target resolves to '{resolved}'"
                )
            }
            Self::UnknownModifier { name } => {
                write!(f, "unknown modifier '{name}' ignored")
            }
            Self::UnknownContext { modifier, context } => {
                write!(f, "unknown context '{context}' for modifier '{modifier}', using default")
            }
            Self::InvalidToken { message } => f.write_str(message),
            Self::TransformSkipped {
                transform,
                token,
                reason,
            } => {
                write!(f, "transform '{transform}' skipped for '{token}': {reason}")
            }
        }
    }
}

impl TinctureWarning {
    /// Promote this warning to the error it becomes under
    /// [`ValidationMode::Error`].
    fn into_error(self) -> TinctureError {
        match self {
            Self::UnknownModifier { ref name } => TinctureError::Modifier {
                message: format!("unknown modifier '{name}'"),
                suggestions: String::new(),
            },
            Self::UnknownContext {
                ref modifier,
                ref context,
            } => TinctureError::Modifier {
                message: format!("unknown context '{context}' for modifier '{modifier}'"),
                suggestions: String::new(),
            },
            other => TinctureError::Validation {
                message: other.to_string(),
            },
        }
    }
}

/// Collects warnings during resolution and building, honoring the
/// configured [`ValidationMode`].
#[derive(Debug, Default)]
pub struct WarningSink {
    mode: ValidationMode,
    warnings: Vec<TinctureWarning>,
}

impl WarningSink {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            warnings: Vec::new(),
        }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Report a mode-sensitive validation issue.
    ///
    /// In `error` mode the issue is promoted to a hard error; in `warn`
    /// mode it is collected and processing continues; in `off` mode it is
    /// dropped.
    pub fn report(&mut self, warning: TinctureWarning) -> Result<(), TinctureError> {
        match self.mode {
            ValidationMode::Error => Err(warning.into_error()),
            ValidationMode::Warn => {
                tracing::warn!(%warning, "validation issue");
                self.warnings.push(warning);
                Ok(())
            }
            ValidationMode::Off => Ok(()),
        }
    }

    /// Record an advisory issue that stays a warning in every mode
    /// except `off` (case collisions and other SHOULD-level checks).
    pub fn advise(&mut self, warning: TinctureWarning) {
        if self.mode == ValidationMode::Off {
            return;
        }
        tracing::warn!(%warning, "advisory");
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[TinctureWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<TinctureWarning> {
        self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
