//! Formula error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or installing a formula.
///
/// Every variant is fatal at this layer: nothing is retried and no
/// fallback mirror is consulted.
#[derive(Error, Debug)]
pub enum FormulaError {
    #[error("sha256 integrity check failed for '{name}'\n  expected: {expected}\n  got:      {actual}")]
    Integrity {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("{what} is unavailable: {reason}")]
    Unavailable { what: String, reason: String },

    #[error("invalid formula: {0}")]
    Invalid(String),

    #[error("command failed: {cmd} (exit code: {code:?})")]
    CommandFailed { cmd: String, code: Option<i32> },

    #[error("refusing to overwrite '{0}': not owned by this formula")]
    Conflict(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormulaError {
    /// Shorthand for an unavailability failure.
    pub fn unavailable(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unavailable {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = FormulaError> = std::result::Result<T, E>;
