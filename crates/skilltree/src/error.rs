//! Error types for skill tree sessions.
//!
//! Editing operations on a [`TreeStore`](crate::tree::TreeStore) never fail.
//! [`SkillTreeError`] covers the outer surfaces: reading inputs, resolving
//! style configuration, parsing session scripts and producing output.

use std::io;

use thiserror::Error;

use crate::script::ScriptError;

/// The main error type for skill tree sessions.
///
/// The `Script` variant keeps the script source next to the diagnostic so
/// callers can render the offending span.
#[derive(Debug, Error)]
pub enum SkillTreeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{err}")]
    Script { err: ScriptError, src: String },

    #[error("Export error: {0}")]
    Export(String),
}

impl SkillTreeError {
    /// Create a new `Script` error with the associated source code.
    pub fn new_script_error(err: ScriptError, src: impl Into<String>) -> Self {
        Self::Script {
            err,
            src: src.into(),
        }
    }
}
