//! Core error types for the audio HAL

use thiserror::Error;

use crate::types::RogueKind;

/// Result type alias using `HalError`
pub type Result<T> = std::result::Result<T, HalError>;

/// Errors reported by the backing subsystems and by raw value conversion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HalError {
    /// The routing subsystem refused to start
    #[error("Route parameter manager failed to start: {0}")]
    StartFailed(String),

    /// No raw parameter exists at the given path
    #[error("Unknown parameter path: {0}")]
    UnknownParameter(String),

    /// A raw parameter was written with a value of another kind
    #[error("Parameter {path} holds a {expected} value, got {actual}")]
    TypeMismatch {
        /// Parameter path
        path: String,
        /// Kind the parameter was declared with
        expected: RogueKind,
        /// Kind of the rejected value
        actual: RogueKind,
    },

    /// A literal could not be converted to the requested kind
    #[error("Invalid {kind} literal: {literal:?}")]
    InvalidLiteral {
        /// Requested kind
        kind: RogueKind,
        /// Rejected literal
        literal: String,
    },
}

impl HalError {
    /// Create a start failure
    pub fn start_failed(msg: impl Into<String>) -> Self {
        Self::StartFailed(msg.into())
    }

    /// Create an invalid literal error
    pub fn invalid_literal(kind: RogueKind, literal: impl Into<String>) -> Self {
        Self::InvalidLiteral {
            kind,
            literal: literal.into(),
        }
    }
}
