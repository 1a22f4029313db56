//! Error types for the platform state

use audio_hal_core::{HalError, RogueKind};
use thiserror::Error;

use crate::value_list::ListSyntaxError;

/// Result type for platform state operations
pub type Result<T> = std::result::Result<T, PlatformStateError>;

/// Errors raised by the platform state
///
/// Schema errors come out of configuration loading and mean the configuration
/// file itself is wrong. `BadValue` aggregates the per-entry input errors of a
/// single `set_parameters` call.
#[derive(Error, Debug)]
pub enum PlatformStateError {
    /// Criterion type declared twice in one domain
    #[error("Criterion type {name} already declared for {domain}")]
    DuplicateCriterionType { domain: &'static str, name: String },

    /// Reference to a criterion type that was never declared
    #[error("Criterion type {name:?} not found for {domain}")]
    UnknownCriterionType { domain: &'static str, name: String },

    /// Criterion declared twice in one domain
    #[error("Criterion {name} already declared for {domain}")]
    DuplicateCriterion { domain: &'static str, name: String },

    /// Reference to a criterion that was never declared
    #[error("Criterion {name:?} not found for {domain}")]
    UnknownCriterion { domain: &'static str, name: String },

    /// Malformed value list or mapping table
    #[error("Invalid value list for {owner}: {source}")]
    InvalidValueList {
        owner: String,
        #[source]
        source: ListSyntaxError,
    },

    /// Rogue parameter without a configuration key
    #[error("Rogue parameter {0} is not bound to any key")]
    MissingParameterKey(String),

    /// The state-changed bitmask has no room for another routing criterion
    #[error("Route criterion {0} does not fit in the state-changed mask")]
    TooManyRouteCriteria(String),

    /// Configuration file syntax error
    #[error("Syntax error at line {line}, column {column}: {message}")]
    ConfSyntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// One or more values of a `set_parameters` call could not be applied
    #[error("{count} parameter value(s) could not be applied")]
    BadValue { count: usize },

    /// The routing subsystem did not start
    #[error("Platform state not started: {0}")]
    NotStarted(String),

    /// Settings could not be loaded or are invalid
    #[error("Settings error: {0}")]
    Settings(String),

    /// Backing subsystem error
    #[error(transparent)]
    Hal(#[from] HalError),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-entry conversion failure while dispatching a key/value pair
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// Literal is not part of the criterion type
    #[error("{literal:?} is not a value of criterion type {type_name}")]
    UnknownLiteral { type_name: String, literal: String },

    /// Literal does not convert to the rogue parameter's kind
    #[error("{literal:?} is not a valid {kind} value")]
    Unconvertible { kind: RogueKind, literal: String },

    /// The parameter's criterion has disappeared from its domain
    #[error("Criterion {0} is not declared")]
    MissingCriterion(String),

    /// The backing subsystem refused the raw value
    #[error("Backing store rejected the value: {0}")]
    Rejected(#[from] HalError),
}
