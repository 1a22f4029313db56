//! Collaborator traits implemented by the backing subsystems

use std::sync::Arc;

use crate::error::Result;
use crate::types::{RogueKind, RogueValue};

/// Capability set every backing subsystem offers to the platform state
///
/// Declarations are issued once, while the configuration is loaded. Criterion
/// values pushed with `set_criterion` stay pending until the subsystem commits
/// them; raw parameters written with `set_parameter` take effect immediately.
pub trait CriterionBackend: Send + Sync {
    /// Declare a criterion type
    fn declare_criterion_type(&self, name: &str, inclusive: bool);

    /// Declare a (code, literal) pair of an already declared type
    fn declare_criterion_value(&self, type_name: &str, code: u32, literal: &str);

    /// Declare a criterion of an already declared type
    fn declare_criterion(&self, name: &str, type_name: &str);

    /// Set a criterion value
    ///
    /// Returns true if the stored value changed
    fn set_criterion(&self, name: &str, value: u32) -> bool;

    /// Current value of a criterion, `None` if it was never declared
    fn get_criterion(&self, name: &str) -> Option<u32>;

    /// Write a raw parameter
    ///
    /// # Errors
    /// Returns an error if the path is unknown or holds another kind of value
    fn set_parameter(&self, path: &str, value: &RogueValue) -> Result<()>;

    /// Read a raw parameter of the given kind
    fn get_parameter(&self, path: &str, kind: RogueKind) -> Option<RogueValue>;
}

/// General-purpose subsystem, also the owner of the routing decision
pub trait StreamInterface: CriterionBackend {
    /// Ask the routing component to reconsider the routes
    ///
    /// The platform state never calls this while it holds its own lock, so an
    /// implementation may read state back synchronously.
    fn reconsider_routing(&self, synchronous: bool);
}

/// Sink for the routing subsystem's own log lines
pub trait ConnectorLogger: Send + Sync {
    /// Log a line, `is_warning` separates warnings from informational output
    fn log(&self, is_warning: bool, text: &str);
}

/// Routing subsystem
pub trait RouteConnector: CriterionBackend {
    /// Start the subsystem
    ///
    /// # Errors
    /// Returns `HalError::StartFailed` if the subsystem could not start
    fn start(&self) -> Result<()>;

    /// Whether `start` succeeded
    fn is_started(&self) -> bool;

    /// Atomically publish all pending criterion values
    fn apply_configurations(&self);

    /// Install or remove the log sink
    fn set_logger(&self, logger: Option<Arc<dyn ConnectorLogger>>);
}
