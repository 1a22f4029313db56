//! Routing subsystem log sink

use audio_hal_core::ConnectorLogger;
use tracing::{debug, warn};

/// Prefix of every line forwarded from the routing subsystem
pub const LOG_PREFIX: &str = "route-parameter-manager: ";

/// Forwards routing subsystem logs to `tracing`
///
/// Warnings are always forwarded. Informational lines are forwarded at debug
/// level only when verbose logging is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConnectorLogger {
    verbose: bool,
}

impl TracingConnectorLogger {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ConnectorLogger for TracingConnectorLogger {
    fn log(&self, is_warning: bool, text: &str) {
        if is_warning {
            warn!("{}{}", LOG_PREFIX, text);
        } else if self.verbose {
            debug!("{}{}", LOG_PREFIX, text);
        }
    }
}
