//! Audio HAL Core
//!
//! Platform-agnostic collaborator traits, value types and error handling shared
//! by the audio HAL platform-state engine and the code that hosts it.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Domain`, `RogueKind`, `RogueValue`, `Direction`, `BandType`
//! - **Collaborator Traits**: `CriterionBackend`, `StreamInterface`,
//!   `RouteConnector`, `ConnectorLogger`
//! - **Error Handling**: `HalError` and `Result`
//! - **Loopback collaborators**: in-memory implementations of the traits that
//!   record every call, used by the operator CLI and by tests
//!
//! # Example
//!
//! ```rust
//! use audio_hal_core::{CriterionBackend, LoopbackRouteConnector, RouteConnector};
//!
//! let connector = LoopbackRouteConnector::new("/etc/parameter-framework/Route.xml");
//! connector.declare_criterion_type("ModeType", false);
//! connector.declare_criterion_value("ModeType", 0, "Normal");
//! connector.declare_criterion("Mode", "ModeType");
//!
//! assert!(!connector.set_criterion("Mode", 0));
//! connector.apply_configurations();
//! assert_eq!(connector.apply_count(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod loopback;
pub mod traits;
pub mod types;

pub use error::{HalError, Result};
pub use loopback::{LoopbackBackend, LoopbackRouteConnector, LoopbackStreamInterface};
pub use traits::{ConnectorLogger, CriterionBackend, RouteConnector, StreamInterface};
pub use types::{BandType, Direction, Domain, RogueKind, RogueValue};
