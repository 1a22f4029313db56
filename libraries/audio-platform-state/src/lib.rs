//! Audio HAL - Platform State
//!
//! Keeps the typed state variables ("criteria") of the audio HAL in sync with
//! the free-text `key=value;key=value` configuration coming from the audio
//! policy layer.
//!
//! This crate provides:
//! - Criterion types (inclusive bitmasks and exclusive enumerations)
//! - Criteria in two independent domains: general-purpose and routing
//! - Parameters binding configuration keys to criteria or raw values
//! - Configuration loading from a hierarchical text file
//! - Change aggregation, so backing subsystems are committed and routing is
//!   reconsidered only when something actually changed
//! - Firmware diagnostic dumps
//!
//! # Architecture
//!
//! The backing subsystems are reached through the traits of `audio-hal-core`.
//! `PlatformState` owns all state behind one reader/writer lock and never
//! calls out to the routing manager while holding it.
//!
//! # Example
//!
//! ```rust
//! use audio_hal_core::{LoopbackRouteConnector, LoopbackStreamInterface};
//! use audio_platform_state::{PlatformState, PlatformStateSettings};
//! use std::sync::Arc;
//!
//! let conf = r#"
//! route {
//!     exclusive-criterion-type {
//!         ModeType "Normal,RingTone,InCall"
//!     }
//!     criterion {
//!         AndroidMode {
//!             type ModeType
//!             default Normal
//!             key mode
//!         }
//!     }
//! }
//! "#;
//!
//! let stream = Arc::new(LoopbackStreamInterface::new());
//! let connector = Arc::new(LoopbackRouteConnector::new("/tmp/Route.xml"));
//! let state = PlatformState::from_conf_str(
//!     PlatformStateSettings::default(),
//!     conf,
//!     stream.clone(),
//!     connector.clone(),
//! )?;
//!
//! state.set_parameters("mode=InCall", false)?;
//! assert_eq!(state.get_parameters("mode"), "mode=InCall");
//! assert_eq!(state.mode(), 2);
//! assert_eq!(stream.reconsider_count(), 1);
//! # Ok::<(), audio_platform_state::PlatformStateError>(())
//! ```

#![forbid(unsafe_code)]

mod accessors;
pub mod aggregator;
pub mod conf;
pub mod criterion;
pub mod criterion_type;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod key_value;
pub mod loader;
pub mod logger;
pub mod names;
pub mod parameter;
pub mod settings;
pub mod state;
pub mod value_list;

pub use aggregator::STATES_CHANGED;
pub use criterion::Criterion;
pub use criterion_type::CriterionType;
pub use diagnostics::DumpReport;
pub use error::{PlatformStateError, Result, ValueError};
pub use key_value::KeyValuePairs;
pub use logger::TracingConnectorLogger;
pub use parameter::{Binding, Parameter, ValueMapping};
pub use settings::PlatformStateSettings;
pub use state::{DomainSnapshot, PlatformState, PlatformStateSnapshot, StreamActivity};
