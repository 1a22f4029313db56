//! State-changed aggregation
//!
//! The routing domain carries an inclusive criterion named `StatesChanged`
//! whose type has one bit per routing criterion. Marking a routing criterion
//! as changed raises its bit; any other change raises a general-purpose dirty
//! flag instead. A commit publishes the mask with the other criteria and then
//! clears both.

use tracing::{debug, trace};

use crate::domain::DomainState;
use crate::error::{PlatformStateError, Result};

/// Name of both the aggregator's criterion type and its criterion
pub const STATES_CHANGED: &str = "StatesChanged";

/// Maximum number of routing criteria that fit in the mask
pub const MAX_ROUTE_CRITERIA: u32 = u32::BITS;

/// Tracks what changed since the last commit
#[derive(Debug, Default)]
pub struct StateChangedAggregator {
    route_criteria: u32,
    audio_changed: bool,
}

impl StateChangedAggregator {
    /// Declare the aggregator's type and criterion in the routing domain
    ///
    /// # Errors
    /// Fails if either name is already declared
    pub fn install(route: &mut DomainState) -> Result<Self> {
        route.declare_type(STATES_CHANGED, true)?;
        route.declare_criterion(STATES_CHANGED, STATES_CHANGED, "")?;
        Ok(Self::default())
    }

    /// Give a newly declared routing criterion its bit
    ///
    /// # Errors
    /// Returns `TooManyRouteCriteria` once the mask is full
    pub fn register(&mut self, route: &mut DomainState, name: &str) -> Result<()> {
        let bit = 1u32
            .checked_shl(self.route_criteria)
            .ok_or_else(|| PlatformStateError::TooManyRouteCriteria(name.to_string()))?;
        route.add_type_value(STATES_CHANGED, bit, name)?;
        self.route_criteria += 1;
        debug!("route criterion {} tracked at bit {:#x}", name, bit);
        Ok(())
    }

    /// Number of routing criteria with a bit in the mask
    pub fn route_criteria(&self) -> u32 {
        self.route_criteria
    }

    /// Record a change of the state named `event`
    ///
    /// Names of routing criteria raise their bit; anything else sets the
    /// general-purpose dirty flag.
    pub fn mark(&mut self, route: &mut DomainState, event: &str) {
        let bit = route
            .types()
            .get(STATES_CHANGED)
            .filter(|_| !event.is_empty())
            .and_then(|states| states.encode(event));
        match bit {
            Some(bit) => {
                let pending = route.criterion_value(STATES_CHANGED).unwrap_or_default();
                route.set_criterion(STATES_CHANGED, pending | bit);
                trace!("{} changed, pending mask {:#x}", event, pending | bit);
            }
            None => {
                self.audio_changed = true;
                trace!("{} changed, general-purpose state dirty", event);
            }
        }
    }

    /// Routing criteria changed since the last clear, as a bitmask
    pub fn pending(&self, route: &DomainState) -> u32 {
        route.criterion_value(STATES_CHANGED).unwrap_or_default()
    }

    pub fn audio_changed(&self) -> bool {
        self.audio_changed
    }

    /// Whether anything changed since the last clear
    pub fn has_changed(&self, route: &DomainState) -> bool {
        self.audio_changed || self.pending(route) != 0
    }

    /// Reset the mask and the dirty flag
    pub fn clear(&mut self, route: &mut DomainState) {
        route.set_criterion(STATES_CHANGED, 0);
        self.audio_changed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_hal_core::{Domain, LoopbackBackend};
    use std::sync::Arc;

    fn route_with(criteria: &[&str]) -> (DomainState, StateChangedAggregator) {
        let mut route = DomainState::new(Domain::Route, Arc::new(LoopbackBackend::new()));
        let mut aggregator = StateChangedAggregator::install(&mut route).unwrap();
        route.declare_type("OnOff", false).unwrap();
        for name in criteria {
            route.declare_criterion(name, "OnOff", "").unwrap();
            aggregator.register(&mut route, name).unwrap();
        }
        (route, aggregator)
    }

    #[test]
    fn test_route_criteria_get_consecutive_bits() {
        let (route, aggregator) = route_with(&["A", "B", "C"]);
        let states = route.types().get(STATES_CHANGED).unwrap();
        assert_eq!(states.encode("A"), Some(1));
        assert_eq!(states.encode("B"), Some(2));
        assert_eq!(states.encode("C"), Some(4));
        assert_eq!(states.encode(STATES_CHANGED), None);
        assert_eq!(aggregator.route_criteria(), 3);
    }

    #[test]
    fn test_mark_route_and_audio_changes() {
        let (mut route, mut aggregator) = route_with(&["A", "B"]);
        assert!(!aggregator.has_changed(&route));

        aggregator.mark(&mut route, "B");
        assert_eq!(aggregator.pending(&route), 2);
        assert!(!aggregator.audio_changed());

        aggregator.mark(&mut route, "/Audio/volume");
        assert!(aggregator.audio_changed());

        aggregator.clear(&mut route);
        assert_eq!(aggregator.pending(&route), 0);
        assert!(!aggregator.has_changed(&route));
    }

    #[test]
    fn test_mask_is_full_after_32_criteria() {
        let names: Vec<String> = (0..32).map(|i| format!("C{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (mut route, mut aggregator) = route_with(&refs);

        route.declare_criterion("Overflow", "OnOff", "").unwrap();
        let err = aggregator.register(&mut route, "Overflow").unwrap_err();
        assert!(matches!(err, PlatformStateError::TooManyRouteCriteria(ref name) if name == "Overflow"));
    }
}
