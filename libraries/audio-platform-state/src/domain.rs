//! Per-domain bookkeeping
//!
//! Each domain keeps its own criterion types and criteria and mirrors every
//! declaration to its backing subsystem. Criterion values stay local until
//! `push_criteria` publishes them.

use std::sync::Arc;

use audio_hal_core::{CriterionBackend, Domain};
use tracing::trace;

use crate::aggregator::StateChangedAggregator;
use crate::criterion::CriterionStore;
use crate::criterion_type::CriterionTypeRegistry;
use crate::error::Result;

/// Types, criteria and backing subsystem of one domain
pub struct DomainState {
    domain: Domain,
    types: CriterionTypeRegistry,
    criteria: CriterionStore,
    backend: Arc<dyn CriterionBackend>,
}

impl DomainState {
    /// Create an empty domain on top of its backing subsystem
    pub fn new(domain: Domain, backend: Arc<dyn CriterionBackend>) -> Self {
        Self {
            domain,
            types: CriterionTypeRegistry::new(domain.as_str()),
            criteria: CriterionStore::new(domain.as_str()),
            backend,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn types(&self) -> &CriterionTypeRegistry {
        &self.types
    }

    pub fn criteria(&self) -> &CriterionStore {
        &self.criteria
    }

    pub fn backend(&self) -> &dyn CriterionBackend {
        self.backend.as_ref()
    }

    /// Declare a criterion type here and on the backing subsystem
    ///
    /// # Errors
    /// Returns `DuplicateCriterionType` if the name is taken in this domain
    pub fn declare_type(&mut self, name: &str, inclusive: bool) -> Result<()> {
        self.types.declare_type(name, inclusive)?;
        self.backend.declare_criterion_type(name, inclusive);
        Ok(())
    }

    /// Add a value to a criterion type here and on the backing subsystem
    ///
    /// # Errors
    /// Returns `UnknownCriterionType` if the type is not declared
    pub fn add_type_value(&mut self, type_name: &str, code: u32, literal: &str) -> Result<()> {
        self.types.add_value(type_name, code, literal)?;
        self.backend
            .declare_criterion_value(type_name, code, literal);
        Ok(())
    }

    /// Declare a criterion here and on the backing subsystem
    ///
    /// # Errors
    /// Returns `DuplicateCriterion` or `UnknownCriterionType`
    pub fn declare_criterion(
        &mut self,
        name: &str,
        type_name: &str,
        default_literal: &str,
    ) -> Result<()> {
        self.criteria
            .declare(name, type_name, default_literal, &self.types)?;
        self.backend.declare_criterion(name, type_name);
        Ok(())
    }

    /// Store a criterion value locally, `None` if the criterion is unknown
    pub fn set_criterion(&mut self, name: &str, value: u32) -> Option<bool> {
        self.criteria.set(name, value)
    }

    pub fn criterion_value(&self, name: &str) -> Option<u32> {
        self.criteria.value(name)
    }

    /// Push every criterion value to the backing subsystem
    pub fn push_criteria(&self) {
        for criterion in self.criteria.iter() {
            trace!(
                "{}: pushing {} = {:#x}",
                self.domain,
                criterion.name(),
                criterion.value()
            );
            self.backend
                .set_criterion(criterion.name(), criterion.value());
        }
    }
}

/// Both domains together with the state-changed aggregator
pub struct Domains {
    pub audio: DomainState,
    pub route: DomainState,
    aggregator: StateChangedAggregator,
}

impl Domains {
    /// Create both domains and install the aggregator in the routing domain
    ///
    /// # Errors
    /// Fails only if the aggregator's type or criterion cannot be declared
    pub fn new(
        audio_backend: Arc<dyn CriterionBackend>,
        route_backend: Arc<dyn CriterionBackend>,
    ) -> Result<Self> {
        let audio = DomainState::new(Domain::Audio, audio_backend);
        let mut route = DomainState::new(Domain::Route, route_backend);
        let aggregator = StateChangedAggregator::install(&mut route)?;
        Ok(Self {
            audio,
            route,
            aggregator,
        })
    }

    pub fn get(&self, domain: Domain) -> &DomainState {
        match domain {
            Domain::Audio => &self.audio,
            Domain::Route => &self.route,
        }
    }

    pub fn get_mut(&mut self, domain: Domain) -> &mut DomainState {
        match domain {
            Domain::Audio => &mut self.audio,
            Domain::Route => &mut self.route,
        }
    }

    /// Declare a criterion in a domain
    ///
    /// Routing criteria also become a bit of the state-changed mask.
    ///
    /// # Errors
    /// Returns the declaration error, or `TooManyRouteCriteria`
    pub fn declare_criterion(
        &mut self,
        domain: Domain,
        name: &str,
        type_name: &str,
        default_literal: &str,
    ) -> Result<()> {
        match domain {
            Domain::Audio => self.audio.declare_criterion(name, type_name, default_literal),
            Domain::Route => {
                self.route.declare_criterion(name, type_name, default_literal)?;
                self.aggregator.register(&mut self.route, name)
            }
        }
    }

    /// Record that the state named `event` changed
    pub fn mark_changed(&mut self, event: &str) {
        self.aggregator.mark(&mut self.route, event);
    }

    /// Whether anything changed since the last commit
    pub fn has_changed(&self) -> bool {
        self.aggregator.has_changed(&self.route)
    }

    /// Routing criteria changed since the last commit, as a bitmask
    pub fn pending_route_changes(&self) -> u32 {
        self.aggregator.pending(&self.route)
    }

    /// Whether a general-purpose change is pending
    pub fn audio_changed(&self) -> bool {
        self.aggregator.audio_changed()
    }

    /// Push every criterion of both domains, including the change mask
    pub fn push_all(&self) {
        self.audio.push_criteria();
        self.route.push_criteria();
    }

    /// Forget all pending changes
    pub fn clear_changes(&mut self) {
        self.aggregator.clear(&mut self.route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_hal_core::LoopbackBackend;

    fn domains() -> (Arc<LoopbackBackend>, Arc<LoopbackBackend>, Domains) {
        let audio = Arc::new(LoopbackBackend::new());
        let route = Arc::new(LoopbackBackend::new());
        let domains = Domains::new(audio.clone(), route.clone()).unwrap();
        (audio, route, domains)
    }

    #[test]
    fn test_declarations_are_mirrored() {
        let (audio, _, mut domains) = domains();
        domains.audio.declare_type("ModeType", false).unwrap();
        domains.audio.add_type_value("ModeType", 0, "Normal").unwrap();
        domains
            .declare_criterion(Domain::Audio, "Mode", "ModeType", "Normal")
            .unwrap();

        let declared = audio.criterion_type("ModeType").unwrap();
        assert_eq!(declared.values, vec![(0, "Normal".to_string())]);
        assert_eq!(audio.criterion_type_name("Mode").as_deref(), Some("ModeType"));
    }

    #[test]
    fn test_values_are_pushed_only_on_request() {
        let (_, route, mut domains) = domains();
        domains.route.declare_type("ModeType", false).unwrap();
        domains.route.add_type_value("ModeType", 0, "Normal").unwrap();
        domains.route.add_type_value("ModeType", 2, "InCall").unwrap();
        domains
            .declare_criterion(Domain::Route, "Mode", "ModeType", "")
            .unwrap();

        assert_eq!(domains.route.set_criterion("Mode", 2), Some(true));
        assert_eq!(route.get_criterion("Mode"), Some(0));

        domains.push_all();
        assert_eq!(route.get_criterion("Mode"), Some(2));
    }

    #[test]
    fn test_same_name_in_both_domains() {
        let (_, _, mut domains) = domains();
        for domain in Domain::ALL {
            let state = domains.get_mut(domain);
            state.declare_type("MuteType", false).unwrap();
            state.add_type_value("MuteType", 1, "on").unwrap();
        }
        domains
            .declare_criterion(Domain::Audio, "Mute", "MuteType", "on")
            .unwrap();
        domains
            .declare_criterion(Domain::Route, "Mute", "MuteType", "on")
            .unwrap();
        assert_eq!(domains.audio.criterion_value("Mute"), Some(1));
        assert_eq!(domains.route.criterion_value("Mute"), Some(1));
    }
}
