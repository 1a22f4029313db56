//! Parameters: bindings between configuration keys and domain state
//!
//! A rogue parameter writes a raw typed value to its domain's parameter
//! store. A criterion parameter translates a literal through the criterion
//! type of its criterion. Both may carry a translation table between the
//! literals used in `key=value` strings and the literals of the domain.

use serde::Serialize;
use tracing::{debug, warn};

use audio_hal_core::{Domain, RogueKind, RogueValue};

use crate::domain::Domains;
use crate::error::ValueError;
use crate::key_value::KeyValuePairs;
use crate::value_list::MappingPair;

/// Translation table between configuration and domain literals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValueMapping {
    pairs: Vec<(String, String)>,
}

impl ValueMapping {
    pub fn new(pairs: Vec<MappingPair>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|pair| (pair.config, pair.domain))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Domain literal of a configuration literal, or the literal itself
    pub fn to_domain<'a>(&'a self, config: &'a str) -> &'a str {
        self.pairs
            .iter()
            .find(|(c, _)| c == config)
            .map_or(config, |(_, d)| d.as_str())
    }

    /// Configuration literal of a domain literal, or the literal itself
    pub fn to_config<'a>(&'a self, domain: &'a str) -> &'a str {
        self.pairs
            .iter()
            .find(|(_, d)| d == domain)
            .map_or(domain, |(c, _)| c.as_str())
    }
}

/// Settings shared by both kinds of parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    /// Configuration key
    pub key: String,
    /// Backing store path or criterion name
    pub name: String,
    /// Literal applied by `sync`, empty for none
    pub default: String,
    pub domain: Domain,
    pub mapping: ValueMapping,
    #[serde(skip)]
    last_literal: Option<String>,
}

impl Binding {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        default: impl Into<String>,
        domain: Domain,
        mapping: ValueMapping,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            default: default.into(),
            domain,
            mapping,
            last_literal: None,
        }
    }
}

/// A key binding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum Parameter {
    /// Raw typed value in the domain's parameter store
    Rogue {
        #[serde(flatten)]
        binding: Binding,
        kind: RogueKind,
    },
    /// Criterion updated through its type's literals
    Criterion {
        #[serde(flatten)]
        binding: Binding,
    },
}

impl Parameter {
    pub fn rogue(binding: Binding, kind: RogueKind) -> Self {
        Self::Rogue { binding, kind }
    }

    pub fn criterion(binding: Binding) -> Self {
        Self::Criterion { binding }
    }

    pub fn binding(&self) -> &Binding {
        match self {
            Self::Rogue { binding, .. } | Self::Criterion { binding } => binding,
        }
    }

    fn binding_mut(&mut self) -> &mut Binding {
        match self {
            Self::Rogue { binding, .. } | Self::Criterion { binding } => binding,
        }
    }

    pub fn key(&self) -> &str {
        &self.binding().key
    }

    pub fn name(&self) -> &str {
        &self.binding().name
    }

    /// Apply a configuration literal
    ///
    /// Returns whether the domain state changed.
    ///
    /// # Errors
    /// Returns a `ValueError` if the literal does not convert or is refused
    pub fn apply(&mut self, raw: &str, domains: &mut Domains) -> Result<bool, ValueError> {
        let changed = match self {
            Self::Rogue { binding, kind } => {
                let literal = binding.mapping.to_domain(raw);
                let value =
                    RogueValue::parse(*kind, literal).map_err(|_| ValueError::Unconvertible {
                        kind: *kind,
                        literal: raw.to_string(),
                    })?;
                let backend = domains.get(binding.domain).backend();
                let changed = backend.get_parameter(&binding.name, *kind).as_ref() != Some(&value);
                backend.set_parameter(&binding.name, &value)?;
                changed
            }
            Self::Criterion { binding } => {
                let state = domains.get_mut(binding.domain);
                let literal = binding.mapping.to_domain(raw);
                let code = {
                    let criterion = state
                        .criteria()
                        .get(&binding.name)
                        .ok_or_else(|| ValueError::MissingCriterion(binding.name.clone()))?;
                    let criterion_type = state
                        .types()
                        .get(criterion.type_name())
                        .ok_or_else(|| ValueError::MissingCriterion(binding.name.clone()))?;
                    criterion_type.encode_or_numeric(literal).ok_or_else(|| {
                        ValueError::UnknownLiteral {
                            type_name: criterion_type.name().to_string(),
                            literal: literal.to_string(),
                        }
                    })?
                };
                state
                    .set_criterion(&binding.name, code)
                    .ok_or_else(|| ValueError::MissingCriterion(binding.name.clone()))?
            }
        };
        self.binding_mut().last_literal = Some(raw.to_string());
        Ok(changed)
    }

    /// Current value as a configuration literal
    ///
    /// The last literal applied through this parameter is returned verbatim
    /// while it still describes the current value.
    pub fn resolve(&self, domains: &Domains) -> Option<String> {
        match self {
            Self::Rogue { binding, kind } => {
                let current = domains
                    .get(binding.domain)
                    .backend()
                    .get_parameter(&binding.name, *kind)?;
                if let Some(last) = &binding.last_literal {
                    let last_value = RogueValue::parse(*kind, binding.mapping.to_domain(last));
                    if last_value.as_ref() == Ok(&current) {
                        return Some(last.clone());
                    }
                }
                let text = current.to_string();
                Some(binding.mapping.to_config(&text).to_string())
            }
            Self::Criterion { binding } => {
                let state = domains.get(binding.domain);
                let criterion = state.criteria().get(&binding.name)?;
                let criterion_type = state.types().get(criterion.type_name())?;
                if let Some(last) = &binding.last_literal {
                    let last_code =
                        criterion_type.encode_or_numeric(binding.mapping.to_domain(last));
                    if last_code == Some(criterion.value()) {
                        return Some(last.clone());
                    }
                }
                let literal = criterion_type
                    .decode(criterion.value())
                    .unwrap_or_else(|| criterion.value().to_string());
                Some(binding.mapping.to_config(&literal).to_string())
            }
        }
    }
}

/// Result of dispatching one key/value pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Claim {
    /// Number of parameters bound to the key
    pub matched: usize,
    /// Number of those that refused the value
    pub errors: usize,
}

/// Parameters in registration order
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    parameters: Vec<Parameter>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, parameter: Parameter) {
        debug!(
            "binding key {} to {} {}",
            parameter.key(),
            parameter.binding().domain,
            parameter.name()
        );
        self.parameters.push(parameter);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Distinct keys in registration order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for parameter in &self.parameters {
            if !keys.contains(&parameter.key()) {
                keys.push(parameter.key());
            }
        }
        keys
    }

    /// Apply `raw` through every parameter bound to `key`
    ///
    /// Actual changes are recorded on the aggregator. Failures are logged and
    /// counted without stopping the other parameters.
    pub fn claim(&mut self, key: &str, raw: &str, domains: &mut Domains) -> Claim {
        let mut claim = Claim::default();
        for parameter in self.parameters.iter_mut().filter(|p| p.key() == key) {
            claim.matched += 1;
            match parameter.apply(raw, domains) {
                Ok(true) => domains.mark_changed(parameter.name()),
                Ok(false) => {}
                Err(e) => {
                    warn!("{}={}: {}", key, raw, e);
                    claim.errors += 1;
                }
            }
        }
        claim
    }

    /// Current values of the keys present in `filter`
    ///
    /// The first parameter bound to a key answers for it.
    pub fn collect(&self, filter: &KeyValuePairs, domains: &Domains) -> KeyValuePairs {
        let mut found = KeyValuePairs::new();
        for parameter in &self.parameters {
            if !filter.contains_key(parameter.key()) || found.contains_key(parameter.key()) {
                continue;
            }
            if let Some(value) = parameter.resolve(domains) {
                found.insert(parameter.key(), value);
            }
        }
        found
    }

    /// Apply every non-empty default literal
    ///
    /// Returns the number of defaults that could not be applied.
    pub fn apply_defaults(&mut self, domains: &mut Domains) -> usize {
        let mut errors = 0;
        for parameter in &mut self.parameters {
            let default = parameter.binding().default.clone();
            if default.is_empty() {
                continue;
            }
            match parameter.apply(&default, domains) {
                Ok(true) => domains.mark_changed(parameter.name()),
                Ok(false) => {}
                Err(e) => {
                    warn!("default of {}: {}", parameter.key(), e);
                    errors += 1;
                }
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_hal_core::LoopbackBackend;
    use std::sync::Arc;

    use crate::value_list::parse_mapping_table;

    fn domains() -> Domains {
        let mut domains = Domains::new(
            Arc::new(LoopbackBackend::new()),
            Arc::new(LoopbackBackend::new()),
        )
        .unwrap();
        domains.route.declare_type("MuteType", false).unwrap();
        domains.route.add_type_value("MuteType", 0, "off").unwrap();
        domains.route.add_type_value("MuteType", 1, "on").unwrap();
        domains
            .declare_criterion(Domain::Route, "MicMute", "MuteType", "off")
            .unwrap();
        domains
    }

    fn mute_parameter(mapping: &str) -> Parameter {
        let mapping = ValueMapping::new(parse_mapping_table(mapping).unwrap());
        Parameter::criterion(Binding::new("mute", "MicMute", "off", Domain::Route, mapping))
    }

    #[test]
    fn test_mapping_both_ways() {
        let mapping = ValueMapping::new(parse_mapping_table("true:on,false:off").unwrap());
        assert_eq!(mapping.to_domain("true"), "on");
        assert_eq!(mapping.to_domain("maybe"), "maybe");
        assert_eq!(mapping.to_config("off"), "false");
        assert_eq!(mapping.to_config("other"), "other");
    }

    #[test]
    fn test_criterion_parameter_marks_route_bit() {
        let mut domains = domains();
        let mut registry = ParameterRegistry::new();
        registry.add(mute_parameter(""));

        let claim = registry.claim("mute", "on", &mut domains);
        assert_eq!(claim, Claim { matched: 1, errors: 0 });
        assert_eq!(domains.route.criterion_value("MicMute"), Some(1));
        assert_eq!(domains.pending_route_changes(), 1);
        assert!(!domains.audio_changed());
    }

    #[test]
    fn test_criterion_parameter_round_trips_mapped_literal() {
        let mut domains = domains();
        let mut registry = ParameterRegistry::new();
        registry.add(mute_parameter("true:on,1:on,false:off"));

        registry.claim("mute", "1", &mut domains);
        let filter = KeyValuePairs::parse("mute");
        assert_eq!(registry.collect(&filter, &domains).get("mute"), Some("1"));

        domains.route.set_criterion("MicMute", 0);
        assert_eq!(registry.collect(&filter, &domains).get("mute"), Some("false"));
    }

    #[test]
    fn test_unknown_literal_is_counted() {
        let mut domains = domains();
        let mut registry = ParameterRegistry::new();
        registry.add(mute_parameter(""));

        let claim = registry.claim("mute", "loud", &mut domains);
        assert_eq!(claim, Claim { matched: 1, errors: 1 });
        assert!(!domains.has_changed());
    }

    #[test]
    fn test_rogue_parameter_marks_audio_dirty() {
        let mut domains = domains();
        let mut registry = ParameterRegistry::new();
        registry.add(Parameter::rogue(
            Binding::new("volume", "/Audio/volume", "", Domain::Audio, ValueMapping::default()),
            RogueKind::UnsignedInteger,
        ));

        assert_eq!(registry.claim("volume", "0x10", &mut domains).errors, 0);
        assert_eq!(
            domains.audio.backend().get_parameter("/Audio/volume", RogueKind::UnsignedInteger),
            Some(RogueValue::UnsignedInteger(16))
        );
        assert!(domains.audio_changed());
        assert_eq!(domains.pending_route_changes(), 0);

        domains.clear_changes();
        registry.claim("volume", "16", &mut domains);
        assert!(!domains.has_changed());

        assert_eq!(registry.claim("volume", "loud", &mut domains).errors, 1);
    }

    #[test]
    fn test_every_binding_of_a_key_is_applied() {
        let mut domains = domains();
        domains.audio.declare_type("MuteType", false).unwrap();
        domains.audio.add_type_value("MuteType", 1, "on").unwrap();
        domains
            .declare_criterion(Domain::Audio, "MicMute", "MuteType", "")
            .unwrap();

        let mut registry = ParameterRegistry::new();
        registry.add(mute_parameter(""));
        registry.add(Parameter::criterion(Binding::new(
            "mute",
            "MicMute",
            "",
            Domain::Audio,
            ValueMapping::default(),
        )));

        assert_eq!(registry.claim("mute", "on", &mut domains).matched, 2);
        assert_eq!(domains.route.criterion_value("MicMute"), Some(1));
        assert_eq!(domains.audio.criterion_value("MicMute"), Some(1));
        assert_eq!(registry.keys(), vec!["mute"]);
    }

    #[test]
    fn test_apply_defaults() {
        let mut domains = domains();
        domains.route.set_criterion("MicMute", 1);
        let mut registry = ParameterRegistry::new();
        registry.add(mute_parameter(""));

        assert_eq!(registry.apply_defaults(&mut domains), 0);
        assert_eq!(domains.route.criterion_value("MicMute"), Some(0));
    }
}
