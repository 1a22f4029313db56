//! Criteria: named state variables bound to a criterion type

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::criterion_type::CriterionTypeRegistry;
use crate::error::{PlatformStateError, Result};

/// A named state variable holding the current numeric value of its type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Criterion {
    name: String,
    type_name: String,
    value: u32,
}

impl Criterion {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

/// Criteria of one domain, in declaration order
#[derive(Debug, Clone, Default)]
pub struct CriterionStore {
    criteria: Vec<Criterion>,
    index: BTreeMap<String, usize>,
    domain: &'static str,
}

impl CriterionStore {
    /// Create an empty store for the named domain
    pub fn new(domain: &'static str) -> Self {
        Self {
            criteria: Vec::new(),
            index: BTreeMap::new(),
            domain,
        }
    }

    /// Declare a criterion
    ///
    /// The initial value is the code of `default_literal`, or 0 when the
    /// literal is empty or not a value of the type.
    ///
    /// # Errors
    /// Returns `DuplicateCriterion` or `UnknownCriterionType`
    pub fn declare(
        &mut self,
        name: &str,
        type_name: &str,
        default_literal: &str,
        types: &CriterionTypeRegistry,
    ) -> Result<&Criterion> {
        if self.index.contains_key(name) {
            return Err(PlatformStateError::DuplicateCriterion {
                domain: self.domain,
                name: name.to_string(),
            });
        }
        let criterion_type =
            types
                .get(type_name)
                .ok_or_else(|| PlatformStateError::UnknownCriterionType {
                    domain: self.domain,
                    name: type_name.to_string(),
                })?;

        let value = if default_literal.is_empty() {
            0
        } else {
            criterion_type
                .encode_or_numeric(default_literal)
                .unwrap_or_else(|| {
                    warn!(
                        "{}: default {:?} of criterion {} is not a value of {}",
                        self.domain, default_literal, name, type_name
                    );
                    0
                })
        };
        debug!(
            "{}: adding criterion {} of type {} = {:#x}",
            self.domain, name, type_name, value
        );

        self.index.insert(name.to_string(), self.criteria.len());
        self.criteria.push(Criterion {
            name: name.to_string(),
            type_name: type_name.to_string(),
            value,
        });
        Ok(&self.criteria[self.criteria.len() - 1])
    }

    pub fn get(&self, name: &str) -> Option<&Criterion> {
        self.index.get(name).map(|&i| &self.criteria[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Current value of a criterion
    pub fn value(&self, name: &str) -> Option<u32> {
        self.get(name).map(Criterion::value)
    }

    /// Store a new value
    ///
    /// Returns `Some(true)` if the value differs from the previous one, `None`
    /// if the criterion does not exist.
    pub fn set(&mut self, name: &str, value: u32) -> Option<bool> {
        let criterion = &mut self.criteria[*self.index.get(name)?];
        let changed = criterion.value != value;
        criterion.value = value;
        Some(changed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> CriterionTypeRegistry {
        let mut types = CriterionTypeRegistry::new("route");
        types.declare_type("ModeType", false).unwrap();
        types.add_value("ModeType", 0, "Normal").unwrap();
        types.add_value("ModeType", 2, "InCall").unwrap();
        types
    }

    #[test]
    fn test_declare_uses_default_literal() {
        let types = types();
        let mut store = CriterionStore::new("route");
        assert_eq!(
            store.declare("Mode", "ModeType", "InCall", &types).unwrap().value(),
            2
        );
        assert_eq!(
            store.declare("Other", "ModeType", "", &types).unwrap().value(),
            0
        );
        assert_eq!(
            store.declare("Bad", "ModeType", "Bogus", &types).unwrap().value(),
            0
        );
    }

    #[test]
    fn test_declare_errors() {
        let types = types();
        let mut store = CriterionStore::new("route");
        store.declare("Mode", "ModeType", "", &types).unwrap();

        assert!(matches!(
            store.declare("Mode", "ModeType", "", &types),
            Err(PlatformStateError::DuplicateCriterion { .. })
        ));
        assert!(matches!(
            store.declare("Band", "BandType", "", &types),
            Err(PlatformStateError::UnknownCriterionType { .. })
        ));
    }

    #[test]
    fn test_set_reports_change() {
        let types = types();
        let mut store = CriterionStore::new("route");
        store.declare("Mode", "ModeType", "", &types).unwrap();

        assert_eq!(store.set("Mode", 0), Some(false));
        assert_eq!(store.set("Mode", 2), Some(true));
        assert_eq!(store.set("Mode", 2), Some(false));
        assert_eq!(store.value("Mode"), Some(2));
        assert_eq!(store.set("Missing", 1), None);
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let types = types();
        let mut store = CriterionStore::new("route");
        for name in ["Zeta", "Alpha", "Mid"] {
            store.declare(name, "ModeType", "", &types).unwrap();
        }
        let names: Vec<&str> = store.iter().map(Criterion::name).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
    }
}
