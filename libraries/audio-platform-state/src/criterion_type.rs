//! Criterion types and their per-domain registry

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use audio_hal_core::types::parse_unsigned;

use crate::error::{PlatformStateError, Result};

/// Separator between the members of an inclusive literal
pub const INCLUSIVE_SEPARATOR: &str = "|";

/// Named enumeration mapping numeric codes to literals
///
/// Inclusive types are bitmasks: each literal names one or more bits and a
/// value is any combination of them. Exclusive types hold exactly one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriterionType {
    name: String,
    inclusive: bool,
    values: Vec<(u32, String)>,
}

impl CriterionType {
    /// Create a type without values
    pub fn new(name: impl Into<String>, inclusive: bool) -> Self {
        Self {
            name: name.into(),
            inclusive,
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }

    /// Declared (code, literal) pairs in declaration order
    pub fn values(&self) -> &[(u32, String)] {
        &self.values
    }

    /// Add a (code, literal) pair
    ///
    /// Several literals may share a code. Redeclaring a literal moves it to
    /// the new code.
    pub fn add_value(&mut self, code: u32, literal: &str) {
        if let Some(existing) = self.values.iter_mut().find(|(_, l)| l == literal) {
            debug!(
                "criterion type {}: literal {} remapped from {:#x} to {:#x}",
                self.name, literal, existing.0, code
            );
            existing.0 = code;
            return;
        }
        self.values.push((code, literal.to_string()));
    }

    /// Code of a literal
    ///
    /// Inclusive types accept `a|b` and encode the empty literal as 0.
    pub fn encode(&self, literal: &str) -> Option<u32> {
        if !self.inclusive {
            return self.lookup(literal);
        }
        if literal.is_empty() {
            return Some(0);
        }
        literal
            .split(INCLUSIVE_SEPARATOR)
            .map(str::trim)
            .try_fold(0u32, |mask, member| Some(mask | self.lookup(member)?))
    }

    /// Literal of a code
    ///
    /// Inclusive masks decode to their members joined by `|`, in declaration
    /// order. Returns `None` if the code, or any bit of a mask, is undeclared.
    pub fn decode(&self, code: u32) -> Option<String> {
        if !self.inclusive {
            return self
                .values
                .iter()
                .find(|(c, _)| *c == code)
                .map(|(_, literal)| literal.clone());
        }
        let mut covered = 0u32;
        let mut members = Vec::new();
        for (c, literal) in &self.values {
            if *c != 0 && code & c == *c && covered & c != *c {
                covered |= c;
                members.push(literal.as_str());
            }
        }
        (covered == code).then(|| members.join(INCLUSIVE_SEPARATOR))
    }

    /// Whether a raw number is a valid value of this type
    pub fn is_valid_code(&self, code: u32) -> bool {
        if self.inclusive {
            let all = self.values.iter().fold(0u32, |mask, (c, _)| mask | c);
            code & !all == 0
        } else {
            self.values.iter().any(|(c, _)| *c == code)
        }
    }

    /// Code of a literal, falling back to a numeric literal that is a valid code
    pub fn encode_or_numeric(&self, literal: &str) -> Option<u32> {
        self.encode(literal).or_else(|| {
            parse_unsigned(literal.trim()).filter(|code| self.is_valid_code(*code))
        })
    }

    fn lookup(&self, literal: &str) -> Option<u32> {
        self.values
            .iter()
            .find(|(_, l)| l == literal)
            .map(|(code, _)| *code)
    }
}

/// Criterion types of one domain
#[derive(Debug, Clone, Default)]
pub struct CriterionTypeRegistry {
    types: BTreeMap<String, CriterionType>,
    domain: &'static str,
}

impl CriterionTypeRegistry {
    /// Create an empty registry for the named domain
    pub fn new(domain: &'static str) -> Self {
        Self {
            types: BTreeMap::new(),
            domain,
        }
    }

    /// Declare a new type
    ///
    /// # Errors
    /// Returns `DuplicateCriterionType` if the name is already declared
    pub fn declare_type(&mut self, name: &str, inclusive: bool) -> Result<&mut CriterionType> {
        if self.types.contains_key(name) {
            return Err(PlatformStateError::DuplicateCriterionType {
                domain: self.domain,
                name: name.to_string(),
            });
        }
        debug!(
            "{}: adding {} criterion type {}",
            self.domain,
            if inclusive { "inclusive" } else { "exclusive" },
            name
        );
        Ok(self
            .types
            .entry(name.to_string())
            .or_insert_with(|| CriterionType::new(name, inclusive)))
    }

    /// Add a value to a declared type
    ///
    /// # Errors
    /// Returns `UnknownCriterionType` if the type is not declared
    pub fn add_value(&mut self, type_name: &str, code: u32, literal: &str) -> Result<()> {
        let criterion_type = self.types.get_mut(type_name).ok_or_else(|| {
            PlatformStateError::UnknownCriterionType {
                domain: self.domain,
                name: type_name.to_string(),
            }
        })?;
        criterion_type.add_value(code, literal);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CriterionType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Code of `literal` in `type_name`; unknown literals are logged
    pub fn encode(&self, type_name: &str, literal: &str) -> Option<u32> {
        let code = self.types.get(type_name)?.encode(literal);
        if code.is_none() {
            warn!(
                "{}: {:?} is not a value of criterion type {}",
                self.domain, literal, type_name
            );
        }
        code
    }

    /// Literal of `code` in `type_name`
    pub fn decode(&self, type_name: &str, code: u32) -> Option<String> {
        self.types.get(type_name)?.decode(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CriterionType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
