//! Configuration loading
//!
//! Populates both domains and the parameter registry from a configuration
//! tree. The general-purpose domain is loaded from the `common` section and
//! then the `audio` section; the routing domain from `common` and then
//! `route`. Within a section, types come first, then criteria, then rogue
//! parameters.

use std::path::Path;

use tracing::{error, info, warn};

use audio_hal_core::{Domain, RogueKind};

use crate::conf::ConfNode;
use crate::domain::Domains;
use crate::error::{PlatformStateError, Result};
use crate::parameter::{Binding, Parameter, ParameterRegistry, ValueMapping};
use crate::value_list::{assign_codes, parse_mapping_table, parse_type_values};

pub const COMMON_TAG: &str = "common";
pub const INCLUSIVE_TYPE_TAG: &str = "inclusive-criterion-type";
pub const EXCLUSIVE_TYPE_TAG: &str = "exclusive-criterion-type";
pub const CRITERION_TAG: &str = "criterion";
pub const ROGUE_PARAMETER_TAG: &str = "rogue-parameter";

const TYPE_TAG: &str = "type";
const DEFAULT_TAG: &str = "default";
const KEY_TAG: &str = "key";
const MAPPING_TAG: &str = "mapping";
const PATH_TAG: &str = "path";

/// Fills domains and parameters from configuration files
pub struct ConfigLoader<'a> {
    domains: &'a mut Domains,
    parameters: &'a mut ParameterRegistry,
}

/// Child tags of a criterion or rogue parameter node
#[derive(Debug, Default)]
struct Entry<'n> {
    type_name: &'n str,
    default: &'n str,
    key: &'n str,
    mapping: &'n str,
    path: &'n str,
}

impl<'n> Entry<'n> {
    fn from_node(node: &'n ConfNode) -> Self {
        let mut entry = Self::default();
        for child in &node.children {
            let slot = match child.name.as_str() {
                TYPE_TAG => &mut entry.type_name,
                DEFAULT_TAG => &mut entry.default,
                KEY_TAG => &mut entry.key,
                MAPPING_TAG => &mut entry.mapping,
                PATH_TAG => &mut entry.path,
                other => {
                    error!(
                        "Unrecognized tag {} in {} (line {})",
                        other, node.name, child.line
                    );
                    continue;
                }
            };
            *slot = child.value.as_str();
        }
        entry
    }

    fn mapping(&self, owner: &str) -> Result<ValueMapping> {
        parse_mapping_table(self.mapping)
            .map(ValueMapping::new)
            .map_err(|source| PlatformStateError::InvalidValueList {
                owner: owner.to_string(),
                source,
            })
    }
}

impl<'a> ConfigLoader<'a> {
    pub fn new(domains: &'a mut Domains, parameters: &'a mut ParameterRegistry) -> Self {
        Self {
            domains,
            parameters,
        }
    }

    /// Load a configuration file
    ///
    /// Returns `Ok(false)` if the file cannot be read.
    ///
    /// # Errors
    /// Returns syntax and schema errors of a readable file
    pub fn load_file(&mut self, path: &Path) -> Result<bool> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot read configuration file {}: {}", path.display(), e);
                return Ok(false);
            }
        };
        info!("Loading configuration from {}", path.display());
        self.load_str(&text)?;
        Ok(true)
    }

    /// Load configuration text
    ///
    /// # Errors
    /// Returns syntax and schema errors
    pub fn load_str(&mut self, text: &str) -> Result<()> {
        let root = ConfNode::parse(text)?;
        self.load_tree(&root)
    }

    /// Load an already parsed configuration tree
    ///
    /// # Errors
    /// Returns schema errors
    pub fn load_tree(&mut self, root: &ConfNode) -> Result<()> {
        let common = root.find(COMMON_TAG);
        if common.is_none() && Domain::ALL.iter().all(|d| root.find(d.as_str()).is_none()) {
            error!(
                "Configuration has none of the {}, {} or {} sections",
                COMMON_TAG,
                Domain::Audio,
                Domain::Route
            );
            return Ok(());
        }
        for domain in Domain::ALL {
            for section in [common, root.find(domain.as_str())].into_iter().flatten() {
                self.load_section(domain, section)?;
            }
        }
        Ok(())
    }

    fn load_section(&mut self, domain: Domain, section: &ConfNode) -> Result<()> {
        for node in section.children.iter().filter(|n| n.name == INCLUSIVE_TYPE_TAG) {
            self.load_types(domain, node, true)?;
        }
        for node in section.children.iter().filter(|n| n.name == EXCLUSIVE_TYPE_TAG) {
            self.load_types(domain, node, false)?;
        }
        for node in section.children.iter().filter(|n| n.name == CRITERION_TAG) {
            self.load_criteria(domain, node)?;
        }
        for node in section.children.iter().filter(|n| n.name == ROGUE_PARAMETER_TAG) {
            self.load_rogue_parameters(domain, node)?;
        }
        Ok(())
    }

    fn load_types(&mut self, domain: Domain, node: &ConfNode, inclusive: bool) -> Result<()> {
        let state = self.domains.get_mut(domain);
        for type_node in &node.children {
            let invalid = |source| PlatformStateError::InvalidValueList {
                owner: type_node.name.clone(),
                source,
            };
            let values = parse_type_values(&type_node.value).map_err(invalid)?;
            let codes = assign_codes(&values, inclusive).map_err(invalid)?;

            state.declare_type(&type_node.name, inclusive)?;
            for (code, literal) in codes {
                state.add_type_value(&type_node.name, code, &literal)?;
            }
        }
        Ok(())
    }

    fn load_criteria(&mut self, domain: Domain, node: &ConfNode) -> Result<()> {
        for criterion_node in &node.children {
            let name = criterion_node.name.as_str();
            let entry = Entry::from_node(criterion_node);
            let mapping = entry.mapping(name)?;

            self.domains.declare_criterion(
                domain,
                name,
                entry.type_name,
                mapping.to_domain(entry.default),
            )?;
            if !entry.key.is_empty() {
                self.parameters.add(Parameter::criterion(Binding::new(
                    entry.key,
                    name,
                    entry.default,
                    domain,
                    mapping,
                )));
            }
        }
        Ok(())
    }

    fn load_rogue_parameters(&mut self, domain: Domain, node: &ConfNode) -> Result<()> {
        for rogue_node in &node.children {
            let entry = Entry::from_node(rogue_node);
            let path = if entry.path.is_empty() {
                rogue_node.name.as_str()
            } else {
                entry.path
            };
            if entry.key.is_empty() {
                return Err(PlatformStateError::MissingParameterKey(path.to_string()));
            }
            let Some(kind) = RogueKind::from_str(entry.type_name) else {
                error!(
                    "Rogue parameter {}: unsupported type {:?}, skipped",
                    path, entry.type_name
                );
                continue;
            };
            let mapping = entry.mapping(path)?;
            self.parameters.add(Parameter::rogue(
                Binding::new(entry.key, path, entry.default, domain, mapping),
                kind,
            ));
        }
        Ok(())
    }
}
