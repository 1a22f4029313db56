//! Platform state engine
//!
//! Owns both domains and the parameter registry behind a single reader/writer
//! lock. Writers apply `key=value` strings and commit to the backing
//! subsystems only when the aggregator reports a change; the routing
//! reconsideration request is sent after the lock is released.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use audio_hal_core::{
    ConnectorLogger, CriterionBackend, Direction, Domain, RogueKind, RogueValue, RouteConnector,
    StreamInterface,
};

use crate::criterion::Criterion;
use crate::criterion_type::CriterionType;
use crate::diagnostics::{dump_files, split_path_list, DumpReport};
use crate::domain::Domains;
use crate::error::{PlatformStateError, Result};
use crate::key_value::KeyValuePairs;
use crate::loader::ConfigLoader;
use crate::logger::TracingConnectorLogger;
use crate::names;
use crate::parameter::{Parameter, ParameterRegistry};
use crate::settings::PlatformStateSettings;

/// An active stream as seen by the platform state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamActivity {
    pub id: u64,
    pub direction: Direction,
    /// Input source bits for input streams, output flag bits for output streams
    pub mask: u32,
}

/// Serializable view of the whole state
#[derive(Debug, Clone, Serialize)]
pub struct PlatformStateSnapshot {
    pub domains: Vec<DomainSnapshot>,
    pub parameters: Vec<Parameter>,
    pub pending_route_changes: u32,
    pub audio_changed: bool,
    pub active_streams: Vec<StreamActivity>,
}

/// Serializable view of one domain
#[derive(Debug, Clone, Serialize)]
pub struct DomainSnapshot {
    pub domain: Domain,
    pub types: Vec<CriterionType>,
    pub criteria: Vec<Criterion>,
}

struct StateInner {
    domains: Domains,
    parameters: ParameterRegistry,
    streams: BTreeMap<u64, StreamActivity>,
}

impl StateInner {
    fn get_value(&self, name: &str) -> u32 {
        self.domains
            .route
            .criterion_value(name)
            .or_else(|| self.domains.audio.criterion_value(name))
            .unwrap_or(0)
    }

    fn set_value(&mut self, name: &str, value: u32) {
        let mut known = false;
        for domain in [Domain::Route, Domain::Audio] {
            match self.domains.get_mut(domain).set_criterion(name, value) {
                Some(true) => {
                    known = true;
                    self.domains.mark_changed(name);
                }
                Some(false) => known = true,
                None => {}
            }
        }
        if !known {
            debug!("set_value: no criterion named {}", name);
        }
    }

    fn update_stream_masks(&mut self) {
        let mask_of = |direction: Direction| {
            self.streams
                .values()
                .filter(|stream| stream.direction == direction)
                .fold(0u32, |mask, stream| mask | stream.mask)
        };
        let inputs = mask_of(Direction::Input);
        let outputs = mask_of(Direction::Output);
        self.set_value(names::INPUT_SOURCES, inputs);
        self.set_value(names::OUTPUT_FLAGS, outputs);
    }
}

/// Synchronizes `key=value` configuration with the criteria of both domains
pub struct PlatformState {
    inner: RwLock<StateInner>,
    stream: Arc<dyn StreamInterface>,
    connector: Arc<dyn RouteConnector>,
    settings: PlatformStateSettings,
}

impl PlatformState {
    /// Create the platform state and load its configuration
    ///
    /// The vendor configuration file is tried first, then the system one. A
    /// missing file is not an error; an invalid one is.
    ///
    /// # Errors
    /// Returns settings, syntax and schema errors
    pub fn new<S, R>(
        settings: PlatformStateSettings,
        stream: Arc<S>,
        connector: Arc<R>,
    ) -> Result<Self>
    where
        S: StreamInterface + 'static,
        R: RouteConnector + 'static,
    {
        let vendor = settings.vendor_conf_path.clone();
        let system = settings.system_conf_path.clone();
        Self::build(settings, stream, connector, |loader| {
            if !loader.load_file(&vendor)? && !loader.load_file(&system)? {
                error!(
                    "Neither vendor conf file ({}) nor system conf file ({}) could be found",
                    vendor.display(),
                    system.display()
                );
            }
            Ok(())
        })
    }

    /// Create the platform state from configuration text
    ///
    /// # Errors
    /// Returns settings, syntax and schema errors
    pub fn from_conf_str<S, R>(
        settings: PlatformStateSettings,
        conf: &str,
        stream: Arc<S>,
        connector: Arc<R>,
    ) -> Result<Self>
    where
        S: StreamInterface + 'static,
        R: RouteConnector + 'static,
    {
        Self::build(settings, stream, connector, |loader| loader.load_str(conf))
    }

    /// Create the platform state from a single configuration file
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, and syntax and schema errors
    pub fn from_conf_file<S, R>(
        settings: PlatformStateSettings,
        path: &Path,
        stream: Arc<S>,
        connector: Arc<R>,
    ) -> Result<Self>
    where
        S: StreamInterface + 'static,
        R: RouteConnector + 'static,
    {
        let conf = std::fs::read_to_string(path)?;
        Self::from_conf_str(settings, &conf, stream, connector)
    }

    fn build<S, R>(
        settings: PlatformStateSettings,
        stream: Arc<S>,
        connector: Arc<R>,
        load: impl FnOnce(&mut ConfigLoader<'_>) -> Result<()>,
    ) -> Result<Self>
    where
        S: StreamInterface + 'static,
        R: RouteConnector + 'static,
    {
        settings.validate()?;
        info!(
            "Route-PFW: using configuration file: {}",
            settings.route_conf_path().display()
        );

        let logger: Arc<dyn ConnectorLogger> =
            Arc::new(TracingConnectorLogger::new(settings.pfw_verbose));
        connector.set_logger(Some(logger));

        let audio_backend: Arc<dyn CriterionBackend> = stream.clone();
        let route_backend: Arc<dyn CriterionBackend> = connector.clone();
        let mut domains = Domains::new(audio_backend, route_backend)?;
        let mut parameters = ParameterRegistry::new();
        load(&mut ConfigLoader::new(&mut domains, &mut parameters))?;

        info!(
            "Platform state ready: {} audio criteria, {} route criteria, {} parameters",
            domains.audio.criteria().len(),
            domains.route.criteria().len(),
            parameters.len()
        );

        Ok(Self {
            inner: RwLock::new(StateInner {
                domains,
                parameters,
                streams: BTreeMap::new(),
            }),
            stream,
            connector,
            settings,
        })
    }

    pub fn settings(&self) -> &PlatformStateSettings {
        &self.settings
    }

    /// Start the routing subsystem
    ///
    /// # Errors
    /// Returns `NotStarted` with the subsystem's reason
    pub fn start(&self) -> Result<()> {
        self.connector.start().map_err(|e| {
            error!("Route PFW start error: {}", e);
            PlatformStateError::NotStarted(e.to_string())
        })?;
        debug!("Route PFW successfully started");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.connector.is_started()
    }

    /// Apply a `key=value;...` string
    ///
    /// Every pair is dispatched even if some fail. If anything changed, both
    /// domains are committed and routing is reconsidered once the lock is
    /// released.
    ///
    /// # Errors
    /// Returns `BadValue` with the number of values that could not be applied
    pub fn set_parameters(&self, text: &str, synchronous: bool) -> Result<()> {
        debug!("set_parameters: key value pair {}", text);
        let pairs = KeyValuePairs::parse(text);

        let (errors, changed) = {
            let mut guard = self.inner.write();
            let inner = &mut *guard;

            let mut errors = 0;
            let mut unhandled = pairs.clone();
            for (key, value) in pairs.iter() {
                let claim = inner.parameters.claim(key, value, &mut inner.domains);
                if claim.matched > 0 {
                    unhandled.remove(key);
                }
                errors += claim.errors;
            }
            if !unhandled.is_empty() {
                warn!("set_parameters: unhandled argument: {}", unhandled);
            }

            let changed = inner.domains.has_changed();
            if changed {
                self.commit(&mut inner.domains);
            }
            (errors, changed)
        };

        if changed {
            self.stream.reconsider_routing(synchronous);
        }
        if errors > 0 {
            return Err(PlatformStateError::BadValue { count: errors });
        }
        Ok(())
    }

    /// Current values of the keys listed in `keys`, as `key=value;...`
    pub fn get_parameters(&self, keys: &str) -> String {
        let filter = KeyValuePairs::parse(keys);
        let inner = self.inner.read();
        inner
            .parameters
            .collect(&filter, &inner.domains)
            .to_string()
    }

    /// Every configured key
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .read()
            .parameters
            .keys()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Value of a criterion, routing domain first, 0 if unknown
    pub fn get_value(&self, name: &str) -> u32 {
        self.inner.read().get_value(name)
    }

    /// Set a criterion in every domain that declares it
    ///
    /// Nothing is committed; changes accumulate until the next commit.
    pub fn set_value(&self, value: u32, name: &str) {
        self.inner.write().set_value(name, value);
    }

    /// Whether anything changed since the last commit
    pub fn has_platform_state_changed(&self) -> bool {
        self.inner.read().domains.has_changed()
    }

    /// Commit both domains unconditionally
    pub fn apply_platform_configuration(&self) {
        let mut inner = self.inner.write();
        self.commit(&mut inner.domains);
    }

    /// Re-apply every parameter default, then commit unconditionally
    ///
    /// # Errors
    /// Returns `BadValue` if some defaults could not be applied; the commit
    /// happens regardless
    pub fn sync(&self) -> Result<()> {
        let errors = {
            let mut guard = self.inner.write();
            let inner = &mut *guard;
            let errors = inner.parameters.apply_defaults(&mut inner.domains);
            self.commit(&mut inner.domains);
            errors
        };
        if errors > 0 {
            return Err(PlatformStateError::BadValue { count: errors });
        }
        Ok(())
    }

    /// Record a started stream and refresh the input source and output flag masks
    pub fn start_stream(&self, activity: StreamActivity) {
        let mut inner = self.inner.write();
        inner.streams.insert(activity.id, activity);
        inner.update_stream_masks();
    }

    /// Forget a stopped stream; returns false if it was not active
    pub fn stop_stream(&self, id: u64) -> bool {
        let mut inner = self.inner.write();
        if inner.streams.remove(&id).is_none() {
            warn!("stop_stream: stream {} is not active", id);
            return false;
        }
        inner.update_stream_masks();
        true
    }

    /// Log the routing subsystem's firmware diagnostic files
    ///
    /// Returns `None` if the subsystem does not provide a file list.
    pub fn print_platform_fw_error_info(&self) -> Option<DumpReport> {
        error!("^^^^  Print platform Audio firmware error info  ^^^^");
        let _inner = self.inner.read();

        let Some(RogueValue::String(list)) = self
            .connector
            .get_parameter(&self.settings.debug_files_path_list, RogueKind::String)
        else {
            error!("Could not get path list from configuration");
            return None;
        };
        Some(dump_files(
            &split_path_list(&list),
            self.settings.debug_chunk_size,
        ))
    }

    /// Serializable view of the current state
    pub fn snapshot(&self) -> PlatformStateSnapshot {
        let inner = self.inner.read();
        let domains = Domain::ALL
            .iter()
            .map(|&domain| {
                let state = inner.domains.get(domain);
                DomainSnapshot {
                    domain,
                    types: state.types().iter().cloned().collect(),
                    criteria: state.criteria().iter().cloned().collect(),
                }
            })
            .collect();
        PlatformStateSnapshot {
            domains,
            parameters: inner.parameters.iter().cloned().collect(),
            pending_route_changes: inner.domains.pending_route_changes(),
            audio_changed: inner.domains.audio_changed(),
            active_streams: inner.streams.values().copied().collect(),
        }
    }

    fn commit(&self, domains: &mut Domains) {
        debug!(
            "committing: route changes {:#x}, audio changed {}",
            domains.pending_route_changes(),
            domains.audio_changed()
        );
        domains.push_all();
        self.connector.apply_configurations();
        domains.clear_changes();
    }
}

impl Drop for PlatformState {
    fn drop(&mut self) {
        self.connector.set_logger(None);
    }
}
