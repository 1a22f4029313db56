//! In-memory backing subsystems
//!
//! The loopback collaborators keep every declaration and value in memory and
//! count the calls the platform state makes on them. The operator CLI runs on
//! top of them, and tests use the counters to observe commits and routing
//! notifications.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::error::{HalError, Result};
use crate::traits::{ConnectorLogger, CriterionBackend, RouteConnector, StreamInterface};
use crate::types::{RogueKind, RogueValue};

/// A criterion type as declared on a loopback backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopbackType {
    /// Whether values combine as a bitmask
    pub inclusive: bool,
    /// Declared (code, literal) pairs in declaration order
    pub values: Vec<(u32, String)>,
}

#[derive(Debug, Default)]
struct BackendState {
    types: BTreeMap<String, LoopbackType>,
    criteria: BTreeMap<String, (String, u32)>,
    parameters: BTreeMap<String, RogueValue>,
    set_criterion_calls: usize,
}

/// Criterion and raw parameter storage shared by both loopback subsystems
#[derive(Debug, Default)]
pub struct LoopbackBackend {
    state: Mutex<BackendState>,
}

impl LoopbackBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared criterion type, if any
    pub fn criterion_type(&self, name: &str) -> Option<LoopbackType> {
        self.state.lock().types.get(name).cloned()
    }

    /// Names of every declared criterion
    pub fn criterion_names(&self) -> Vec<String> {
        self.state.lock().criteria.keys().cloned().collect()
    }

    /// Type name a criterion was declared with
    pub fn criterion_type_name(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .criteria
            .get(name)
            .map(|(type_name, _)| type_name.clone())
    }

    /// Number of `set_criterion` calls received so far
    pub fn set_criterion_calls(&self) -> usize {
        self.state.lock().set_criterion_calls
    }

    /// Seed a raw parameter, replacing any previous value
    pub fn insert_parameter(&self, path: impl Into<String>, value: RogueValue) {
        self.state.lock().parameters.insert(path.into(), value);
    }

    /// Raw parameter regardless of its kind
    pub fn parameter(&self, path: &str) -> Option<RogueValue> {
        self.state.lock().parameters.get(path).cloned()
    }

    fn criteria_values(&self) -> BTreeMap<String, u32> {
        self.state
            .lock()
            .criteria
            .iter()
            .map(|(name, (_, value))| (name.clone(), *value))
            .collect()
    }
}

impl CriterionBackend for LoopbackBackend {
    fn declare_criterion_type(&self, name: &str, inclusive: bool) {
        let mut state = self.state.lock();
        if state.types.contains_key(name) {
            debug!("criterion type {} already declared", name);
            return;
        }
        state.types.insert(
            name.to_string(),
            LoopbackType {
                inclusive,
                values: Vec::new(),
            },
        );
    }

    fn declare_criterion_value(&self, type_name: &str, code: u32, literal: &str) {
        let mut state = self.state.lock();
        let criterion_type = state.types.entry(type_name.to_string()).or_default();
        criterion_type.values.retain(|(_, existing)| existing != literal);
        criterion_type.values.push((code, literal.to_string()));
    }

    fn declare_criterion(&self, name: &str, type_name: &str) {
        self.state
            .lock()
            .criteria
            .entry(name.to_string())
            .or_insert_with(|| (type_name.to_string(), 0));
    }

    fn set_criterion(&self, name: &str, value: u32) -> bool {
        let mut state = self.state.lock();
        state.set_criterion_calls += 1;
        let entry = state
            .criteria
            .entry(name.to_string())
            .or_insert_with(|| (String::new(), 0));
        let changed = entry.1 != value;
        entry.1 = value;
        changed
    }

    fn get_criterion(&self, name: &str) -> Option<u32> {
        self.state.lock().criteria.get(name).map(|(_, value)| *value)
    }

    fn set_parameter(&self, path: &str, value: &RogueValue) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(existing) = state.parameters.get(path) {
            if existing.kind() != value.kind() {
                return Err(HalError::TypeMismatch {
                    path: path.to_string(),
                    expected: existing.kind(),
                    actual: value.kind(),
                });
            }
        }
        state.parameters.insert(path.to_string(), value.clone());
        Ok(())
    }

    fn get_parameter(&self, path: &str, kind: RogueKind) -> Option<RogueValue> {
        self.state
            .lock()
            .parameters
            .get(path)
            .filter(|value| value.kind() == kind)
            .cloned()
    }
}

type ReconsiderHook = Box<dyn Fn(bool) + Send + Sync>;

/// Loopback general-purpose subsystem
///
/// Counts routing reconsideration requests. An optional hook runs on every
/// request, which lets tests call back into the platform state the way a real
/// route manager does.
#[derive(Default)]
pub struct LoopbackStreamInterface {
    backend: LoopbackBackend,
    reconsider_calls: AtomicUsize,
    last_request: Mutex<Option<bool>>,
    hook: Mutex<Option<ReconsiderHook>>,
}

impl LoopbackStreamInterface {
    /// Create an empty stream interface
    pub fn new() -> Self {
        Self::default()
    }

    /// Underlying storage
    pub fn backend(&self) -> &LoopbackBackend {
        &self.backend
    }

    /// Number of `reconsider_routing` calls received so far
    pub fn reconsider_count(&self) -> usize {
        self.reconsider_calls.load(Ordering::SeqCst)
    }

    /// `synchronous` flag of the last `reconsider_routing` call
    pub fn last_request(&self) -> Option<bool> {
        *self.last_request.lock()
    }

    /// Run `hook` on every routing reconsideration request
    pub fn on_reconsider(&self, hook: impl Fn(bool) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Box::new(hook));
    }
}

impl CriterionBackend for LoopbackStreamInterface {
    fn declare_criterion_type(&self, name: &str, inclusive: bool) {
        self.backend.declare_criterion_type(name, inclusive);
    }

    fn declare_criterion_value(&self, type_name: &str, code: u32, literal: &str) {
        self.backend.declare_criterion_value(type_name, code, literal);
    }

    fn declare_criterion(&self, name: &str, type_name: &str) {
        self.backend.declare_criterion(name, type_name);
    }

    fn set_criterion(&self, name: &str, value: u32) -> bool {
        self.backend.set_criterion(name, value)
    }

    fn get_criterion(&self, name: &str) -> Option<u32> {
        self.backend.get_criterion(name)
    }

    fn set_parameter(&self, path: &str, value: &RogueValue) -> Result<()> {
        self.backend.set_parameter(path, value)
    }

    fn get_parameter(&self, path: &str, kind: RogueKind) -> Option<RogueValue> {
        self.backend.get_parameter(path, kind)
    }
}

impl StreamInterface for LoopbackStreamInterface {
    fn reconsider_routing(&self, synchronous: bool) {
        self.reconsider_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(synchronous);
        if let Some(hook) = self.hook.lock().as_ref() {
            hook(synchronous);
        }
    }
}

/// Loopback routing subsystem
///
/// Criterion values written with `set_criterion` become visible through
/// `committed_value` only after `apply_configurations`.
pub struct LoopbackRouteConnector {
    backend: LoopbackBackend,
    conf_path: PathBuf,
    started: AtomicBool,
    start_failure: Option<String>,
    apply_calls: AtomicUsize,
    committed: Mutex<BTreeMap<String, u32>>,
    logger: Mutex<Option<Arc<dyn ConnectorLogger>>>,
}

impl LoopbackRouteConnector {
    /// Create a connector for the given routing configuration file
    pub fn new(conf_path: impl Into<PathBuf>) -> Self {
        Self {
            backend: LoopbackBackend::new(),
            conf_path: conf_path.into(),
            started: AtomicBool::new(false),
            start_failure: None,
            apply_calls: AtomicUsize::new(0),
            committed: Mutex::new(BTreeMap::new()),
            logger: Mutex::new(None),
        }
    }

    /// Make every `start` call fail with `reason`
    #[must_use]
    pub fn with_start_failure(mut self, reason: impl Into<String>) -> Self {
        self.start_failure = Some(reason.into());
        self
    }

    /// Underlying storage
    pub fn backend(&self) -> &LoopbackBackend {
        &self.backend
    }

    /// Routing configuration file this connector was created for
    pub fn conf_path(&self) -> &Path {
        &self.conf_path
    }

    /// Number of commits so far
    pub fn apply_count(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }

    /// Value published by the last commit
    pub fn committed_value(&self, name: &str) -> Option<u32> {
        self.committed.lock().get(name).copied()
    }

    /// Whether a log sink is installed
    pub fn has_logger(&self) -> bool {
        self.logger.lock().is_some()
    }

    fn log(&self, is_warning: bool, text: &str) {
        if let Some(logger) = self.logger.lock().as_ref() {
            logger.log(is_warning, text);
        }
    }
}

impl CriterionBackend for LoopbackRouteConnector {
    fn declare_criterion_type(&self, name: &str, inclusive: bool) {
        self.backend.declare_criterion_type(name, inclusive);
    }

    fn declare_criterion_value(&self, type_name: &str, code: u32, literal: &str) {
        self.backend.declare_criterion_value(type_name, code, literal);
    }

    fn declare_criterion(&self, name: &str, type_name: &str) {
        self.backend.declare_criterion(name, type_name);
    }

    fn set_criterion(&self, name: &str, value: u32) -> bool {
        self.backend.set_criterion(name, value)
    }

    fn get_criterion(&self, name: &str) -> Option<u32> {
        self.backend.get_criterion(name)
    }

    fn set_parameter(&self, path: &str, value: &RogueValue) -> Result<()> {
        self.backend.set_parameter(path, value)
    }

    fn get_parameter(&self, path: &str, kind: RogueKind) -> Option<RogueValue> {
        self.backend.get_parameter(path, kind)
    }
}

impl RouteConnector for LoopbackRouteConnector {
    fn start(&self) -> Result<()> {
        if let Some(reason) = &self.start_failure {
            self.log(true, &format!("start failed: {}", reason));
            return Err(HalError::start_failed(reason.clone()));
        }
        self.started.store(true, Ordering::SeqCst);
        self.log(
            false,
            &format!("started with {}", self.conf_path.display()),
        );
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn apply_configurations(&self) {
        let values = self.backend.criteria_values();
        let count = values.len();
        *self.committed.lock() = values;
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        self.log(false, &format!("applied {} criteria", count));
    }

    fn set_logger(&self, logger: Option<Arc<dyn ConnectorLogger>>) {
        *self.logger.lock() = logger;
    }
}
