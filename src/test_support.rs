//! Test doubles for the backing contract.
//!
//! This module provides ready-made backing instances so tests of facade
//! callers do not have to hand-implement the full contract: a recording
//! mock with working in-memory platform semantics, an explicit no-op
//! instance, and an RAII guard for install/restore hygiene.
//!
//! It is compiled into the library (not gated on `cfg(test)`) so that
//! downstream crates can use the doubles from their own test suites.
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_shim::test_support::install_mock;
//! use bazaar_shim::Bazaar;
//!
//! #[test]
//! fn test_example() {
//!     let (mock, _guard) = install_mock();
//!     mock.set_installed(false);
//!
//!     assert!(!Bazaar::is_installed(None).unwrap());
//!     assert_eq!(mock.calls_of("is_installed").len(), 1);
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use serde_json::{json, Value};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::facade::Bazaar;
use crate::slot;
use crate::types::{
    handle, Edition, Event, LogLevel, ObjectHandle, ObserverCallback, VersionInfo,
};

/// Log file the mock writes to when the caller does not name one.
pub const SYSTEM_LOG_FILE: &str = "system.log";

/// Log file the mock uses for recorded exceptions.
pub const EXCEPTION_LOG_FILE: &str = "exception.log";

/// One forwarded operation as the mock saw it.
///
/// `args` is the ordered argument list serialized to JSON, so assertions can
/// compare whole calls with `json!` literals. Callbacks and object handles
/// are not serializable and appear as `"<callback>"` / `"<handle>"`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Operation name, matching the contract method name.
    pub op: &'static str,
    /// Ordered arguments, serialized.
    pub args: Value,
}

/// What a factory or accessor operation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Model,
    ResourceModel,
    Singleton,
    ResourceSingleton,
    Controller,
    Block,
    Helper,
    ResourceHelper,
    EventCollection,
    ObjectCache,
    Design,
    Config,
    App,
}

/// Downcastable payload behind every handle the mock constructs.
///
/// Tests retrieve it with `handle.downcast_ref::<StubObject>()` to check
/// which retrieval flavor produced an object and with what arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct StubObject {
    /// Retrieval flavor that constructed this object.
    pub kind: ObjectKind,
    /// Class alias, helper name, or accessor name the retrieval used.
    pub alias: String,
    /// Constructor arguments the retrieval was given.
    pub args: Value,
}

impl StubObject {
    /// Build a stub payload.
    pub fn new(kind: ObjectKind, alias: impl Into<String>, args: Value) -> Self {
        StubObject {
            kind,
            alias: alias.into(),
            args,
        }
    }
}

/// A registered observer, minus its callback.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredObserver {
    /// Exact event name, or a `*` wildcard pattern.
    pub event_name: String,
    /// Observer name supplied at registration.
    pub name: String,
    /// Observer class supplied at registration.
    pub class: String,
    /// Static data bag supplied at registration.
    pub data: Value,
}

/// One entry in the mock's log buffer, with platform defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub message: String,
    pub level: LogLevel,
    pub file: String,
    pub force_log: bool,
}

#[derive(Clone)]
struct ObserverEntry {
    info: RegisteredObserver,
    callback: ObserverCallback,
}

/// Whether `pattern` selects `event`: exact match, or `*` wildcards when the
/// pattern contains any.
fn pattern_matches(pattern: &str, event: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == event;
    }
    let expr = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    regex::Regex::new(&expr)
        .map(|re| re.is_match(event))
        .unwrap_or(false)
}

/// Platform truthiness for config flags: an empty value, `"0"`, or `"false"`
/// (case insensitive) reads as off, anything else as on.
fn config_flag(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(text) => {
            let text = text.trim().to_ascii_lowercase();
            !(text.is_empty() || text == "0" || text == "false")
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}

struct MockState {
    calls: Vec<RecordedCall>,
    injected: HashMap<&'static str, VecDeque<Error>>,
    version_info: VersionInfo,
    edition: Edition,
    installed: bool,
    developer_mode: bool,
    downloader: bool,
    registry: HashMap<String, Value>,
    root: Option<PathBuf>,
    dir_overrides: HashMap<String, PathBuf>,
    store_config: HashMap<(String, Option<String>), Value>,
    site: Url,
    observers: Vec<ObserverEntry>,
    singletons: HashMap<String, ObjectHandle>,
    provided: HashMap<String, ObjectHandle>,
    accessors: HashMap<&'static str, ObjectHandle>,
    app_initialized: bool,
    log_records: Vec<LogRecord>,
    printed: Vec<String>,
    stored_messages: Vec<(String, String)>,
    file_versions: HashMap<String, String>,
}

impl MockState {
    fn new() -> Self {
        MockState {
            calls: Vec::new(),
            injected: HashMap::new(),
            version_info: VersionInfo::new("1", "9", "4", "5"),
            edition: Edition::Community,
            installed: true,
            developer_mode: false,
            downloader: false,
            registry: HashMap::new(),
            root: None,
            dir_overrides: HashMap::new(),
            store_config: HashMap::new(),
            site: Url::parse(MockBackend::DEFAULT_SITE_URL).expect("default site URL parses"),
            observers: Vec::new(),
            singletons: HashMap::new(),
            provided: HashMap::new(),
            accessors: HashMap::new(),
            app_initialized: false,
            log_records: Vec::new(),
            printed: Vec::new(),
            stored_messages: Vec::new(),
            file_versions: HashMap::new(),
        }
    }

    fn record(&mut self, op: &'static str, args: Value) {
        self.calls.push(RecordedCall { op, args });
    }

    /// Pop and return the next injected failure for `op`, if one is queued.
    fn take_injected(&mut self, op: &str) -> Result<()> {
        if let Some(queue) = self.injected.get_mut(op) {
            if let Some(err) = queue.pop_front() {
                return Err(err);
            }
        }
        Ok(())
    }

    fn root_dir(&self) -> Result<PathBuf> {
        self.root
            .clone()
            .ok_or_else(|| Error::core("core", "application root is not set", 0))
    }

    /// Directory for `kind`, override first, then the root-anchored layout.
    fn resolve_dir(&self, kind: &str) -> Result<PathBuf> {
        if let Some(path) = self.dir_overrides.get(kind) {
            return Ok(path.clone());
        }
        let root = self.root_dir()?;
        let dir = match kind {
            "base" => root,
            "app" => root.join("app"),
            "code" => root.join("app").join("code"),
            "design" => root.join("app").join("design"),
            "etc" => root.join("app").join("etc"),
            "locale" => root.join("app").join("locale"),
            "lib" => root.join("lib"),
            "media" => root.join("media"),
            "skin" => root.join("skin"),
            "var" => root.join("var"),
            "tmp" => root.join("var").join("tmp"),
            "cache" => root.join("var").join("cache"),
            "log" => root.join("var").join("log"),
            "session" => root.join("var").join("session"),
            "export" => root.join("var").join("export"),
            "upload" => root.join("media").join("upload"),
            other => {
                return Err(Error::core(
                    "core",
                    format!("invalid directory kind `{}`", other),
                    0,
                ))
            }
        };
        Ok(dir)
    }

    /// Store-scoped config value, falling back to the default scope.
    fn config_value(&self, path: &str, store: Option<&str>) -> Value {
        let scoped = (path.to_string(), store.map(str::to_string));
        if let Some(value) = self.store_config.get(&scoped) {
            return value.clone();
        }
        self.store_config
            .get(&(path.to_string(), None))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn accessor(&mut self, name: &'static str, kind: ObjectKind) -> ObjectHandle {
        if let Some(existing) = self.accessors.get(name) {
            return Arc::clone(existing);
        }
        let object = handle(StubObject::new(kind, name, json!({})));
        self.accessors.insert(name, Arc::clone(&object));
        object
    }

    fn app_handle(&mut self, code: &str, run_type: &str) -> ObjectHandle {
        if let Some(existing) = self.accessors.get("app") {
            return Arc::clone(existing);
        }
        let object = handle(StubObject::new(
            ObjectKind::App,
            code,
            json!({ "run_type": run_type }),
        ));
        self.accessors.insert("app", Arc::clone(&object));
        object
    }
}

/// A stand-in platform: records every forwarded call and answers it with
/// working in-memory semantics.
///
/// Every operation appends a [`RecordedCall`] before doing anything else, so
/// argument-level assertions work even for operations that then fail. State
/// is behind one mutex; all configuration methods take `&self` because the
/// installed instance is shared through an `Arc`.
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    /// Site URL the mock composes URLs against until reconfigured.
    pub const DEFAULT_SITE_URL: &'static str = "http://bazaar.test/";

    /// Create a mock with the default fixture state: version `1.9.4.5`,
    /// Community edition, installed, no root, empty registry.
    pub fn new() -> Self {
        MockBackend {
            state: Mutex::new(MockState::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A test that panicked mid-assertion must not wedge the mock for
        // the tests that follow in the same process.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // ------------------------------------------------------------------
    // Call inspection
    // ------------------------------------------------------------------

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    /// Recorded calls for one operation, in order.
    pub fn calls_of(&self, op: &str) -> Vec<RecordedCall> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.op == op)
            .cloned()
            .collect()
    }

    /// Forget all recorded calls.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Queue a one-shot failure: the next call to `op` returns `error`
    /// (after being recorded), later calls behave normally again.
    pub fn queue_error(&self, op: &'static str, error: Error) {
        self.state().injected.entry(op).or_default().push_back(error);
    }

    // ------------------------------------------------------------------
    // Fixture configuration
    // ------------------------------------------------------------------

    /// Replace the version record reported by `version` / `version_info`.
    pub fn set_version_info(&self, info: VersionInfo) {
        self.state().version_info = info;
    }

    /// Replace the reported edition.
    pub fn set_edition(&self, edition: Edition) {
        self.state().edition = edition;
    }

    /// Set what `is_installed` reports (defaults to true).
    pub fn set_installed(&self, installed: bool) {
        self.state().installed = installed;
    }

    /// Replace the site URL used for URL composition.
    pub fn set_site_url(&self, site: Url) {
        self.state().site = site;
    }

    /// Pin the directory for one kind, bypassing the root-anchored layout.
    pub fn set_base_dir(&self, kind: impl Into<String>, path: impl Into<PathBuf>) {
        self.state().dir_overrides.insert(kind.into(), path.into());
    }

    /// Seed a config value; `None` store seeds the default scope.
    pub fn set_store_config(&self, path: impl Into<String>, store: Option<&str>, value: Value) {
        self.state()
            .store_config
            .insert((path.into(), store.map(str::to_string)), value);
    }

    /// Seed the version advertised for a downloader probe URL.
    pub fn set_file_version(&self, url: impl Into<String>, version: impl Into<String>) {
        self.state()
            .file_versions
            .insert(url.into(), version.into());
    }

    /// Make `model` return `object` for `class_alias` instead of a stub.
    pub fn provide_model(&self, class_alias: impl Into<String>, object: ObjectHandle) {
        self.state()
            .provided
            .insert(format!("model:{}", class_alias.into()), object);
    }

    /// Make `singleton` return `object` for `class_alias`.
    pub fn provide_singleton(&self, class_alias: impl Into<String>, object: ObjectHandle) {
        self.state()
            .provided
            .insert(format!("singleton:{}", class_alias.into()), object);
    }

    /// Make `helper` return `object` for `name`.
    pub fn provide_helper(&self, name: impl Into<String>, object: ObjectHandle) {
        self.state()
            .provided
            .insert(format!("helper:{}", name.into()), object);
    }

    /// Make `objects(Some(key))` return `object`.
    pub fn provide_object(&self, key: impl Into<String>, object: ObjectHandle) {
        self.state()
            .provided
            .insert(format!("object:{}", key.into()), object);
    }

    // ------------------------------------------------------------------
    // State probes
    // ------------------------------------------------------------------

    /// Registered observers, in registration order.
    pub fn observers(&self) -> Vec<RegisteredObserver> {
        self.state()
            .observers
            .iter()
            .map(|entry| entry.info.clone())
            .collect()
    }

    /// The log buffer, in write order.
    pub fn log_records(&self) -> Vec<LogRecord> {
        self.state().log_records.clone()
    }

    /// Exceptions rendered by `print_exception`, in order.
    pub fn printed_exceptions(&self) -> Vec<String> {
        self.state().printed.clone()
    }

    /// `(storage, message)` pairs noted by `throw_exception`.
    pub fn stored_messages(&self) -> Vec<(String, String)> {
        self.state().stored_messages.clone()
    }

    /// Whether `init` or `run` has been called since construction or reset.
    pub fn app_initialized(&self) -> bool {
        self.state().app_initialized
    }

    /// Whether the process was marked as the downloader application.
    pub fn is_downloader(&self) -> bool {
        self.state().downloader
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        MockBackend::new()
    }
}

impl Backend for MockBackend {
    // ========================================================================
    // Identity / version
    // ========================================================================

    fn version(&self) -> Result<String> {
        let mut state = self.state();
        state.record("version", json!([]));
        state.take_injected("version")?;
        Ok(state.version_info.to_string())
    }

    fn version_info(&self) -> Result<VersionInfo> {
        let mut state = self.state();
        state.record("version_info", json!([]));
        state.take_injected("version_info")?;
        Ok(state.version_info.clone())
    }

    fn edition(&self) -> Result<Edition> {
        let mut state = self.state();
        state.record("edition", json!([]));
        state.take_injected("edition")?;
        Ok(state.edition)
    }

    fn reset(&self) -> Result<()> {
        let mut state = self.state();
        state.record("reset", json!([]));
        state.take_injected("reset")?;
        // Platform state only. Instrumentation (recorded calls, log buffers,
        // fixture configuration) survives a reset.
        state.registry.clear();
        state.observers.clear();
        state.singletons.clear();
        state.accessors.clear();
        state.root = None;
        state.app_initialized = false;
        state.developer_mode = false;
        state.downloader = false;
        Ok(())
    }

    // ========================================================================
    // Key-value registry
    // ========================================================================

    fn register(&self, key: &str, value: Value, graceful: bool) -> Result<()> {
        let mut state = self.state();
        state.record("register", json!([key, value, graceful]));
        state.take_injected("register")?;
        if state.registry.contains_key(key) {
            if graceful {
                debug!(key, "registry key exists, graceful register keeps original");
                return Ok(());
            }
            return Err(Error::already_registered(key));
        }
        state.registry.insert(key.to_string(), value);
        Ok(())
    }

    fn unregister(&self, key: &str) -> Result<()> {
        let mut state = self.state();
        state.record("unregister", json!([key]));
        state.take_injected("unregister")?;
        // Removing an absent key is a no-op, as on the platform.
        state.registry.remove(key);
        Ok(())
    }

    fn registry(&self, key: &str) -> Result<Value> {
        let mut state = self.state();
        state.record("registry", json!([key]));
        state.take_injected("registry")?;
        state
            .registry
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(key))
    }

    // ========================================================================
    // Root / path resolution
    // ========================================================================

    fn set_root(&self, app_root: Option<&Path>) -> Result<()> {
        let mut state = self.state();
        state.record(
            "set_root",
            json!([app_root.map(|path| path.display().to_string())]),
        );
        state.take_injected("set_root")?;
        // `None` asks the platform to locate its own root; the mock settles
        // on the current directory.
        state.root = Some(
            app_root
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        );
        Ok(())
    }

    fn root(&self) -> Result<PathBuf> {
        let mut state = self.state();
        state.record("root", json!([]));
        state.take_injected("root")?;
        state.root_dir()
    }

    fn base_dir(&self, kind: &str) -> Result<PathBuf> {
        let mut state = self.state();
        state.record("base_dir", json!([kind]));
        state.take_injected("base_dir")?;
        state.resolve_dir(kind)
    }

    fn module_dir(&self, kind: &str, module: &str) -> Result<PathBuf> {
        let mut state = self.state();
        state.record("module_dir", json!([kind, module]));
        state.take_injected("module_dir")?;
        let mut dir = state.resolve_dir("code")?.join(module);
        if !kind.is_empty() {
            dir = dir.join(kind);
        }
        Ok(dir)
    }

    fn script_system_url(&self, folder: &str, exit_if_missing: bool) -> Result<String> {
        let mut state = self.state();
        state.record("script_system_url", json!([folder, exit_if_missing]));
        state.take_injected("script_system_url")?;
        // The mock has no filesystem to probe, so `exit_if_missing` is
        // recorded but every folder resolves.
        let folder_path = format!("{}/", folder.trim_matches('/'));
        let url = state
            .site
            .join(&folder_path)
            .map_err(|e| anyhow!("cannot resolve system folder `{}`: {}", folder, e))?;
        Ok(url.to_string())
    }

    // ========================================================================
    // Core object accessors
    // ========================================================================

    fn events(&self) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("events", json!([]));
        state.take_injected("events")?;
        Ok(state.accessor("events", ObjectKind::EventCollection))
    }

    fn objects(&self, key: Option<&str>) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("objects", json!([key]));
        state.take_injected("objects")?;
        match key {
            None => Ok(state.accessor("objects", ObjectKind::ObjectCache)),
            Some(key) => state
                .provided
                .get(&format!("object:{}", key))
                .map(Arc::clone)
                .ok_or_else(|| Error::not_found(key)),
        }
    }

    fn design(&self) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("design", json!([]));
        state.take_injected("design")?;
        Ok(state.accessor("design", ObjectKind::Design))
    }

    fn config(&self) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("config", json!([]));
        state.take_injected("config")?;
        Ok(state.accessor("config", ObjectKind::Config))
    }

    // ========================================================================
    // Configuration lookup
    // ========================================================================

    fn store_config(&self, path: &str, store: Option<&str>) -> Result<Value> {
        let mut state = self.state();
        state.record("store_config", json!([path, store]));
        state.take_injected("store_config")?;
        // An unseeded path reads as null, not as an error.
        Ok(state.config_value(path, store))
    }

    fn store_config_flag(&self, path: &str, store: Option<&str>) -> Result<bool> {
        let mut state = self.state();
        state.record("store_config_flag", json!([path, store]));
        state.take_injected("store_config_flag")?;
        Ok(config_flag(&state.config_value(path, store)))
    }

    // ========================================================================
    // URL generation
    // ========================================================================

    fn base_url(&self, url_type: &str, secure: Option<bool>) -> Result<String> {
        let mut state = self.state();
        state.record("base_url", json!([url_type, secure]));
        state.take_injected("base_url")?;
        let mut url = state.site.clone();
        if let Some(secure) = secure {
            let scheme = if secure { "https" } else { "http" };
            url.set_scheme(scheme)
                .map_err(|_| anyhow!("cannot set scheme `{}` on site URL", scheme))?;
        }
        let url = if url_type == Bazaar::URL_TYPE_LINK {
            url
        } else {
            url.join(&format!("{}/", url_type))
                .map_err(|e| anyhow!("cannot resolve `{}` base URL: {}", url_type, e))?
        };
        Ok(url.to_string())
    }

    fn url(&self, route: &str, params: Value) -> Result<String> {
        let mut state = self.state();
        state.record("url", json!([route, params]));
        state.take_injected("url")?;
        let mut url = state
            .site
            .join(route.trim_start_matches('/'))
            .map_err(|e| anyhow!("cannot resolve route `{}`: {}", route, e))?;
        if let Value::Object(entries) = &params {
            if !entries.is_empty() {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in entries {
                    let rendered = match value {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    pairs.append_pair(key, &rendered);
                }
            }
        }
        Ok(url.to_string())
    }

    // ========================================================================
    // Events / observers
    // ========================================================================

    fn add_observer(
        &self,
        event_name: &str,
        callback: ObserverCallback,
        data: Value,
        observer_name: &str,
        observer_class: &str,
    ) -> Result<()> {
        let mut state = self.state();
        state.record(
            "add_observer",
            json!([event_name, "<callback>", data, observer_name, observer_class]),
        );
        state.take_injected("add_observer")?;
        state.observers.push(ObserverEntry {
            info: RegisteredObserver {
                event_name: event_name.to_string(),
                name: observer_name.to_string(),
                class: observer_class.to_string(),
                data,
            },
            callback,
        });
        Ok(())
    }

    fn dispatch_event(&self, name: &str, data: Value) -> Result<()> {
        // Collect matches under the lock, invoke with the lock released so
        // a callback may call back into this instance.
        let matched: Vec<ObserverEntry> = {
            let mut state = self.state();
            state.record("dispatch_event", json!([name, data]));
            state.take_injected("dispatch_event")?;
            state
                .observers
                .iter()
                .filter(|entry| pattern_matches(&entry.info.event_name, name))
                .cloned()
                .collect()
        };
        trace!(event = name, observers = matched.len(), "dispatching event");
        let event = Event::new(name, data);
        for entry in matched {
            (entry.callback)(&event)?;
        }
        Ok(())
    }

    // ========================================================================
    // Object / factory retrieval
    // ========================================================================

    fn model(&self, class_alias: &str, args: Value) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("model", json!([class_alias, args]));
        state.take_injected("model")?;
        if let Some(provided) = state.provided.get(&format!("model:{}", class_alias)) {
            return Ok(Arc::clone(provided));
        }
        Ok(handle(StubObject::new(ObjectKind::Model, class_alias, args)))
    }

    fn singleton(&self, class_alias: &str, args: Value) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("singleton", json!([class_alias, args]));
        state.take_injected("singleton")?;
        let key = format!("singleton:{}", class_alias);
        if let Some(provided) = state.provided.get(&key) {
            return Ok(Arc::clone(provided));
        }
        if let Some(cached) = state.singletons.get(&key) {
            return Ok(Arc::clone(cached));
        }
        // First retrieval constructs; its args are the ones kept.
        let object = handle(StubObject::new(ObjectKind::Singleton, class_alias, args));
        state.singletons.insert(key, Arc::clone(&object));
        Ok(object)
    }

    fn resource_model(&self, class_alias: &str, args: Value) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("resource_model", json!([class_alias, args]));
        state.take_injected("resource_model")?;
        Ok(handle(StubObject::new(
            ObjectKind::ResourceModel,
            class_alias,
            args,
        )))
    }

    fn resource_singleton(&self, class_alias: &str, args: Value) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("resource_singleton", json!([class_alias, args]));
        state.take_injected("resource_singleton")?;
        let key = format!("resource_singleton:{}", class_alias);
        if let Some(cached) = state.singletons.get(&key) {
            return Ok(Arc::clone(cached));
        }
        let object = handle(StubObject::new(
            ObjectKind::ResourceSingleton,
            class_alias,
            args,
        ));
        state.singletons.insert(key, Arc::clone(&object));
        Ok(object)
    }

    fn controller_instance(
        &self,
        class_name: &str,
        _request: ObjectHandle,
        _response: ObjectHandle,
        invoke_args: Value,
    ) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record(
            "controller_instance",
            json!([class_name, "<handle>", "<handle>", invoke_args]),
        );
        state.take_injected("controller_instance")?;
        Ok(handle(StubObject::new(
            ObjectKind::Controller,
            class_name,
            invoke_args,
        )))
    }

    fn block_singleton(&self, block_type: &str) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("block_singleton", json!([block_type]));
        state.take_injected("block_singleton")?;
        let key = format!("block:{}", block_type);
        if let Some(cached) = state.singletons.get(&key) {
            return Ok(Arc::clone(cached));
        }
        let object = handle(StubObject::new(ObjectKind::Block, block_type, json!({})));
        state.singletons.insert(key, Arc::clone(&object));
        Ok(object)
    }

    fn helper(&self, name: &str) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("helper", json!([name]));
        state.take_injected("helper")?;
        let key = format!("helper:{}", name);
        if let Some(provided) = state.provided.get(&key) {
            return Ok(Arc::clone(provided));
        }
        if let Some(cached) = state.singletons.get(&key) {
            return Ok(Arc::clone(cached));
        }
        let object = handle(StubObject::new(ObjectKind::Helper, name, json!({})));
        state.singletons.insert(key, Arc::clone(&object));
        Ok(object)
    }

    fn resource_helper(&self, module: &str) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("resource_helper", json!([module]));
        state.take_injected("resource_helper")?;
        let key = format!("resource_helper:{}", module);
        if let Some(cached) = state.singletons.get(&key) {
            return Ok(Arc::clone(cached));
        }
        let object = handle(StubObject::new(ObjectKind::ResourceHelper, module, json!({})));
        state.singletons.insert(key, Arc::clone(&object));
        Ok(object)
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    fn exception(&self, module: &str, message: &str, code: i32) -> Result<Error> {
        let mut state = self.state();
        state.record("exception", json!([module, message, code]));
        state.take_injected("exception")?;
        Ok(Error::core(module, message, code))
    }

    fn throw_exception(&self, message: &str, message_storage: Option<&str>) -> Result<()> {
        let mut state = self.state();
        state.record("throw_exception", json!([message, message_storage]));
        state.take_injected("throw_exception")?;
        if let Some(storage) = message_storage {
            state
                .stored_messages
                .push((storage.to_string(), message.to_string()));
        }
        Err(Error::core("core", message, 0))
    }

    fn log_exception(&self, error: &Error) -> Result<()> {
        let mut state = self.state();
        state.record("log_exception", json!([error.to_string()]));
        state.take_injected("log_exception")?;
        let record = LogRecord {
            message: error.to_string(),
            level: LogLevel::Error,
            file: EXCEPTION_LOG_FILE.to_string(),
            force_log: false,
        };
        error!(log_file = EXCEPTION_LOG_FILE, "{}", record.message);
        state.log_records.push(record);
        Ok(())
    }

    fn print_exception(&self, error: &Error, extra: &str) -> Result<()> {
        let mut state = self.state();
        state.record("print_exception", json!([error.to_string(), extra]));
        state.take_injected("print_exception")?;
        let rendered = if extra.is_empty() {
            error.to_string()
        } else {
            format!("{}\n{}", error, extra)
        };
        state.printed.push(rendered);
        Ok(())
    }

    // ========================================================================
    // Application lifecycle
    // ========================================================================

    fn app(&self, code: &str, run_type: &str, options: Value) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("app", json!([code, run_type, options]));
        state.take_injected("app")?;
        Ok(state.app_handle(code, run_type))
    }

    fn init(
        &self,
        code: &str,
        run_type: &str,
        options: Value,
        modules: Value,
    ) -> Result<ObjectHandle> {
        let mut state = self.state();
        state.record("init", json!([code, run_type, options, modules]));
        state.take_injected("init")?;
        state.app_initialized = true;
        Ok(state.app_handle(code, run_type))
    }

    fn run(&self, code: &str, run_type: &str, options: Value) -> Result<()> {
        let mut state = self.state();
        state.record("run", json!([code, run_type, options]));
        state.take_injected("run")?;
        state.app_initialized = true;
        Ok(())
    }

    fn is_installed(&self, options: Value) -> Result<bool> {
        let mut state = self.state();
        state.record("is_installed", json!([options]));
        state.take_injected("is_installed")?;
        Ok(state.installed)
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    fn log(
        &self,
        message: &str,
        level: Option<LogLevel>,
        file: Option<&str>,
        force_log: bool,
    ) -> Result<()> {
        let mut state = self.state();
        state.record(
            "log",
            json!([message, level.map(|l| l.as_str()), file, force_log]),
        );
        state.take_injected("log")?;
        let record = LogRecord {
            message: message.to_string(),
            level: level.unwrap_or_default(),
            file: file.unwrap_or(SYSTEM_LOG_FILE).to_string(),
            force_log,
        };
        match record.level {
            LogLevel::Emergency | LogLevel::Alert | LogLevel::Critical | LogLevel::Error => {
                error!(log_file = %record.file, "{}", record.message)
            }
            LogLevel::Warning => warn!(log_file = %record.file, "{}", record.message),
            LogLevel::Notice | LogLevel::Info => info!(log_file = %record.file, "{}", record.message),
            LogLevel::Debug => debug!(log_file = %record.file, "{}", record.message),
        }
        state.log_records.push(record);
        Ok(())
    }

    fn set_developer_mode(&self, enabled: bool) -> Result<bool> {
        let mut state = self.state();
        state.record("set_developer_mode", json!([enabled]));
        state.take_injected("set_developer_mode")?;
        state.developer_mode = enabled;
        Ok(enabled)
    }

    fn is_developer_mode(&self) -> Result<bool> {
        let mut state = self.state();
        state.record("is_developer_mode", json!([]));
        state.take_injected("is_developer_mode")?;
        Ok(state.developer_mode)
    }

    fn set_is_downloader(&self, flag: bool) -> Result<()> {
        let mut state = self.state();
        state.record("set_is_downloader", json!([flag]));
        state.take_injected("set_is_downloader")?;
        state.downloader = flag;
        Ok(())
    }

    // ========================================================================
    // Downloader file-version probes
    // ========================================================================

    fn file_version(&self, url: &str) -> Result<String> {
        let mut state = self.state();
        state.record("file_version", json!([url]));
        state.take_injected("file_version")?;
        state
            .file_versions
            .get(url)
            .cloned()
            .ok_or_else(|| Error::not_found(url))
    }

    fn file_version_net3(&self, url: &str) -> Result<String> {
        let mut state = self.state();
        state.record("file_version_net3", json!([url]));
        state.take_injected("file_version_net3")?;
        // Same table as `file_version`; the transport distinction carries no
        // behavior here.
        state
            .file_versions
            .get(url)
            .cloned()
            .ok_or_else(|| Error::not_found(url))
    }
}

/// An explicit empty backing instance: accepts everything, stores nothing,
/// answers with benign empties.
///
/// Installing one is the closest thing to returning the facade to its
/// pre-install state, since there is no uninstall. `throw_exception` still
/// fails, because failing is that operation's one meaning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackend;

impl Backend for NoopBackend {
    fn version(&self) -> Result<String> {
        Ok(String::new())
    }

    fn version_info(&self) -> Result<VersionInfo> {
        Ok(VersionInfo::default())
    }

    fn edition(&self) -> Result<Edition> {
        Ok(Edition::Community)
    }

    fn reset(&self) -> Result<()> {
        Ok(())
    }

    fn register(&self, _key: &str, _value: Value, _graceful: bool) -> Result<()> {
        Ok(())
    }

    fn unregister(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn registry(&self, _key: &str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn set_root(&self, _app_root: Option<&Path>) -> Result<()> {
        Ok(())
    }

    fn root(&self) -> Result<PathBuf> {
        Ok(PathBuf::new())
    }

    fn base_dir(&self, _kind: &str) -> Result<PathBuf> {
        Ok(PathBuf::new())
    }

    fn module_dir(&self, _kind: &str, _module: &str) -> Result<PathBuf> {
        Ok(PathBuf::new())
    }

    fn script_system_url(&self, _folder: &str, _exit_if_missing: bool) -> Result<String> {
        Ok(String::new())
    }

    fn events(&self) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn objects(&self, _key: Option<&str>) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn design(&self) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn config(&self) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn store_config(&self, _path: &str, _store: Option<&str>) -> Result<Value> {
        Ok(Value::Null)
    }

    fn store_config_flag(&self, _path: &str, _store: Option<&str>) -> Result<bool> {
        Ok(false)
    }

    fn base_url(&self, _url_type: &str, _secure: Option<bool>) -> Result<String> {
        Ok(String::new())
    }

    fn url(&self, _route: &str, _params: Value) -> Result<String> {
        Ok(String::new())
    }

    fn add_observer(
        &self,
        _event_name: &str,
        _callback: ObserverCallback,
        _data: Value,
        _observer_name: &str,
        _observer_class: &str,
    ) -> Result<()> {
        Ok(())
    }

    fn dispatch_event(&self, _name: &str, _data: Value) -> Result<()> {
        Ok(())
    }

    fn model(&self, _class_alias: &str, _args: Value) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn singleton(&self, _class_alias: &str, _args: Value) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn resource_model(&self, _class_alias: &str, _args: Value) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn resource_singleton(&self, _class_alias: &str, _args: Value) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn controller_instance(
        &self,
        _class_name: &str,
        _request: ObjectHandle,
        _response: ObjectHandle,
        _invoke_args: Value,
    ) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn block_singleton(&self, _block_type: &str) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn helper(&self, _name: &str) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn resource_helper(&self, _module: &str) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn exception(&self, module: &str, message: &str, code: i32) -> Result<Error> {
        Ok(Error::core(module, message, code))
    }

    fn throw_exception(&self, message: &str, _message_storage: Option<&str>) -> Result<()> {
        Err(Error::core("core", message, 0))
    }

    fn log_exception(&self, _error: &Error) -> Result<()> {
        Ok(())
    }

    fn print_exception(&self, _error: &Error, _extra: &str) -> Result<()> {
        Ok(())
    }

    fn app(&self, _code: &str, _run_type: &str, _options: Value) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn init(
        &self,
        _code: &str,
        _run_type: &str,
        _options: Value,
        _modules: Value,
    ) -> Result<ObjectHandle> {
        Ok(handle(()))
    }

    fn run(&self, _code: &str, _run_type: &str, _options: Value) -> Result<()> {
        Ok(())
    }

    fn is_installed(&self, _options: Value) -> Result<bool> {
        Ok(false)
    }

    fn log(
        &self,
        _message: &str,
        _level: Option<LogLevel>,
        _file: Option<&str>,
        _force_log: bool,
    ) -> Result<()> {
        Ok(())
    }

    fn set_developer_mode(&self, enabled: bool) -> Result<bool> {
        Ok(enabled)
    }

    fn is_developer_mode(&self) -> Result<bool> {
        Ok(false)
    }

    fn set_is_downloader(&self, _flag: bool) -> Result<()> {
        Ok(())
    }

    fn file_version(&self, _url: &str) -> Result<String> {
        Ok(String::new())
    }

    fn file_version_net3(&self, _url: &str) -> Result<String> {
        Ok(String::new())
    }
}

/// Installs a backing instance and restores the previous one on drop.
///
/// There is no uninstall, so when nothing was installed before, drop leaves
/// a [`NoopBackend`] behind instead.
pub struct InstallGuard {
    previous: Option<Arc<dyn Backend>>,
}

impl InstallGuard {
    /// Install `backend`, remembering what was installed before.
    pub fn install(backend: Arc<dyn Backend>) -> Self {
        let previous = slot::current();
        slot::install(backend);
        InstallGuard { previous }
    }
}

impl Drop for InstallGuard {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(previous) => slot::install(previous),
            None => slot::install(Arc::new(NoopBackend)),
        }
    }
}

/// Install a fresh [`MockBackend`] and hand back both the shared handle for
/// inspection and the guard that undoes the install.
pub fn install_mock() -> (Arc<MockBackend>, InstallGuard) {
    let mock = Arc::new(MockBackend::new());
    let guard = InstallGuard::install(Arc::clone(&mock) as Arc<dyn Backend>);
    (mock, guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::callback;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // These tests call the mock directly; the process-global slot is only
    // exercised by the integration suite.

    #[test]
    fn test_records_calls_in_order_with_args() {
        let mock = MockBackend::new();

        mock.version().unwrap();
        mock.register("customer", json!({"id": 7}), false).unwrap();
        mock.registry("customer").unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].op, "version");
        assert_eq!(calls[0].args, json!([]));
        assert_eq!(calls[1].op, "register");
        assert_eq!(calls[1].args, json!(["customer", {"id": 7}, false]));
        assert_eq!(calls[2].op, "registry");

        assert_eq!(mock.calls_of("register").len(), 1);
        mock.clear_calls();
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_queue_error_is_one_shot() {
        let mock = MockBackend::new();
        mock.queue_error("version", Error::core("core", "platform offline", 503));

        let err = mock.version().unwrap_err();
        assert!(matches!(err, Error::Core { code: 503, .. }));
        // The failure is consumed after being recorded once.
        assert_eq!(mock.version().unwrap(), "1.9.4.5");
        assert_eq!(mock.calls_of("version").len(), 2);
    }

    #[test]
    fn test_register_graceful_semantics() {
        let mock = MockBackend::new();

        mock.register("key", json!("first"), false).unwrap();
        let err = mock.register("key", json!("second"), false).unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered { .. }));

        // Graceful keeps the original value silently.
        mock.register("key", json!("third"), true).unwrap();
        assert_eq!(mock.registry("key").unwrap(), json!("first"));

        let err = mock.registry("absent").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        // Unregistering an absent key is a no-op.
        mock.unregister("absent").unwrap();
        mock.unregister("key").unwrap();
        assert!(mock.registry("key").is_err());
    }

    #[test]
    fn test_base_dir_layout_under_root() {
        let mock = MockBackend::new();

        let err = mock.base_dir("base").unwrap_err();
        assert!(matches!(err, Error::Core { .. }));

        mock.set_root(Some(Path::new("/srv/shop"))).unwrap();
        assert_eq!(mock.root().unwrap(), PathBuf::from("/srv/shop"));
        assert_eq!(mock.base_dir("base").unwrap(), PathBuf::from("/srv/shop"));
        assert_eq!(
            mock.base_dir("etc").unwrap(),
            PathBuf::from("/srv/shop/app/etc")
        );
        assert_eq!(
            mock.base_dir("log").unwrap(),
            PathBuf::from("/srv/shop/var/log")
        );

        assert!(mock.base_dir("attic").is_err());

        // An override wins even over the layout.
        mock.set_base_dir("media", "/mnt/media");
        assert_eq!(mock.base_dir("media").unwrap(), PathBuf::from("/mnt/media"));
    }

    #[test]
    fn test_set_root_none_settles_on_current_dir() {
        let mock = MockBackend::new();
        mock.set_root(None).unwrap();
        assert_eq!(mock.root().unwrap(), PathBuf::from("."));
    }

    #[test]
    fn test_module_dir_under_code_dir() {
        let mock = MockBackend::new();
        mock.set_root(Some(Path::new("/srv/shop"))).unwrap();

        assert_eq!(
            mock.module_dir("etc", "Bazaar_Catalog").unwrap(),
            PathBuf::from("/srv/shop/app/code/Bazaar_Catalog/etc")
        );
        // An empty kind resolves to the module root.
        assert_eq!(
            mock.module_dir("", "Bazaar_Catalog").unwrap(),
            PathBuf::from("/srv/shop/app/code/Bazaar_Catalog")
        );
    }

    #[test]
    fn test_store_config_scope_fallback() {
        let mock = MockBackend::new();
        mock.set_store_config("web/secure/use_front", None, json!("1"));
        mock.set_store_config("web/secure/use_front", Some("de"), json!("0"));

        assert_eq!(
            mock.store_config("web/secure/use_front", Some("de")).unwrap(),
            json!("0")
        );
        // A store without its own value falls back to the default scope.
        assert_eq!(
            mock.store_config("web/secure/use_front", Some("fr")).unwrap(),
            json!("1")
        );
        assert_eq!(
            mock.store_config("web/secure/use_front", None).unwrap(),
            json!("1")
        );
        assert_eq!(mock.store_config("web/unseeded", None).unwrap(), Value::Null);

        assert!(mock.store_config_flag("web/secure/use_front", None).unwrap());
        assert!(!mock.store_config_flag("web/secure/use_front", Some("de")).unwrap());
        assert!(!mock.store_config_flag("web/unseeded", None).unwrap());
    }

    #[test]
    fn test_config_flag_truthiness() {
        assert!(config_flag(&json!(true)));
        assert!(config_flag(&json!("yes")));
        assert!(config_flag(&json!("TRUE")));
        assert!(config_flag(&json!(1)));

        assert!(!config_flag(&Value::Null));
        assert!(!config_flag(&json!(false)));
        assert!(!config_flag(&json!("")));
        assert!(!config_flag(&json!("0")));
        assert!(!config_flag(&json!("false")));
        assert!(!config_flag(&json!(0)));
    }

    #[test]
    fn test_base_url_types_and_scheme() {
        let mock = MockBackend::new();

        assert_eq!(mock.base_url("link", None).unwrap(), "http://bazaar.test/");
        assert_eq!(
            mock.base_url("media", None).unwrap(),
            "http://bazaar.test/media/"
        );
        assert_eq!(
            mock.base_url("link", Some(true)).unwrap(),
            "https://bazaar.test/"
        );
        assert_eq!(
            mock.base_url("skin", Some(false)).unwrap(),
            "http://bazaar.test/skin/"
        );
    }

    #[test]
    fn test_url_builds_route_and_query() {
        let mock = MockBackend::new();

        assert_eq!(
            mock.url("catalog/product/view", json!({"id": 42})).unwrap(),
            "http://bazaar.test/catalog/product/view?id=42"
        );
        // Empty route and bag reproduce the site URL untouched.
        assert_eq!(mock.url("", json!({})).unwrap(), "http://bazaar.test/");
    }

    #[test]
    fn test_script_system_url_resolves_folder() {
        let mock = MockBackend::new();
        assert_eq!(
            mock.script_system_url("js", false).unwrap(),
            "http://bazaar.test/js/"
        );
        assert_eq!(
            mock.script_system_url("skin/frontend", true).unwrap(),
            "http://bazaar.test/skin/frontend/"
        );
    }

    #[test]
    fn test_pattern_matching_rules() {
        assert!(pattern_matches("sales_order_save", "sales_order_save"));
        assert!(!pattern_matches("sales_order_save", "sales_order_load"));

        assert!(pattern_matches("sales_order_*", "sales_order_save"));
        assert!(pattern_matches("*", "anything_at_all"));
        assert!(!pattern_matches("sales_*_after", "sales_order_before"));

        // Regex metacharacters in patterns are taken literally.
        assert!(!pattern_matches("sales.order", "salesXorder"));
        assert!(pattern_matches("sales.order", "sales.order"));
    }

    #[test]
    fn test_dispatch_invokes_matching_observers() {
        let mock = MockBackend::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        mock.add_observer(
            "order_*",
            callback(move |event| {
                assert_eq!(event.data, json!({"total": 99}));
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            json!({}),
            "order_watcher",
            "Bazaar_Sales",
        )
        .unwrap();

        let counter = Arc::clone(&hits);
        mock.add_observer(
            "customer_login",
            callback(move |_| {
                counter.fetch_add(100, Ordering::SeqCst);
                Ok(())
            }),
            json!({}),
            "login_watcher",
            "Bazaar_Customer",
        )
        .unwrap();

        mock.dispatch_event("order_placed", json!({"total": 99})).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let observers = mock.observers();
        assert_eq!(observers.len(), 2);
        assert_eq!(observers[0].name, "order_watcher");
        assert_eq!(observers[1].class, "Bazaar_Customer");
    }

    #[test]
    fn test_dispatch_propagates_callback_error() {
        let mock = MockBackend::new();
        mock.add_observer(
            "order_placed",
            callback(|_| Err(Error::core("sales", "observer refused", 1))),
            json!({}),
            "",
            "",
        )
        .unwrap();

        let err = mock.dispatch_event("order_placed", json!({})).unwrap_err();
        assert!(matches!(err, Error::Core { code: 1, .. }));
    }

    #[test]
    fn test_singletons_cached_models_fresh() {
        let mock = MockBackend::new();

        let first = mock.model("sales/order", json!({})).unwrap();
        let second = mock.model("sales/order", json!({})).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        let first = mock.singleton("core/session", json!({})).unwrap();
        let second = mock.singleton("core/session", json!({})).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stub = first.downcast_ref::<StubObject>().unwrap();
        assert_eq!(stub.kind, ObjectKind::Singleton);
        assert_eq!(stub.alias, "core/session");

        let first = mock.resource_singleton("sales/order", json!({})).unwrap();
        let second = mock.resource_singleton("sales/order", json!({})).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        // Separate cache from the plain singleton of the same alias.
        let plain = mock.singleton("sales/order", json!({})).unwrap();
        assert!(!Arc::ptr_eq(&first, &plain));

        let a = mock.helper("checkout").unwrap();
        let b = mock.helper("checkout").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(
            a.downcast_ref::<StubObject>().unwrap().kind,
            ObjectKind::Helper
        );
    }

    #[test]
    fn test_provided_objects_override() {
        let mock = MockBackend::new();

        let fixed = handle(StubObject::new(ObjectKind::Singleton, "fixed", json!({})));
        mock.provide_singleton("core/session", Arc::clone(&fixed));
        let got = mock.singleton("core/session", json!({})).unwrap();
        assert!(Arc::ptr_eq(&got, &fixed));

        mock.provide_object("cart", Arc::clone(&fixed));
        let got = mock.objects(Some("cart")).unwrap();
        assert!(Arc::ptr_eq(&got, &fixed));

        let err = mock.objects(Some("unknown")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_accessor_objects_are_cached() {
        let mock = MockBackend::new();
        let a = mock.events().unwrap();
        let b = mock.events().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(
            a.downcast_ref::<StubObject>().unwrap().kind,
            ObjectKind::EventCollection
        );

        let cache = mock.objects(None).unwrap();
        assert!(Arc::ptr_eq(&cache, &mock.objects(None).unwrap()));
    }

    #[test]
    fn test_app_lifecycle() {
        let mock = MockBackend::new();
        assert!(!mock.app_initialized());

        let app = mock.init("", "store", json!({}), json!([])).unwrap();
        assert!(mock.app_initialized());
        let again = mock.app("", "store", json!({})).unwrap();
        assert!(Arc::ptr_eq(&app, &again));

        assert!(mock.is_installed(json!({})).unwrap());
        mock.set_installed(false);
        assert!(!mock.is_installed(json!({})).unwrap());

        mock.run("", "store", json!({})).unwrap();
        assert_eq!(mock.calls_of("run").len(), 1);
    }

    #[test]
    fn test_log_applies_platform_defaults() {
        let mock = MockBackend::new();

        mock.log("checkout started", None, None, false).unwrap();
        mock.log("disk full", Some(LogLevel::Critical), Some("custom.log"), true)
            .unwrap();

        let records = mock.log_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, LogLevel::Debug);
        assert_eq!(records[0].file, SYSTEM_LOG_FILE);
        assert_eq!(records[1].level, LogLevel::Critical);
        assert_eq!(records[1].file, "custom.log");
        assert!(records[1].force_log);
    }

    #[test]
    fn test_exception_operations() {
        let mock = MockBackend::new();

        let error = mock.exception("catalog", "product missing", 404).unwrap();
        assert!(matches!(error, Error::Core { code: 404, .. }));

        let err = mock
            .throw_exception("payment declined", Some("checkout/session"))
            .unwrap_err();
        assert!(matches!(err, Error::Core { .. }));
        assert_eq!(
            mock.stored_messages(),
            vec![("checkout/session".to_string(), "payment declined".to_string())]
        );

        mock.log_exception(&Error::not_found("order-9")).unwrap();
        let records = mock.log_records();
        assert_eq!(records.last().unwrap().file, EXCEPTION_LOG_FILE);
        assert_eq!(records.last().unwrap().level, LogLevel::Error);

        mock.print_exception(&Error::not_found("order-9"), "while rendering cart")
            .unwrap();
        let printed = mock.printed_exceptions();
        assert_eq!(printed.len(), 1);
        assert!(printed[0].contains("order-9"));
        assert!(printed[0].contains("while rendering cart"));
    }

    #[test]
    fn test_file_version_lookup() {
        let mock = MockBackend::new();
        mock.set_file_version("http://updates.bazaar.test/core.xml", "2.1.0");

        assert_eq!(
            mock.file_version("http://updates.bazaar.test/core.xml").unwrap(),
            "2.1.0"
        );
        assert_eq!(
            mock.file_version_net3("http://updates.bazaar.test/core.xml")
                .unwrap(),
            "2.1.0"
        );
        assert!(mock.file_version("http://elsewhere.test/x.xml").is_err());
    }

    #[test]
    fn test_developer_mode_and_downloader_flags() {
        let mock = MockBackend::new();
        assert!(!mock.is_developer_mode().unwrap());
        assert!(mock.set_developer_mode(true).unwrap());
        assert!(mock.is_developer_mode().unwrap());

        assert!(!mock.is_downloader());
        mock.set_is_downloader(true).unwrap();
        assert!(mock.is_downloader());
    }

    #[test]
    fn test_reset_clears_platform_state_not_instrumentation() {
        let mock = MockBackend::new();
        mock.set_root(Some(Path::new("/srv/shop"))).unwrap();
        mock.register("key", json!(1), false).unwrap();
        let singleton = mock.singleton("core/session", json!({})).unwrap();
        mock.set_developer_mode(true).unwrap();

        mock.reset().unwrap();

        assert!(mock.registry("key").is_err());
        assert!(mock.root().is_err());
        assert!(!mock.is_developer_mode().unwrap());
        let fresh = mock.singleton("core/session", json!({})).unwrap();
        assert!(!Arc::ptr_eq(&singleton, &fresh));

        // The recorded history is still there for assertions.
        assert!(!mock.calls().is_empty());
    }

    #[test]
    fn test_noop_backend_is_benign() {
        let noop = NoopBackend;

        assert_eq!(noop.version().unwrap(), "");
        assert_eq!(noop.registry("anything").unwrap(), Value::Null);
        assert!(!noop.is_installed(json!({})).unwrap());
        noop.register("k", json!(1), false).unwrap();
        noop.dispatch_event("order_placed", json!({})).unwrap();

        let err = noop.throw_exception("boom", None).unwrap_err();
        assert!(matches!(err, Error::Core { .. }));
    }
}
