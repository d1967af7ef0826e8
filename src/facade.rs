//! The legacy static surface, rebuilt as a forwarding facade.
//!
//! `Bazaar` exposes one associated function per contract operation, with the
//! same names and argument order call sites have always used. Every entry
//! point does exactly one thing: fetch the installed backing instance and
//! relay the call. No caching, no retries, no local recovery; errors come
//! back from the backing instance unchanged.
//!
//! The original surface leaned on omitted arguments. Entry points whose
//! originals carry concrete defaults take `Option` parameters and substitute
//! the documented default before forwarding, so the backing instance always
//! sees a concrete value. Parameters that were genuinely nullable (a store
//! scope, a log level) pass their `Option` straight through.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::slot;
use crate::types::{Edition, LogLevel, ObjectHandle, ObserverCallback, VersionInfo};

/// Static entry points of the storefront platform, forwarded to whichever
/// backing instance is currently installed.
///
/// Call [`Bazaar::install`] once during test setup; until then every
/// forwarding entry point fails with [`Error::NotInstalled`].
pub struct Bazaar;

impl Bazaar {
    /// Directory kind used when [`Bazaar::base_dir`] is called without one.
    pub const DIR_BASE: &'static str = "base";
    /// URL type used when [`Bazaar::base_url`] is called without one.
    pub const URL_TYPE_LINK: &'static str = "link";
    /// Run type used when the lifecycle entry points are called without one.
    pub const RUN_TYPE_STORE: &'static str = "store";
    /// Module attributed to [`Bazaar::exception`] errors by default.
    pub const EXCEPTION_MODULE: &'static str = "core";

    // ========================================================================
    // Lifecycle (not part of the forwarded surface)
    // ========================================================================

    /// Install `backend` as the backing instance for the whole process,
    /// replacing any previously installed one.
    pub fn install(backend: impl Backend + 'static) {
        slot::install(Arc::new(backend));
    }

    /// Install an already-shared backing instance.
    ///
    /// The usual mock workflow: keep one `Arc` handle for inspection, give
    /// the facade a clone.
    pub fn install_arc(backend: Arc<dyn Backend>) {
        slot::install(backend);
    }

    /// The currently installed backing instance, if any.
    pub fn current() -> Option<Arc<dyn Backend>> {
        slot::current()
    }

    // ========================================================================
    // Identity / version
    // ========================================================================

    /// The platform version string.
    pub fn version() -> Result<String> {
        slot::current_or_fail()?.version()
    }

    /// The structured version record.
    pub fn version_info() -> Result<VersionInfo> {
        slot::current_or_fail()?.version_info()
    }

    /// The platform edition.
    pub fn edition() -> Result<Edition> {
        slot::current_or_fail()?.edition()
    }

    /// Return all backing static data to defaults.
    pub fn reset() -> Result<()> {
        slot::current_or_fail()?.reset()
    }

    // ========================================================================
    // Key-value registry
    // ========================================================================

    /// Register `value` under `key`; `graceful` governs duplicate keys and is
    /// interpreted by the backing instance alone.
    pub fn register(key: &str, value: Value, graceful: bool) -> Result<()> {
        slot::current_or_fail()?.register(key, value, graceful)
    }

    /// Remove the value registered under `key`.
    pub fn unregister(key: &str) -> Result<()> {
        slot::current_or_fail()?.unregister(key)
    }

    /// Look up the value registered under `key`.
    pub fn registry(key: &str) -> Result<Value> {
        slot::current_or_fail()?.registry(key)
    }

    // ========================================================================
    // Root / path resolution
    // ========================================================================

    /// Set the application root; `None` lets the platform locate its own.
    pub fn set_root(app_root: Option<&Path>) -> Result<()> {
        slot::current_or_fail()?.set_root(app_root)
    }

    /// The application root directory.
    pub fn root() -> Result<PathBuf> {
        slot::current_or_fail()?.root()
    }

    /// Resolve a directory by kind; `None` defaults to [`Bazaar::DIR_BASE`].
    pub fn base_dir(kind: Option<&str>) -> Result<PathBuf> {
        slot::current_or_fail()?.base_dir(kind.unwrap_or(Self::DIR_BASE))
    }

    /// Resolve a module-relative directory by kind.
    pub fn module_dir(kind: &str, module: &str) -> Result<PathBuf> {
        slot::current_or_fail()?.module_dir(kind, module)
    }

    /// Resolve the URL of a system folder near the running script.
    pub fn script_system_url(folder: &str, exit_if_missing: bool) -> Result<String> {
        slot::current_or_fail()?.script_system_url(folder, exit_if_missing)
    }

    // ========================================================================
    // Core object accessors
    // ========================================================================

    /// The event collection object.
    pub fn events() -> Result<ObjectHandle> {
        slot::current_or_fail()?.events()
    }

    /// The object cache, or the single cached object under `key`.
    pub fn objects(key: Option<&str>) -> Result<ObjectHandle> {
        slot::current_or_fail()?.objects(key)
    }

    /// The design package singleton.
    pub fn design() -> Result<ObjectHandle> {
        slot::current_or_fail()?.design()
    }

    /// The configuration model instance.
    pub fn config() -> Result<ObjectHandle> {
        slot::current_or_fail()?.config()
    }

    // ========================================================================
    // Configuration lookup
    // ========================================================================

    /// Read a config value at `path`; `None` store means the current scope.
    pub fn store_config(path: &str, store: Option<&str>) -> Result<Value> {
        slot::current_or_fail()?.store_config(path, store)
    }

    /// Read a config value at `path` as a boolean flag.
    pub fn store_config_flag(path: &str, store: Option<&str>) -> Result<bool> {
        slot::current_or_fail()?.store_config_flag(path, store)
    }

    // ========================================================================
    // URL generation
    // ========================================================================

    /// Base URL for a URL type; `None` type defaults to
    /// [`Bazaar::URL_TYPE_LINK`], `None` secure lets the platform pick.
    pub fn base_url(url_type: Option<&str>, secure: Option<bool>) -> Result<String> {
        slot::current_or_fail()?.base_url(url_type.unwrap_or(Self::URL_TYPE_LINK), secure)
    }

    /// Build a URL from a route and a parameter bag; defaults are the empty
    /// route and an empty bag.
    pub fn url(route: Option<&str>, params: Option<Value>) -> Result<String> {
        slot::current_or_fail()?.url(route.unwrap_or(""), object_bag(params))
    }

    // ========================================================================
    // Events / observers
    // ========================================================================

    /// Register an observer for `event_name` (exact name or pattern, at the
    /// backing instance's discretion).
    pub fn add_observer(
        event_name: &str,
        callback: ObserverCallback,
        data: Option<Value>,
        observer_name: Option<&str>,
        observer_class: Option<&str>,
    ) -> Result<()> {
        slot::current_or_fail()?.add_observer(
            event_name,
            callback,
            object_bag(data),
            observer_name.unwrap_or(""),
            observer_class.unwrap_or(""),
        )
    }

    /// Dispatch `name` to every matching observer; `None` data becomes an
    /// empty bag.
    pub fn dispatch_event(name: &str, data: Option<Value>) -> Result<()> {
        slot::current_or_fail()?.dispatch_event(name, object_bag(data))
    }

    // ========================================================================
    // Object / factory retrieval
    // ========================================================================

    /// A fresh model instance for `class_alias`.
    pub fn model(class_alias: &str, args: Option<Value>) -> Result<ObjectHandle> {
        slot::current_or_fail()?.model(class_alias, object_bag(args))
    }

    /// The cached singleton for `class_alias`.
    pub fn singleton(class_alias: &str, args: Option<Value>) -> Result<ObjectHandle> {
        slot::current_or_fail()?.singleton(class_alias, object_bag(args))
    }

    /// A fresh resource-layer object for `class_alias`.
    pub fn resource_model(class_alias: &str, args: Option<Value>) -> Result<ObjectHandle> {
        slot::current_or_fail()?.resource_model(class_alias, object_bag(args))
    }

    /// The cached resource-layer singleton for `class_alias`.
    pub fn resource_singleton(class_alias: &str, args: Option<Value>) -> Result<ObjectHandle> {
        slot::current_or_fail()?.resource_singleton(class_alias, object_bag(args))
    }

    /// A controller for `class_name` around a request/response pair.
    pub fn controller_instance(
        class_name: &str,
        request: ObjectHandle,
        response: ObjectHandle,
        invoke_args: Option<Value>,
    ) -> Result<ObjectHandle> {
        slot::current_or_fail()?.controller_instance(
            class_name,
            request,
            response,
            object_bag(invoke_args),
        )
    }

    /// Legacy block-singleton retrieval; prefer [`Bazaar::helper`].
    pub fn block_singleton(block_type: &str) -> Result<ObjectHandle> {
        slot::current_or_fail()?.block_singleton(block_type)
    }

    /// The helper object registered under `name`.
    pub fn helper(name: &str) -> Result<ObjectHandle> {
        slot::current_or_fail()?.helper(name)
    }

    /// The resource helper for `module`.
    pub fn resource_helper(module: &str) -> Result<ObjectHandle> {
        slot::current_or_fail()?.resource_helper(module)
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    /// Construct (without raising) a platform exception value. Defaults:
    /// [`Bazaar::EXCEPTION_MODULE`], empty message, code 0.
    pub fn exception(
        module: Option<&str>,
        message: Option<&str>,
        code: Option<i32>,
    ) -> Result<Error> {
        slot::current_or_fail()?.exception(
            module.unwrap_or(Self::EXCEPTION_MODULE),
            message.unwrap_or(""),
            code.unwrap_or(0),
        )
    }

    /// Raise a platform exception.
    pub fn throw_exception(message: &str, message_storage: Option<&str>) -> Result<()> {
        slot::current_or_fail()?.throw_exception(message, message_storage)
    }

    /// Record a caught error in the exception log.
    pub fn log_exception(error: &Error) -> Result<()> {
        slot::current_or_fail()?.log_exception(error)
    }

    /// Render a caught error for display; `None` extra becomes empty.
    pub fn print_exception(error: &Error, extra: Option<&str>) -> Result<()> {
        slot::current_or_fail()?.print_exception(error, extra.unwrap_or(""))
    }

    // ========================================================================
    // Application lifecycle
    // ========================================================================

    /// The initialized application object. Defaults: empty code,
    /// [`Bazaar::RUN_TYPE_STORE`], empty options.
    pub fn app(
        code: Option<&str>,
        run_type: Option<&str>,
        options: Option<Value>,
    ) -> Result<ObjectHandle> {
        slot::current_or_fail()?.app(
            code.unwrap_or(""),
            run_type.unwrap_or(Self::RUN_TYPE_STORE),
            object_bag(options),
        )
    }

    /// Initialize the application and return it; `None` modules becomes an
    /// empty list.
    pub fn init(
        code: Option<&str>,
        run_type: Option<&str>,
        options: Option<Value>,
        modules: Option<Value>,
    ) -> Result<ObjectHandle> {
        slot::current_or_fail()?.init(
            code.unwrap_or(""),
            run_type.unwrap_or(Self::RUN_TYPE_STORE),
            object_bag(options),
            array_bag(modules),
        )
    }

    /// Front-controller entry point.
    pub fn run(code: Option<&str>, run_type: Option<&str>, options: Option<Value>) -> Result<()> {
        slot::current_or_fail()?.run(
            code.unwrap_or(""),
            run_type.unwrap_or(Self::RUN_TYPE_STORE),
            object_bag(options),
        )
    }

    /// Whether the platform reports itself as installed.
    pub fn is_installed(options: Option<Value>) -> Result<bool> {
        slot::current_or_fail()?.is_installed(object_bag(options))
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Write to the platform log facility; `None` level and `None` file mean
    /// the platform defaults, applied by the backing instance.
    pub fn log(
        message: &str,
        level: Option<LogLevel>,
        file: Option<&str>,
        force_log: bool,
    ) -> Result<()> {
        slot::current_or_fail()?.log(message, level, file, force_log)
    }

    /// Enable or disable developer mode; returns the value set.
    pub fn set_developer_mode(enabled: bool) -> Result<bool> {
        slot::current_or_fail()?.set_developer_mode(enabled)
    }

    /// Whether developer mode is enabled.
    pub fn is_developer_mode() -> Result<bool> {
        slot::current_or_fail()?.is_developer_mode()
    }

    /// Mark the process as the standalone downloader application; `None`
    /// means `true`, the flag's historical default.
    pub fn set_is_downloader(flag: Option<bool>) -> Result<()> {
        slot::current_or_fail()?.set_is_downloader(flag.unwrap_or(true))
    }

    // ========================================================================
    // Downloader file-version probes
    // ========================================================================

    /// Version advertised by the file at `url`.
    pub fn file_version(url: &str) -> Result<String> {
        slot::current_or_fail()?.file_version(url)
    }

    /// Alternate-transport variant of [`Bazaar::file_version`].
    pub fn file_version_net3(url: &str) -> Result<String> {
        slot::current_or_fail()?.file_version_net3(url)
    }
}

/// An omitted associative argument bag: the empty JSON object.
fn object_bag(value: Option<Value>) -> Value {
    value.unwrap_or_else(|| Value::Object(serde_json::Map::new()))
}

/// An omitted list argument: the empty JSON array.
fn array_bag(value: Option<Value>) -> Value {
    value.unwrap_or_else(|| Value::Array(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Forwarding behavior is covered by the integration suite, which owns
    // the process-global slot. Only the pure helpers are tested here.

    #[test]
    fn test_object_bag_default_is_empty_object() {
        assert_eq!(object_bag(None), json!({}));
        assert_eq!(object_bag(Some(json!({"a": 1}))), json!({"a": 1}));
    }

    #[test]
    fn test_array_bag_default_is_empty_array() {
        assert_eq!(array_bag(None), json!([]));
        assert_eq!(array_bag(Some(json!(["Mod_A"]))), json!(["Mod_A"]));
    }

    #[test]
    fn test_default_constants_match_platform_values() {
        assert_eq!(Bazaar::DIR_BASE, "base");
        assert_eq!(Bazaar::URL_TYPE_LINK, "link");
        assert_eq!(Bazaar::RUN_TYPE_STORE, "store");
        assert_eq!(Bazaar::EXCEPTION_MODULE, "core");
    }
}
