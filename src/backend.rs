//! The capability set a backing instance must satisfy.
//!
//! [`Backend`] names every operation the legacy static surface can forward.
//! It declares shape only: no method here performs I/O or carries platform
//! behavior, and the crate ships no production implementation. Test code
//! supplies a conforming object: a hand-written stub, or the ready-made
//! doubles in [`crate::test_support`].
//!
//! There are deliberately no default method bodies. A type that implements
//! only part of the surface cannot be installed; the compiler rejects it,
//! which is this crate's install-time contract check.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{Edition, LogLevel, ObjectHandle, ObserverCallback, VersionInfo};

/// Everything the facade can forward, in one contract.
///
/// The breadth is inherited from the legacy surface and is the point: a single
/// substitute object stands in for the whole platform. Methods are grouped
/// below by category purely for readability.
///
/// Every method may fail, matching the original surface where any forwarded
/// call could throw. Implementations decide all semantics, in particular the
/// duplicate-key behavior behind `register`'s graceful flag and whether an
/// observer's `event_name` is an exact name or a pattern.
pub trait Backend: Send + Sync {
    // ========================================================================
    // Identity / version
    // ========================================================================

    /// The platform version string, e.g. `1.9.4.5`.
    fn version(&self) -> Result<String>;

    /// The structured version record behind [`Backend::version`].
    fn version_info(&self) -> Result<VersionInfo>;

    /// The platform edition.
    fn edition(&self) -> Result<Edition>;

    /// Return all backing static data to its defaults.
    fn reset(&self) -> Result<()>;

    // ========================================================================
    // Key-value registry
    // ========================================================================

    /// Register `value` under `key`.
    ///
    /// What happens when `key` already exists is governed by `graceful` and
    /// owned entirely by the implementation; the conventional platform
    /// behavior is to raise [`Error::AlreadyRegistered`] unless `graceful`
    /// is set.
    fn register(&self, key: &str, value: Value, graceful: bool) -> Result<()>;

    /// Remove the value registered under `key`.
    fn unregister(&self, key: &str) -> Result<()>;

    /// Look up the value registered under `key`.
    fn registry(&self, key: &str) -> Result<Value>;

    // ========================================================================
    // Root / path resolution
    // ========================================================================

    /// Set the application root. `None` asks the platform to locate its own.
    fn set_root(&self, app_root: Option<&Path>) -> Result<()>;

    /// The application root directory.
    fn root(&self) -> Result<PathBuf>;

    /// Resolve a directory by kind (`base`, `app`, `etc`, `var`, ...).
    fn base_dir(&self, kind: &str) -> Result<PathBuf>;

    /// Resolve a module-relative directory by kind.
    fn module_dir(&self, kind: &str, module: &str) -> Result<PathBuf>;

    /// Resolve the URL of a system folder near the running script.
    ///
    /// `exit_if_missing` mirrors the legacy strict flag; its exact meaning
    /// belongs to the implementation.
    fn script_system_url(&self, folder: &str, exit_if_missing: bool) -> Result<String>;

    // ========================================================================
    // Core object accessors
    // ========================================================================

    /// The event collection object.
    fn events(&self) -> Result<ObjectHandle>;

    /// The object cache, or the single cached object under `key`.
    fn objects(&self, key: Option<&str>) -> Result<ObjectHandle>;

    /// The design package singleton.
    fn design(&self) -> Result<ObjectHandle>;

    /// The configuration model instance.
    fn config(&self) -> Result<ObjectHandle>;

    // ========================================================================
    // Configuration lookup
    // ========================================================================

    /// Read a config value at `path` for the given store scope.
    ///
    /// `None` means the current/default scope.
    fn store_config(&self, path: &str, store: Option<&str>) -> Result<Value>;

    /// Read a config value at `path` as a boolean flag.
    fn store_config_flag(&self, path: &str, store: Option<&str>) -> Result<bool>;

    // ========================================================================
    // URL generation
    // ========================================================================

    /// Base URL for `url_type` (`link`, `media`, ...); `None` lets the
    /// platform pick the scheme.
    fn base_url(&self, url_type: &str, secure: Option<bool>) -> Result<String>;

    /// Build a URL from a route and a parameter bag.
    fn url(&self, route: &str, params: Value) -> Result<String>;

    // ========================================================================
    // Events / observers
    // ========================================================================

    /// Register an observer.
    ///
    /// `event_name` may be an exact event name or a pattern; whether and how
    /// patterns match is the implementation's call, never the facade's.
    fn add_observer(
        &self,
        event_name: &str,
        callback: ObserverCallback,
        data: Value,
        observer_name: &str,
        observer_class: &str,
    ) -> Result<()>;

    /// Dispatch `name` with `data` to every matching observer.
    fn dispatch_event(&self, name: &str, data: Value) -> Result<()>;

    // ========================================================================
    // Object / factory retrieval
    // ========================================================================
    //
    // Four retrieval semantics that must not be conflated: fresh construction
    // (`model`, `resource_model`), cached singletons (`singleton`,
    // `resource_singleton`), resource-layer objects, and helpers.

    /// Construct a fresh model instance for `class_alias`.
    fn model(&self, class_alias: &str, args: Value) -> Result<ObjectHandle>;

    /// The cached singleton for `class_alias`; repeat calls return the same
    /// handle.
    fn singleton(&self, class_alias: &str, args: Value) -> Result<ObjectHandle>;

    /// Construct a fresh resource-layer object for `class_alias`.
    fn resource_model(&self, class_alias: &str, args: Value) -> Result<ObjectHandle>;

    /// The cached resource-layer singleton for `class_alias`.
    fn resource_singleton(&self, class_alias: &str, args: Value) -> Result<ObjectHandle>;

    /// Construct a controller for `class_name` around a request/response pair.
    fn controller_instance(
        &self,
        class_name: &str,
        request: ObjectHandle,
        response: ObjectHandle,
        invoke_args: Value,
    ) -> Result<ObjectHandle>;

    /// Legacy block-singleton retrieval, retained for older call sites;
    /// prefer [`Backend::helper`].
    fn block_singleton(&self, block_type: &str) -> Result<ObjectHandle>;

    /// The helper object registered under `name`.
    fn helper(&self, name: &str) -> Result<ObjectHandle>;

    /// The resource helper for `module`.
    fn resource_helper(&self, module: &str) -> Result<ObjectHandle>;

    // ========================================================================
    // Exceptions
    // ========================================================================

    /// Construct (without raising) a platform exception value.
    fn exception(&self, module: &str, message: &str, code: i32) -> Result<Error>;

    /// Raise a platform exception, optionally noting a message-storage target.
    ///
    /// Platform convention is that this always returns `Err`; the shim does
    /// not enforce it.
    fn throw_exception(&self, message: &str, message_storage: Option<&str>) -> Result<()>;

    /// Record a caught error in the exception log.
    fn log_exception(&self, error: &Error) -> Result<()>;

    /// Render a caught error for display, with optional extra context.
    fn print_exception(&self, error: &Error, extra: &str) -> Result<()>;

    // ========================================================================
    // Application lifecycle
    // ========================================================================

    /// The initialized application object for a deployment code.
    fn app(&self, code: &str, run_type: &str, options: Value) -> Result<ObjectHandle>;

    /// Initialize the application and return it.
    fn init(&self, code: &str, run_type: &str, options: Value, modules: Value)
        -> Result<ObjectHandle>;

    /// Front-controller entry point.
    fn run(&self, code: &str, run_type: &str, options: Value) -> Result<()>;

    /// Whether the platform reports itself as installed.
    fn is_installed(&self, options: Value) -> Result<bool>;

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Write to the platform log facility.
    ///
    /// `None` level and `None` file mean the platform defaults (debug
    /// severity, the main system log), applied by the implementation.
    fn log(
        &self,
        message: &str,
        level: Option<LogLevel>,
        file: Option<&str>,
        force_log: bool,
    ) -> Result<()>;

    /// Enable or disable developer mode; returns the value set.
    fn set_developer_mode(&self, enabled: bool) -> Result<bool>;

    /// Whether developer mode is enabled.
    fn is_developer_mode(&self) -> Result<bool>;

    /// Mark the process as the standalone downloader application.
    fn set_is_downloader(&self, flag: bool) -> Result<()>;

    // ========================================================================
    // Downloader file-version probes
    // ========================================================================

    /// Version advertised by the file at `url`.
    fn file_version(&self, url: &str) -> Result<String>;

    /// Alternate-transport variant of [`Backend::file_version`].
    fn file_version_net3(&self, url: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn assert_send_sync<T: Send + Sync + ?Sized>() {}

    #[test]
    fn test_backend_objects_are_shareable() {
        // The slot stores Arc<dyn Backend> and hands clones to any thread.
        assert_send_sync::<Arc<dyn Backend>>();
        assert_send_sync::<dyn Backend>();
    }
}
