//! Bazaar Shim - static-call redirection for the legacy storefront API
//!
//! The storefront platform is reached through globally accessible static
//! entry points. This crate reproduces that surface as the [`Bazaar`] facade
//! and routes every call to one process-wide, swappable backing instance,
//! so tests can substitute the whole platform behind unchanged call sites.
//! Install a [`Backend`] once during setup; everything after that forwards.

pub mod backend;
pub mod error;
pub mod facade;
pub mod types;

mod slot;

/// Ready-made backing instances for test suites: a recording mock with
/// working in-memory semantics, an explicit no-op instance, and an RAII
/// install guard.
pub mod test_support;

pub use backend::Backend;
pub use error::{Error, Result};
pub use facade::Bazaar;
pub use types::{
    callback, handle, Edition, Event, LogLevel, ObjectHandle, ObserverCallback, VersionInfo,
};
