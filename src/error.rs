//! Error taxonomy for the shim and for backing instances.
//!
//! The facade owns exactly one failure: [`Error::NotInstalled`], raised when a
//! forward is attempted while no backing instance is installed. Every other
//! variant exists so that backing instances (stubs, mocks, fakes) share a
//! vocabulary with the platform they stand in for; the facade never constructs
//! or inspects them, it returns them unchanged.

use thiserror::Error as ThisError;

use crate::types::ParseEditionError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced through the facade.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Forwarding was attempted while the backing reference is unset.
    ///
    /// Only the facade raises this; a backing instance never does.
    #[error("no backing instance installed; call `Bazaar::install` before using the facade")]
    NotInstalled,

    /// The platform exception shape, as constructed by the `exception`
    /// operation and raised by `throw_exception`.
    #[error("`{module}`: {message} (code {code})")]
    Core {
        module: String,
        message: String,
        code: i32,
    },

    /// A registry key was registered twice without the graceful flag.
    #[error("registry key `{key}` already exists")]
    AlreadyRegistered { key: String },

    /// A keyed lookup (registry, object cache, file-version probe) missed.
    #[error("no value registered under key `{key}`")]
    NotFound { key: String },

    /// A factory retrieval could not resolve its class alias.
    #[error("cannot resolve class alias `{alias}`")]
    UnknownAlias { alias: String },

    /// An edition string did not name a known platform edition.
    #[error(transparent)]
    ParseEdition(#[from] ParseEditionError),

    /// Catch-all so substitutes can raise arbitrary errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Build the platform exception shape.
    pub fn core(module: impl Into<String>, message: impl Into<String>, code: i32) -> Self {
        Error::Core {
            module: module.into(),
            message: message.into(),
            code,
        }
    }

    /// Build a duplicate-registration error for `key`.
    pub fn already_registered(key: impl Into<String>) -> Self {
        Error::AlreadyRegistered { key: key.into() }
    }

    /// Build a keyed-lookup miss for `key`.
    pub fn not_found(key: impl Into<String>) -> Self {
        Error::NotFound { key: key.into() }
    }

    /// Build an alias-resolution failure for `alias`.
    pub fn unknown_alias(alias: impl Into<String>) -> Self {
        Error::UnknownAlias {
            alias: alias.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_installed_message_names_install() {
        let msg = Error::NotInstalled.to_string();
        assert!(msg.contains("no backing instance installed"));
        assert!(msg.contains("Bazaar::install"));
    }

    #[test]
    fn test_core_formatting() {
        let err = Error::core("checkout", "quote has expired", 42);
        assert_eq!(err.to_string(), "`checkout`: quote has expired (code 42)");
    }

    #[test]
    fn test_registry_errors_carry_key() {
        let dup = Error::already_registered("current_product");
        assert!(dup.to_string().contains("`current_product`"));

        let miss = Error::not_found("current_product");
        assert!(matches!(miss, Error::NotFound { ref key } if key == "current_product"));
    }

    #[test]
    fn test_anyhow_errors_pass_through_transparently() {
        let err: Error = anyhow::anyhow!("backend exploded").into();
        assert_eq!(err.to_string(), "backend exploded");
        assert!(matches!(err, Error::Other(_)));
    }
}
