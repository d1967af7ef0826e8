//! Vocabulary types shared by the contract, the facade, and backing instances.
//!
//! Argument bags (constructor arguments, event data, options, URL params) are
//! [`serde_json::Value`], matching the loosely shaped arrays of the legacy
//! surface. Object-valued results travel as [`ObjectHandle`] so that identity
//! (pointer equality) stays observable; that is how cached-singleton retrieval
//! is distinguished from fresh construction.

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error as ThisError;

use crate::error::Result;

/// Polymorphic handle returned by every object-retrieval operation.
///
/// Downcast with `Arc::downcast` to get the concrete object back out.
pub type ObjectHandle = Arc<dyn Any + Send + Sync>;

/// Wrap a concrete value as an [`ObjectHandle`].
pub fn handle<T: Any + Send + Sync>(value: T) -> ObjectHandle {
    Arc::new(value)
}

/// Callback invoked by the backing instance when a dispatched event matches a
/// registered observer. Errors raised here propagate out of dispatch unchanged.
pub type ObserverCallback = Arc<dyn Fn(&Event) -> Result<()> + Send + Sync>;

/// Wrap a closure as an [`ObserverCallback`].
pub fn callback<F>(f: F) -> ObserverCallback
where
    F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A dispatched event as seen by an observer callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The name the event was dispatched under.
    pub name: String,

    /// The data bag passed to dispatch.
    pub data: Value,
}

impl Event {
    /// Create an event payload.
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Event {
            name: name.into(),
            data,
        }
    }
}

/// Structured platform version record.
///
/// Parts are strings; an empty string means the part is absent. `Display`
/// composes the user-facing version the way the platform does: dotted numeric
/// parts, the patch only when present, then `-{stability}{number}`, with any
/// dangling `.`/`-` trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub major: String,
    pub minor: String,
    pub revision: String,
    pub patch: String,
    pub stability: String,
    pub number: String,
}

impl VersionInfo {
    /// Create a numeric-part version record (no stability suffix).
    pub fn new(
        major: impl Into<String>,
        minor: impl Into<String>,
        revision: impl Into<String>,
        patch: impl Into<String>,
    ) -> Self {
        VersionInfo {
            major: major.into(),
            minor: minor.into(),
            revision: revision.into(),
            patch: patch.into(),
            stability: String::new(),
            number: String::new(),
        }
    }

    /// Attach a stability suffix (e.g. `beta`, `1` → `-beta1`).
    pub fn with_stability(mut self, stability: impl Into<String>, number: impl Into<String>) -> Self {
        self.stability = stability.into();
        self.number = number.into();
        self
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut composed = format!("{}.{}.{}", self.major, self.minor, self.revision);
        if !self.patch.is_empty() {
            composed.push('.');
            composed.push_str(&self.patch);
        }
        composed.push('-');
        composed.push_str(&self.stability);
        composed.push_str(&self.number);
        write!(f, "{}", composed.trim_matches(|c| c == '.' || c == '-'))
    }
}

/// Platform edition.
///
/// `as_str` yields the exact strings the legacy surface exposes as constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edition {
    Community,
    Enterprise,
    Professional,
    Go,
}

impl Edition {
    /// The edition's canonical string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Edition::Community => "Community",
            Edition::Enterprise => "Enterprise",
            Edition::Professional => "Professional",
            Edition::Go => "Go",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string that does not name a known platform edition.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("unknown edition `{0}`")]
pub struct ParseEditionError(pub String);

impl FromStr for Edition {
    type Err = ParseEditionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Community" => Ok(Edition::Community),
            "Enterprise" => Ok(Edition::Enterprise),
            "Professional" => Ok(Edition::Professional),
            "Go" => Ok(Edition::Go),
            other => Err(ParseEditionError(other.to_string())),
        }
    }
}

/// Severity accepted by the platform log facility.
///
/// Priorities follow the syslog numbering the platform inherited: lower is
/// more severe. `Default` is [`LogLevel::Debug`], the level the platform
/// substitutes when a caller passes none.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum LogLevel {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    #[default]
    Debug = 7,
}

impl LogLevel {
    /// Numeric syslog priority of this level.
    pub fn priority(&self) -> u8 {
        *self as u8
    }

    /// Look up a level from its numeric priority.
    pub fn from_priority(priority: u8) -> Option<Self> {
        match priority {
            0 => Some(LogLevel::Emergency),
            1 => Some(LogLevel::Alert),
            2 => Some(LogLevel::Critical),
            3 => Some(LogLevel::Error),
            4 => Some(LogLevel::Warning),
            5 => Some(LogLevel::Notice),
            6 => Some(LogLevel::Info),
            7 => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Uppercase label used in rendered log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Emergency => "EMERG",
            LogLevel::Alert => "ALERT",
            LogLevel::Critical => "CRIT",
            LogLevel::Error => "ERR",
            LogLevel::Warning => "WARN",
            LogLevel::Notice => "NOTICE",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version_display_full() {
        let v = VersionInfo::new("1", "9", "4", "5").with_stability("beta", "1");
        assert_eq!(v.to_string(), "1.9.4.5-beta1");
    }

    #[test]
    fn test_version_display_skips_empty_patch_and_stability() {
        let v = VersionInfo::new("2", "0", "1", "");
        assert_eq!(v.to_string(), "2.0.1");

        let v = VersionInfo::new("1", "9", "4", "5");
        assert_eq!(v.to_string(), "1.9.4.5");
    }

    #[test]
    fn test_version_display_empty_record() {
        assert_eq!(VersionInfo::default().to_string(), "");
    }

    #[test]
    fn test_edition_round_trip() {
        for edition in [
            Edition::Community,
            Edition::Enterprise,
            Edition::Professional,
            Edition::Go,
        ] {
            assert_eq!(edition.as_str().parse::<Edition>().unwrap(), edition);
        }
    }

    #[test]
    fn test_edition_parse_rejects_unknown() {
        let err = "Galactic".parse::<Edition>().unwrap_err();
        assert_eq!(err.to_string(), "unknown edition `Galactic`");
    }

    #[test]
    fn test_log_level_priorities() {
        assert_eq!(LogLevel::Emergency.priority(), 0);
        assert_eq!(LogLevel::Debug.priority(), 7);
        assert_eq!(LogLevel::from_priority(4), Some(LogLevel::Warning));
        assert_eq!(LogLevel::from_priority(8), None);
        // Lower priority is more severe.
        assert!(LogLevel::Critical < LogLevel::Notice);
    }

    #[test]
    fn test_log_level_default_is_debug() {
        assert_eq!(LogLevel::default(), LogLevel::Debug);
    }

    #[test]
    fn test_handle_downcasts_to_concrete_type() {
        let obj = handle(vec![1u32, 2, 3]);
        let back = obj.downcast::<Vec<u32>>().unwrap();
        assert_eq!(*back, vec![1, 2, 3]);
    }

    #[test]
    fn test_event_payload() {
        let event = Event::new("sales_order_place_after", json!({"order_id": 7}));
        assert_eq!(event.name, "sales_order_place_after");
        assert_eq!(event.data["order_id"], 7);
    }
}
