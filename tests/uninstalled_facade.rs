//! Facade behavior before any backing instance is installed.
//!
//! This lives in its own test binary: the backing reference is
//! process-global, and the other suites install into it. Everything here
//! runs as one test so the pre-install assertions cannot race an install.

use std::sync::Arc;

use serde_json::json;

use bazaar_shim::test_support::{InstallGuard, NoopBackend};
use bazaar_shim::{Bazaar, Error};

#[test]
fn test_every_entry_point_fails_until_an_instance_is_installed() {
    assert!(Bazaar::current().is_none());

    // A spread of entry points across the surface, all the same refusal.
    let err = Bazaar::edition().unwrap_err();
    assert!(matches!(err, Error::NotInstalled));
    assert!(err.to_string().contains("no backing instance installed"));

    assert!(matches!(
        Bazaar::version().unwrap_err(),
        Error::NotInstalled
    ));
    assert!(matches!(
        Bazaar::registry("any").unwrap_err(),
        Error::NotInstalled
    ));
    assert!(matches!(
        Bazaar::model("sales/order", Some(json!({"id": 1}))).unwrap_err(),
        Error::NotInstalled
    ));
    assert!(matches!(
        Bazaar::dispatch_event("order_placed", None).unwrap_err(),
        Error::NotInstalled
    ));
    assert!(matches!(
        Bazaar::log("lost", None, None, false).unwrap_err(),
        Error::NotInstalled
    ));

    // A guard created before any install restores by installing the
    // explicit empty instance; there is no way back to the bare state.
    {
        let _guard = InstallGuard::install(Arc::new(NoopBackend));
        assert!(Bazaar::current().is_some());
    }
    assert!(Bazaar::current().is_some());
    assert_eq!(Bazaar::version().unwrap(), "");
    assert_eq!(Bazaar::registry("any").unwrap(), serde_json::Value::Null);
    assert!(!Bazaar::is_installed(None).unwrap());
}
