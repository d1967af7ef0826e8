//! Process-wide storage for the installed backing instance.
//!
//! There is exactly one slot per process. Installing stores an
//! `Arc<dyn Backend>` and replaces whatever was there before; the last
//! install wins. Forwarded calls clone the `Arc` out and release the lock
//! before invoking the backing method, so a backing implementation is free
//! to call back into the facade without deadlocking.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::backend::Backend;
use crate::error::{Error, Result};

/// The one backing reference for this process.
static SLOT: RwLock<Option<Arc<dyn Backend>>> = RwLock::new(None);

/// Install `backend`, replacing any previously installed instance.
pub(crate) fn install(backend: Arc<dyn Backend>) {
    let mut slot = write_slot();
    let replaced = slot.is_some();
    *slot = Some(backend);
    debug!(replaced, "installed backing instance");
}

/// The currently installed backing instance, if any.
pub(crate) fn current() -> Option<Arc<dyn Backend>> {
    // Clone the Arc and drop the guard before the caller does anything
    // with it; the lock is never held across a backing call.
    read_slot().clone()
}

/// The currently installed backing instance, or [`Error::NotInstalled`].
pub(crate) fn current_or_fail() -> Result<Arc<dyn Backend>> {
    current().ok_or(Error::NotInstalled)
}

// The slot only ever holds an `Option<Arc>`, so data behind a poisoned lock
// is still coherent; a test that panicked elsewhere must not wedge every
// later facade call in the process.

fn read_slot() -> RwLockReadGuard<'static, Option<Arc<dyn Backend>>> {
    match SLOT.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_slot() -> RwLockWriteGuard<'static, Option<Arc<dyn Backend>>> {
    match SLOT.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
