use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

use crate::handler::SpatialDatabaseHandler;

/// A [`SpatialDatabaseHandler`] shared between threads.
///
/// Callers are serialized at the handler boundary: one thread at a time
/// holds the handler, and everything it does with it (including draining a
/// lazy iterator) happens under the lock.
#[derive(Clone)]
pub struct SharedSpatialDatabase {
    inner: Arc<Mutex<SpatialDatabaseHandler>>,
}

impl SharedSpatialDatabase {
    pub fn new(handler: SpatialDatabaseHandler) -> Self {
        SharedSpatialDatabase {
            inner: Arc::new(Mutex::new(handler)),
        }
    }

    /// Locks the handler until the guard is dropped.
    pub fn lock(&self) -> MutexGuard<'_, SpatialDatabaseHandler> {
        self.inner.lock()
    }

    /// Runs `f` with exclusive access to the handler.
    pub fn with_handler<R>(&self, f: impl FnOnce(&mut SpatialDatabaseHandler) -> R) -> R {
        let mut handler = self.inner.lock();
        f(&mut handler)
    }
}

impl From<SpatialDatabaseHandler> for SharedSpatialDatabase {
    fn from(handler: SpatialDatabaseHandler) -> Self {
        SharedSpatialDatabase::new(handler)
    }
}
