// ── Entity stores ──
//
// One `EntityStore` per collection owns the canonical id → entity map, the
// reference-counted live binding, and the primed flag. Reads go through
// `watch` snapshots so a reader never sees a half-applied event.

mod entity_store;
mod reconnect;
mod snapshot;

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::error::CoreError;
use crate::feed::FeedSource;
use crate::model::Collection;
use crate::notify::NotificationDispatcher;
use crate::write::RemoteWriter;

pub use entity_store::EntityStore;
pub use reconnect::ReconnectPolicy;
pub use snapshot::Snapshot;

/// Shared collaborators every store in a hub is built from.
#[derive(Clone)]
pub struct StoreWiring {
    pub source: Arc<dyn FeedSource>,
    pub writer: Arc<dyn RemoteWriter>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub reconnect: ReconnectPolicy,
    /// Where feed consumers run.
    pub runtime: Handle,
}

impl StoreWiring {
    /// The runtime the caller is on, for wiring built inside one.
    pub fn current_runtime() -> Result<Handle, CoreError> {
        Handle::try_current().map_err(|_| CoreError::NoRuntime)
    }
}

/// Object-safe view of a store for code that handles collections
/// generically. `subscribe` spawns onto the wiring's runtime, so it needs
/// no ambient runtime of its own.
pub trait SyncedCollection: Send + Sync {
    fn collection(&self) -> Collection;

    fn subscribe(&self) -> Unsubscribe;

    fn ref_count(&self) -> usize;

    fn is_primed(&self) -> bool;
}

/// Releases one subscription. Calling it again, or dropping it after a
/// call, does nothing.
#[must_use = "dropping an Unsubscribe releases the subscription immediately"]
pub struct Unsubscribe {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Unsubscribe {
    pub(crate) fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("released", &self.is_released())
            .finish()
    }
}
