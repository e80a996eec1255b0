// ── Process-wide store set ──
//
// One `EntityStore` per collection, built once at startup and shared by
// every view. Owns the notification dispatcher the stores report to.

use std::sync::Arc;

use crate::config::{LiveMode, SyncConfig};
use crate::error::CoreError;
use crate::feed::{FeedSource, PollingSource, ScriptedSource, WebSocketSource};
use crate::model::{Collection, Invoice, Order, ScanEvent, Staff, Table};
use crate::notify::{AudioPlayer, NotificationDispatcher, PlatformNotifier, Silent, ToastSurface};
use crate::store::{EntityStore, ReconnectPolicy, StoreWiring, SyncedCollection};

/// Notification surfaces supplied by the embedding application.
#[derive(Clone)]
pub struct Surfaces {
    pub audio: Arc<dyn AudioPlayer>,
    pub toasts: Arc<dyn ToastSurface>,
    pub platform: Arc<dyn PlatformNotifier>,
}

impl Default for Surfaces {
    fn default() -> Self {
        Self {
            audio: Arc::new(Silent),
            toasts: Arc::new(Silent),
            platform: Arc::new(Silent),
        }
    }
}

pub struct Hub {
    orders: EntityStore<Order>,
    tables: EntityStore<Table>,
    invoices: EntityStore<Invoice>,
    scans: EntityStore<ScanEvent>,
    staff: EntityStore<Staff>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl Hub {
    pub fn new(wiring: &StoreWiring) -> Self {
        Self {
            orders: EntityStore::new(wiring),
            tables: EntityStore::new(wiring),
            invoices: EntityStore::new(wiring),
            scans: EntityStore::new(wiring),
            staff: EntityStore::new(wiring),
            dispatcher: Arc::clone(&wiring.dispatcher),
        }
    }

    /// Build stores against the remote store described by `config`.
    pub fn connect(config: &SyncConfig, surfaces: Surfaces) -> Result<Self, CoreError> {
        let client = config.client()?;
        let source: Arc<dyn FeedSource> = match config.live_mode {
            LiveMode::WebSocket => Arc::new(WebSocketSource::new(client.clone())),
            LiveMode::Polling { interval } => Arc::new(PollingSource::new(client.clone(), interval)),
        };
        let dispatcher = NotificationDispatcher::new(
            surfaces.audio,
            surfaces.toasts,
            surfaces.platform,
            config.notifications.clone(),
        );
        Ok(Self::new(&StoreWiring {
            source,
            writer: Arc::new(client),
            dispatcher: Arc::new(dispatcher),
            reconnect: config.reconnect.clone(),
            runtime: StoreWiring::current_runtime()?,
        }))
    }

    /// Build stores over an in-process scripted source.
    pub fn scripted(source: ScriptedSource, dispatcher: Arc<NotificationDispatcher>) -> Result<Self, CoreError> {
        Ok(Self::new(&StoreWiring {
            source: Arc::new(source.clone()),
            writer: Arc::new(source),
            dispatcher,
            reconnect: ReconnectPolicy::default(),
            runtime: StoreWiring::current_runtime()?,
        }))
    }

    pub fn orders(&self) -> &EntityStore<Order> {
        &self.orders
    }

    pub fn tables(&self) -> &EntityStore<Table> {
        &self.tables
    }

    pub fn invoices(&self) -> &EntityStore<Invoice> {
        &self.invoices
    }

    pub fn scans(&self) -> &EntityStore<ScanEvent> {
        &self.scans
    }

    pub fn staff(&self) -> &EntityStore<Staff> {
        &self.staff
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    pub fn store(&self, collection: Collection) -> &dyn SyncedCollection {
        match collection {
            Collection::Orders => &self.orders,
            Collection::Tables => &self.tables,
            Collection::Invoices => &self.invoices,
            Collection::Scans => &self.scans,
            Collection::Staff => &self.staff,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[tokio::test]
    async fn store_lookup_matches_collection() {
        let hub = Hub::scripted(ScriptedSource::new(), Arc::new(NotificationDispatcher::silent())).unwrap();
        for collection in Collection::iter() {
            assert_eq!(hub.store(collection).collection(), collection);
            assert_eq!(hub.store(collection).ref_count(), 0);
        }
    }

    #[test]
    fn building_outside_a_runtime_is_an_error() {
        let result = Hub::scripted(ScriptedSource::new(), Arc::new(NotificationDispatcher::silent()));
        assert!(matches!(result, Err(CoreError::NoRuntime)));
    }

    #[test]
    fn subscribe_from_a_plain_thread_uses_the_wiring_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let source = ScriptedSource::new();
        let hub = runtime
            .block_on(async { Hub::scripted(source.clone(), Arc::new(NotificationDispatcher::silent())) })
            .unwrap();

        // No runtime is entered on this thread.
        let mut sub = hub.store(Collection::Orders).subscribe();
        runtime.block_on(async {
            tokio::time::timeout(std::time::Duration::from_secs(2), hub.orders().wait_primed())
                .await
                .unwrap();
        });
        assert!(hub.orders().is_primed());
        sub.unsubscribe();
        assert_eq!(source.active(Collection::Orders), 0);
    }

    #[tokio::test]
    async fn connect_builds_without_network() {
        let config = SyncConfig::new("https://store.example.com".parse().unwrap(), "harbor");
        let hub = Hub::connect(&config, Surfaces::default()).unwrap();
        assert!(!hub.orders().is_primed());
        assert!(hub.orders().all().is_empty());
    }
}
