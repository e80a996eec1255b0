// ── Reactive entity streams ──
//
// Read-side subscriptions for UI consumers. These observe a store's
// snapshots without touching the notification path.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Entity;
use crate::store::Snapshot;

pub use filter::{InvoiceFilter, OrderFilter, StaffFilter};

/// A subscription to one store's snapshots.
///
/// Provides point-in-time access and change notification via `changed()`
/// or by converting to a `Stream`.
pub struct EntityStream<T: Entity> {
    current: Arc<Snapshot<T>>,
    receiver: watch::Receiver<Arc<Snapshot<T>>>,
}

impl<T: Entity> EntityStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Snapshot<T>>>) -> Self {
        let current = Arc::clone(&receiver.borrow());
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<Snapshot<T>> {
        &self.current
    }

    /// The latest snapshot, which may be newer than `current()`.
    pub fn latest(&self) -> Arc<Snapshot<T>> {
        Arc::clone(&self.receiver.borrow())
    }

    /// Wait for the next snapshot. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Arc<Snapshot<T>>> {
        self.receiver.changed().await.ok()?;
        let snap = Arc::clone(&self.receiver.borrow_and_update());
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    pub fn into_stream(self) -> EntityWatchStream<T> {
        EntityWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding each new snapshot, starting with the current one.
pub struct EntityWatchStream<T: Entity> {
    inner: WatchStream<Arc<Snapshot<T>>>,
}

impl<T: Entity> Stream for EntityWatchStream<T> {
    type Item = Arc<Snapshot<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
