use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use passline_api::{ChangeKind, RawDocument};

use super::{ReconnectPolicy, Snapshot, StoreWiring, SyncedCollection, Unsubscribe};
use crate::detect::{Transition, detect};
use crate::error::CoreError;
use crate::feed::{ChangeFeed, ChangeRecord, CollectionQuery, FeedEvents, FeedSource, SnapshotEvent};
use crate::model::{Collection, Entity, EntityId};
use crate::notify::NotificationDispatcher;
use crate::stream::EntityStream;
use crate::write::RemoteWriter;

const TRANSITION_CHANNEL_CAPACITY: usize = 64;

/// Canonical in-memory state for one collection.
///
/// Cheap to clone; clones share state. The first `subscribe` opens a live
/// query and spawns the task that consumes it on the wiring's runtime, so
/// it may be called from any thread. Later subscribers share that query
/// until the last handle is released.
pub struct EntityStore<T: Entity> {
    inner: Arc<StoreInner<T>>,
}

impl<T: Entity> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StoreInner<T: Entity> {
    query: CollectionQuery,
    source: Arc<dyn FeedSource>,
    writer: Arc<dyn RemoteWriter>,
    dispatcher: Arc<NotificationDispatcher>,
    reconnect: ReconnectPolicy,
    runtime: Handle,
    snapshot: watch::Sender<Arc<Snapshot<T>>>,
    primed: watch::Sender<bool>,
    transitions: broadcast::Sender<Arc<Transition<T>>>,
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    refs: usize,
    binding: Option<Binding>,
    /// Ids present only through a local create, not yet seen on the feed.
    unconfirmed: HashSet<EntityId>,
}

/// The live query behind an active subscription.
struct Binding {
    cancel: CancellationToken,
    feed: Option<ChangeFeed>,
}

impl<T: Entity> EntityStore<T> {
    pub fn new(wiring: &StoreWiring) -> Self {
        Self::with_query(wiring, T::COLLECTION.default_query())
    }

    pub fn with_query(wiring: &StoreWiring, query: CollectionQuery) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::default()));
        let (primed, _) = watch::channel(false);
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                query,
                source: Arc::clone(&wiring.source),
                writer: Arc::clone(&wiring.writer),
                dispatcher: Arc::clone(&wiring.dispatcher),
                reconnect: wiring.reconnect.clone(),
                runtime: wiring.runtime.clone(),
                snapshot,
                primed,
                transitions,
                state: Mutex::new(StoreState::default()),
            }),
        }
    }

    // ── Subscription ─────────────────────────────────────────────────

    pub fn subscribe(&self) -> Unsubscribe {
        {
            let mut state = self.inner.lock_state();
            state.refs += 1;
            if state.refs == 1 {
                StoreInner::bind(&self.inner, &mut state);
                info!(collection = %T::COLLECTION, "subscribed; live query opened");
            } else {
                debug!(collection = %T::COLLECTION, refs = state.refs, "joined existing subscription");
            }
        }
        let inner = Arc::clone(&self.inner);
        Unsubscribe::new(move || inner.release())
    }

    pub fn ref_count(&self) -> usize {
        self.inner.lock_state().refs
    }

    pub fn is_primed(&self) -> bool {
        *self.inner.primed.borrow()
    }

    /// Resolves once the active subscription has materialized its first
    /// snapshot.
    pub async fn wait_primed(&self) {
        let mut rx = self.inner.primed.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|primed| *primed).await;
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Every entity, in the feed's declared order.
    pub fn all(&self) -> Vec<Arc<T>> {
        self.inner.snapshot.borrow().to_vec()
    }

    pub fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.inner.snapshot.borrow().get(id).cloned()
    }

    pub fn snapshot(&self) -> Arc<Snapshot<T>> {
        Arc::clone(&self.inner.snapshot.borrow())
    }

    pub fn stream(&self) -> EntityStream<T> {
        EntityStream::new(self.inner.snapshot.subscribe())
    }

    /// Transitions emitted after priming, in order.
    pub fn transitions(&self) -> broadcast::Receiver<Arc<Transition<T>>> {
        self.inner.transitions.subscribe()
    }

    pub fn query(&self) -> &CollectionQuery {
        &self.inner.query
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Create a document remotely, then insert it locally under the id the
    /// store assigned. The next feed event reconciles any divergence, and
    /// its `added` record still announces the creation.
    pub async fn create(&self, fields: Map<String, Value>) -> Result<EntityId, CoreError> {
        let id = self.inner.writer.create(T::COLLECTION, fields.clone()).await?;
        match T::from_document(&RawDocument::new(id.as_str(), fields)) {
            Ok(entity) => self.inner.write_local(|snap, state| {
                // The feed may already have delivered it.
                if snap.contains(&id) {
                    return None;
                }
                state.unconfirmed.insert(id.clone());
                Some(snap.with_upsert(entity))
            }),
            Err(e) => debug!(error = %e, "created document not decodable locally; awaiting feed"),
        }
        Ok(id)
    }

    /// Remove a document locally, then delete it remotely. If the remote
    /// delete fails the next feed event restores it.
    pub async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        self.inner.write_local(|snap, state| {
            state.unconfirmed.remove(id);
            snap.without(id)
        });
        self.inner.writer.delete(T::COLLECTION, id).await
    }
}

impl<T: Entity> SyncedCollection for EntityStore<T> {
    fn collection(&self) -> Collection {
        T::COLLECTION
    }

    fn subscribe(&self) -> Unsubscribe {
        EntityStore::subscribe(self)
    }

    fn ref_count(&self) -> usize {
        EntityStore::ref_count(self)
    }

    fn is_primed(&self) -> bool {
        EntityStore::is_primed(self)
    }
}

impl<T: Entity> StoreInner<T> {
    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a fresh feed for a new subscription and start consuming it.
    fn bind(this: &Arc<Self>, state: &mut StoreState) {
        this.primed.send_replace(false);
        let cancel = CancellationToken::new();
        let feed = ChangeFeed::new(Arc::clone(&this.source));
        let events = open_or_fail(&feed, &this.query);
        state.binding = Some(Binding {
            cancel: cancel.clone(),
            feed: Some(feed),
        });
        this.runtime.spawn(consume(Arc::clone(this), cancel, events));
    }

    fn release(&self) {
        let feed = {
            let mut state = self.lock_state();
            state.refs = state.refs.saturating_sub(1);
            if state.refs > 0 {
                debug!(collection = %T::COLLECTION, refs = state.refs, "left shared subscription");
                return;
            }
            let Some(binding) = state.binding.take() else {
                return;
            };
            binding.cancel.cancel();
            binding.feed
        };
        if let Some(feed) = feed {
            feed.close();
        }
        info!(collection = %T::COLLECTION, "last subscriber left; live query released");
    }

    /// Replace a failed feed. Returns `None` once the binding was torn down.
    fn reopen(&self, cancel: &CancellationToken) -> Option<FeedEvents> {
        let mut state = self.lock_state();
        if cancel.is_cancelled() {
            return None;
        }
        let binding = state.binding.as_mut()?;
        if let Some(dead) = binding.feed.take() {
            dead.close();
        }
        let feed = ChangeFeed::new(Arc::clone(&self.source));
        let events = open_or_fail(&feed, &self.query);
        binding.feed = Some(feed);
        Some(events)
    }

    /// Materialize one event, classify it, publish the snapshot, and
    /// dispatch side effects. Runs under the state lock so teardown cannot
    /// interleave with a half-dispatched event.
    fn apply(&self, cancel: &CancellationToken, event: &SnapshotEvent, resumed: bool) {
        let mut state = self.lock_state();
        if cancel.is_cancelled() {
            return;
        }

        let previous = Arc::clone(&self.snapshot.borrow());
        let current = previous.materialize(event);
        let primed = *self.primed.borrow();

        let resume_changes;
        let changes = if resumed {
            resume_changes = membership_changes(&previous, &current, &state.unconfirmed);
            &resume_changes
        } else {
            &event.changes
        };
        let transitions = detect(primed, &previous, &current, changes, &state.unconfirmed);
        // Every event carries the full result set, so local inserts are now
        // either confirmed or gone.
        state.unconfirmed.clear();

        debug!(
            collection = %T::COLLECTION,
            version = current.version(),
            documents = current.len(),
            changes = changes.len(),
            transitions = transitions.len(),
            resumed,
            "applied snapshot"
        );

        self.snapshot.send_replace(Arc::new(current));
        if !primed {
            self.primed.send_replace(true);
            debug!(collection = %T::COLLECTION, "store primed");
        }

        for transition in transitions {
            let transition = Arc::new(transition);
            let dispatched = panic::catch_unwind(AssertUnwindSafe(|| self.dispatcher.dispatch(&transition)));
            if let Err(payload) = dispatched {
                error!(
                    collection = %T::COLLECTION,
                    id = %transition.entity_id,
                    reason = panic_message(&*payload),
                    "notification dispatch panicked; feed continues"
                );
            }
            let _ = self.transitions.send(transition);
        }
    }

    /// Local write from the optimistic create/delete path.
    fn write_local(&self, update: impl FnOnce(&Snapshot<T>, &mut StoreState) -> Option<Snapshot<T>>) {
        let mut state = self.lock_state();
        let next = update(&self.snapshot.borrow(), &mut state);
        if let Some(next) = next {
            self.snapshot.send_replace(Arc::new(next));
        }
    }
}

fn open_or_fail(feed: &ChangeFeed, query: &CollectionQuery) -> FeedEvents {
    match feed.open(query) {
        Ok(events) => events,
        Err(e) => futures_util::stream::iter([Err(e)]).boxed(),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Change records from comparing two snapshots' membership. Every id
/// present now is reported so the detector compares statuses itself; ids
/// known only from a local write count as added.
fn membership_changes<T: Entity>(
    previous: &Snapshot<T>,
    current: &Snapshot<T>,
    unconfirmed: &HashSet<EntityId>,
) -> Vec<ChangeRecord> {
    let mut changes: Vec<ChangeRecord> = current
        .iter()
        .map(|entity| {
            let kind = if previous.contains(entity.id()) && !unconfirmed.contains(entity.id()) {
                ChangeKind::Modified
            } else {
                ChangeKind::Added
            };
            ChangeRecord::new(entity.id().clone(), kind)
        })
        .collect();
    changes.extend(
        previous
            .iter()
            .filter(|entity| !current.contains(entity.id()))
            .map(|entity| ChangeRecord::new(entity.id().clone(), ChangeKind::Removed)),
    );
    changes
}

/// Consume one binding's feed until teardown, reopening after failures.
async fn consume<T: Entity>(inner: Arc<StoreInner<T>>, cancel: CancellationToken, mut events: FeedEvents) {
    let mut resumed = false;
    let mut attempt: u32 = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            next = events.next() => next,
        };

        match next {
            Some(Ok(event)) => {
                inner.apply(&cancel, &event, resumed);
                resumed = false;
                attempt = 0;
                continue;
            }
            Some(Err(e)) => warn!(collection = %T::COLLECTION, error = %e, "live query failed"),
            None => warn!(collection = %T::COLLECTION, "live query ended"),
        }

        if inner.reconnect.exhausted(attempt) {
            error!(collection = %T::COLLECTION, attempts = attempt, "giving up on live query");
            return;
        }
        let delay = inner.reconnect.backoff(attempt);
        attempt += 1;
        debug!(collection = %T::COLLECTION, attempt, delay = ?delay, "reopening live query");

        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }

        let Some(reopened) = inner.reopen(&cancel) else {
            return;
        };
        info!(collection = %T::COLLECTION, attempt, "live query reopened");
        events = reopened;
        resumed = true;
    }
}
