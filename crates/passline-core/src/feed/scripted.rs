// ── In-process feed source ──
//
// Holds collections in memory and pushes snapshot events to every open live
// query, computing change records per query the way the store would. Used by
// tests and by `passline demo`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use passline_api::RawDocument;

use super::{
    diff_documents, CollectionQuery, FeedError, FeedSource, LiveQuery, SnapshotEvent,
};
use crate::error::CoreError;
use crate::model::{Collection, EntityId};
use crate::write::RemoteWriter;

/// Lifecycle record of one live query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedLogEntry {
    Opened(Collection),
    Closed(Collection),
}

type EventSender = mpsc::UnboundedSender<Result<SnapshotEvent, FeedError>>;

struct Subscriber {
    id: u64,
    query: CollectionQuery,
    tx: EventSender,
    last: Vec<RawDocument>,
}

#[derive(Default)]
struct Lane {
    documents: Vec<RawDocument>,
    subscribers: Vec<Subscriber>,
    opens: usize,
    closes: usize,
}

impl Lane {
    fn publish(&mut self) {
        for sub in &mut self.subscribers {
            let view = view_of(&self.documents, &sub.query);
            let changes = diff_documents(&sub.last, &view);
            if changes.is_empty() {
                continue;
            }
            let _ = sub.tx.send(Ok(SnapshotEvent::new(view.clone(), changes)));
            sub.last = view;
        }
    }
}

#[derive(Default)]
struct Script {
    lanes: HashMap<Collection, Lane>,
    log: Vec<FeedLogEntry>,
    next_id: u64,
    reject_writes: Option<String>,
}

/// Scripted, in-memory collection store.
///
/// Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    inner: Arc<Mutex<Script>>,
}

fn view_of(documents: &[RawDocument], query: &CollectionQuery) -> Vec<RawDocument> {
    let mut view: Vec<RawDocument> = documents.iter().filter(|d| query.matches(d)).cloned().collect();
    query.arrange(&mut view);
    view
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace one document and notify open queries.
    pub fn upsert(&self, collection: Collection, doc: RawDocument) {
        let mut script = self.script();
        let lane = script.lanes.entry(collection).or_default();
        match lane.documents.iter_mut().find(|d| d.id == doc.id) {
            Some(slot) => *slot = doc,
            None => lane.documents.push(doc),
        }
        lane.publish();
    }

    /// Remove one document. Returns `false` if it was not present.
    pub fn remove(&self, collection: Collection, id: &str) -> bool {
        let mut script = self.script();
        let lane = script.lanes.entry(collection).or_default();
        let before = lane.documents.len();
        lane.documents.retain(|d| d.id != id);
        let removed = lane.documents.len() != before;
        if removed {
            lane.publish();
        }
        removed
    }

    /// Replace the whole collection in one event. Any number of documents
    /// may change at once.
    pub fn replace(&self, collection: Collection, documents: Vec<RawDocument>) {
        let mut script = self.script();
        let lane = script.lanes.entry(collection).or_default();
        lane.documents = documents;
        lane.publish();
    }

    /// Push a hand-built event to every open query on `collection`,
    /// bypassing change computation. The event's documents become the
    /// collection's contents.
    pub fn emit(&self, collection: Collection, event: SnapshotEvent) {
        let mut script = self.script();
        let lane = script.lanes.entry(collection).or_default();
        lane.documents.clone_from(&event.documents);
        for sub in &mut lane.subscribers {
            sub.last.clone_from(&event.documents);
            let _ = sub.tx.send(Ok(event.clone()));
        }
    }

    /// Fail every open query on `collection` with a terminal error.
    pub fn fail(&self, collection: Collection, error: FeedError) {
        let mut script = self.script();
        let lane = script.lanes.entry(collection).or_default();
        for sub in lane.subscribers.drain(..) {
            let _ = sub.tx.send(Err(error.clone()));
        }
    }

    /// Make subsequent writes fail with `message`, or succeed again with `None`.
    pub fn reject_writes(&self, message: Option<&str>) {
        self.script().reject_writes = message.map(str::to_owned);
    }

    pub fn documents(&self, collection: Collection) -> Vec<RawDocument> {
        self.script()
            .lanes
            .get(&collection)
            .map(|lane| lane.documents.clone())
            .unwrap_or_default()
    }

    pub fn opens(&self, collection: Collection) -> usize {
        self.script().lanes.get(&collection).map_or(0, |l| l.opens)
    }

    pub fn closes(&self, collection: Collection) -> usize {
        self.script().lanes.get(&collection).map_or(0, |l| l.closes)
    }

    /// Number of live queries currently attached to `collection`.
    pub fn active(&self, collection: Collection) -> usize {
        self.script()
            .lanes
            .get(&collection)
            .map_or(0, |l| l.subscribers.len())
    }

    pub fn log(&self) -> Vec<FeedLogEntry> {
        self.script().log.clone()
    }
}

impl FeedSource for ScriptedSource {
    fn open(&self, query: &CollectionQuery) -> LiveQuery {
        let (tx, rx) = mpsc::unbounded_channel();
        let collection = query.collection;

        let id = {
            let mut script = self.script();
            script.next_id += 1;
            let id = script.next_id;
            script.log.push(FeedLogEntry::Opened(collection));

            let lane = script.lanes.entry(collection).or_default();
            lane.opens += 1;
            let view = view_of(&lane.documents, query);
            let _ = tx.send(Ok(SnapshotEvent::initial(view.clone())));
            lane.subscribers.push(Subscriber {
                id,
                query: query.clone(),
                tx,
                last: view,
            });
            id
        };

        let inner = Arc::clone(&self.inner);
        LiveQuery::new(UnboundedReceiverStream::new(rx).boxed(), move || {
            let mut script = inner.lock().unwrap_or_else(PoisonError::into_inner);
            script.log.push(FeedLogEntry::Closed(collection));
            let lane = script.lanes.entry(collection).or_default();
            lane.closes += 1;
            lane.subscribers.retain(|s| s.id != id);
        })
    }
}

impl RemoteWriter for ScriptedSource {
    fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> BoxFuture<'_, Result<EntityId, CoreError>> {
        async move {
            let rejected = self.script().reject_writes.clone();
            if let Some(message) = rejected {
                return Err(CoreError::Rejected { message });
            }
            let id = uuid::Uuid::new_v4().simple().to_string();
            self.upsert(collection, RawDocument::new(id.clone(), fields));
            Ok(EntityId::from(id))
        }
        .boxed()
    }

    fn delete<'a>(
        &'a self,
        collection: Collection,
        id: &'a EntityId,
    ) -> BoxFuture<'a, Result<(), CoreError>> {
        async move {
            let rejected = self.script().reject_writes.clone();
            if let Some(message) = rejected {
                return Err(CoreError::Rejected { message });
            }
            if self.remove(collection, id.as_str()) {
                Ok(())
            } else {
                Err(CoreError::NotFound {
                    collection,
                    id: id.to_string(),
                })
            }
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use passline_api::ChangeKind;
    use serde_json::json;

    fn doc(value: Value) -> RawDocument {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn open_delivers_initial_snapshot_then_changes() {
        let source = ScriptedSource::new();
        source.upsert(Collection::Orders, doc(json!({"id": "a", "status": "pending"})));

        let live = source.open(&Collection::Orders.default_query());
        let (mut events, release) = live.into_parts();

        let first = events.next().await.unwrap().unwrap();
        assert_eq!(first.documents.len(), 1);
        assert_eq!(first.changes[0].kind, ChangeKind::Added);

        source.upsert(Collection::Orders, doc(json!({"id": "a", "status": "ready"})));
        let second = events.next().await.unwrap().unwrap();
        assert_eq!(second.changes.len(), 1);
        assert_eq!(second.changes[0].kind, ChangeKind::Modified);

        release();
        assert_eq!(source.active(Collection::Orders), 0);
        assert_eq!(source.log(), vec![
            FeedLogEntry::Opened(Collection::Orders),
            FeedLogEntry::Closed(Collection::Orders),
        ]);
    }

    #[tokio::test]
    async fn fail_terminates_open_queries() {
        let source = ScriptedSource::new();
        let (mut events, _release) = source.open(&Collection::Tables.default_query()).into_parts();
        let _initial = events.next().await.unwrap().unwrap();

        source.fail(Collection::Tables, FeedError::Connection("reset".into()));
        assert!(events.next().await.unwrap().is_err());
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn writes_assign_ids_and_honor_rejection() {
        let source = ScriptedSource::new();
        let mut fields = Map::new();
        fields.insert("name".into(), json!("Mika"));

        let id = RemoteWriter::create(&source, Collection::Staff, fields.clone()).await.unwrap();
        assert_eq!(source.documents(Collection::Staff).len(), 1);

        source.reject_writes(Some("read only"));
        assert!(matches!(
            RemoteWriter::create(&source, Collection::Staff, fields).await,
            Err(CoreError::Rejected { .. })
        ));

        source.reject_writes(None);
        RemoteWriter::delete(&source, Collection::Staff, &id).await.unwrap();
        assert!(matches!(
            RemoteWriter::delete(&source, Collection::Staff, &id).await,
            Err(CoreError::NotFound { .. })
        ));
    }
}
