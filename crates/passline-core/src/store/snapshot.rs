// ── Materialized collection state ──
//
// Immutable, versioned id → entity map. Every feed event builds a new
// snapshot from the previous one; readers hold an `Arc` to whichever
// version was current when they looked.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::warn;

use crate::feed::SnapshotEvent;
use crate::model::{Entity, EntityId};

/// One materialization of a whole collection, in feed order.
#[derive(Debug, Clone)]
pub struct Snapshot<T: Entity> {
    entries: IndexMap<EntityId, Arc<T>>,
    version: u64,
    received_at: Option<DateTime<Utc>>,
}

impl<T: Entity> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            version: 0,
            received_at: None,
        }
    }
}

impl<T: Entity> Snapshot<T> {
    pub fn get(&self, id: &EntityId) -> Option<&Arc<T>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.values()
    }

    /// Entities in feed order.
    pub fn to_vec(&self) -> Vec<Arc<T>> {
        self.entries.values().cloned().collect()
    }

    /// Bumped on every replacement. Zero means nothing was ever applied.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// When the feed event behind this snapshot arrived.
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    /// Build the successor snapshot from a feed event.
    ///
    /// A document that fails to decode keeps its previous value; if it had
    /// none it is left out. Either way the failure is logged and the rest of
    /// the event applies normally. A document whose status is missing or
    /// unknown keeps the last known status.
    pub(crate) fn materialize(&self, event: &SnapshotEvent) -> Self {
        let mut entries = IndexMap::with_capacity(event.documents.len());
        for doc in &event.documents {
            let id = EntityId::from(doc.id.as_str());
            match T::from_document(doc) {
                Ok(mut entity) => {
                    if entity.status().is_none() {
                        if let Some(previous) = self.entries.get(&id).filter(|p| p.status().is_some()) {
                            warn!(collection = %T::COLLECTION, id = %id, "document has no usable status; keeping the last known one");
                            entity.keep_status(previous);
                        }
                    }
                    entries.insert(id, Arc::new(entity));
                }
                Err(e) => {
                    warn!(error = %e, "keeping previous value for malformed document");
                    if let Some(previous) = self.entries.get(&id) {
                        entries.insert(id, Arc::clone(previous));
                    }
                }
            }
        }
        Self {
            entries,
            version: self.version + 1,
            received_at: Some(event.received_at),
        }
    }

    /// Successor with `entity` inserted or replaced in place.
    pub(crate) fn with_upsert(&self, entity: T) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(entity.id().clone(), Arc::new(entity));
        Self {
            entries,
            version: self.version + 1,
            received_at: self.received_at,
        }
    }

    /// Successor without `id`, or `None` if it was not present.
    pub(crate) fn without(&self, id: &EntityId) -> Option<Self> {
        if !self.entries.contains_key(id) {
            return None;
        }
        let mut entries = self.entries.clone();
        entries.shift_remove(id);
        Some(Self {
            entries,
            version: self.version + 1,
            received_at: self.received_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Order, OrderStatus};
    use passline_api::RawDocument;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> RawDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn materialize_preserves_feed_order() {
        let event = SnapshotEvent::initial(vec![
            doc(json!({"id": "b", "status": "pending"})),
            doc(json!({"id": "a", "status": "ready"})),
        ]);
        let snap = Snapshot::<Order>::default().materialize(&event);
        let ids: Vec<&str> = snap.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(snap.version(), 1);
    }

    #[test]
    fn malformed_document_keeps_previous_value() {
        let first = Snapshot::<Order>::default().materialize(&SnapshotEvent::initial(vec![doc(
            json!({"id": "a", "status": "pending"}),
        )]));
        let second = first.materialize(&SnapshotEvent::initial(vec![
            doc(json!({"id": "a", "status": "ready", "items": 7})),
            doc(json!({"id": "b", "items": "nope"})),
        ]));

        let a = second.get(&EntityId::from("a")).unwrap();
        assert_eq!(a.status, Some(OrderStatus::Pending));
        assert!(!second.contains(&EntityId::from("b")));
    }

    #[test]
    fn missing_status_keeps_last_known_status() {
        let first = Snapshot::<Order>::default().materialize(&SnapshotEvent::initial(vec![doc(
            json!({"id": "a", "status": "preparing"}),
        )]));
        let second = first.materialize(&SnapshotEvent::initial(vec![
            doc(json!({"id": "a", "table": "4"})),
            doc(json!({"id": "b", "status": "flambéed"})),
        ]));

        let a = second.get(&EntityId::from("a")).unwrap();
        assert_eq!(a.status, Some(OrderStatus::Preparing));
        assert_eq!(a.table.as_deref(), Some("4"));
        assert_eq!(second.get(&EntityId::from("b")).unwrap().status, None);
    }

    #[test]
    fn upsert_and_remove_bump_version() {
        let snap = Snapshot::<Order>::default();
        let order = Order::from_document(&doc(json!({"id": "x"}))).unwrap();
        let with = snap.with_upsert(order);
        assert_eq!(with.len(), 1);
        let without = with.without(&EntityId::from("x")).unwrap();
        assert!(without.is_empty());
        assert_eq!(without.version(), 2);
        assert!(without.without(&EntityId::from("x")).is_none());
    }
}
