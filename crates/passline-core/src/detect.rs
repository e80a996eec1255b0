// ── Transition detection ──
//
// Compares consecutive snapshots of one collection and classifies which
// changed entities crossed a notification-worthy boundary. Only the net
// change between two snapshots is visible; intermediate states that the
// feed coalesced away are never reconstructed.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use passline_api::ChangeKind;
use tracing::{debug, warn};

use crate::feed::ChangeRecord;
use crate::model::{Collection, Entity, EntityId};
use crate::store::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind<S> {
    /// A document appeared after the store was primed.
    Created { status: Option<S> },
    StatusChanged { from: S, to: S },
}

impl<S: fmt::Display> fmt::Display for TransitionKind<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { status: Some(s) } => write!(f, "created ({s})"),
            Self::Created { status: None } => f.write_str("created"),
            Self::StatusChanged { from, to } => write!(f, "{from} -> {to}"),
        }
    }
}

/// A classified change in one entity's observable state.
#[derive(Debug, Clone)]
pub struct Transition<T: Entity> {
    pub collection: Collection,
    pub entity_id: EntityId,
    pub kind: TransitionKind<T::Status>,
    pub previous: Option<Arc<T>>,
    pub current: Arc<T>,
}

impl<T: Entity> Transition<T> {
    /// True for a status change that lands on `status`.
    pub fn reached(&self, status: T::Status) -> bool {
        matches!(self.kind, TransitionKind::StatusChanged { to, .. } if to == status)
    }

    /// True for a creation carrying `status`.
    pub fn created_as(&self, status: T::Status) -> bool {
        matches!(self.kind, TransitionKind::Created { status: Some(s) } if s == status)
    }
}

/// Classify one entity's change between two snapshots.
///
/// - absent now: nothing (removals never notify)
/// - `added` with no earlier value: `Created`
/// - present in both with differing statuses: `StatusChanged`
/// - `modified` with no earlier value: nothing; the record was held back
///   earlier (malformed, say) and is not new to the store
///
/// A status-tracking entity with its status missing on either side is
/// treated as unchanged.
pub fn classify<T: Entity>(
    kind: ChangeKind,
    previous: Option<&Arc<T>>,
    current: Option<&Arc<T>>,
) -> Option<Transition<T>> {
    let current = current?;
    let entity_id = current.id().clone();

    let kind = match (kind, previous) {
        (ChangeKind::Added, None) => {
            let status = current.status();
            if T::TRACKS_STATUS && status.is_none() {
                warn!(collection = %T::COLLECTION, id = %entity_id, "new record has no status; not announcing");
                return None;
            }
            TransitionKind::Created { status }
        }
        (_, None) => {
            debug!(collection = %T::COLLECTION, id = %entity_id, change = %kind, "first sighting is not an add; not announcing");
            return None;
        }
        (_, Some(previous)) => match (previous.status(), current.status()) {
            (Some(from), Some(to)) if from != to => TransitionKind::StatusChanged { from, to },
            (Some(_), Some(_)) => return None,
            _ => {
                if T::TRACKS_STATUS {
                    warn!(collection = %T::COLLECTION, id = %entity_id, "record is missing its status; treating as unchanged");
                }
                return None;
            }
        },
    };

    Some(Transition {
        collection: T::COLLECTION,
        entity_id,
        kind,
        previous: previous.cloned(),
        current: Arc::clone(current),
    })
}

/// Classify every changed record of one event.
///
/// Nothing is emitted while the store is unprimed. Each id is classified at
/// most once per event; if any of its records is an add, it counts as one.
/// Ids in `unconfirmed` are in `previous` only through a local write and are
/// classified as if absent.
pub fn detect<T: Entity>(
    primed: bool,
    previous: &Snapshot<T>,
    current: &Snapshot<T>,
    changes: &[ChangeRecord],
    unconfirmed: &HashSet<EntityId>,
) -> Vec<Transition<T>> {
    if !primed {
        return Vec::new();
    }
    let mut net: IndexMap<&EntityId, ChangeKind> = IndexMap::with_capacity(changes.len());
    for change in changes {
        net.entry(&change.id)
            .and_modify(|kind| {
                if change.kind == ChangeKind::Added {
                    *kind = ChangeKind::Added;
                }
            })
            .or_insert(change.kind);
    }
    net.into_iter()
        .filter_map(|(id, kind)| {
            let before = if unconfirmed.contains(id) {
                None
            } else {
                previous.get(id)
            };
            classify(kind, before, current.get(id))
        })
        .collect()
}
