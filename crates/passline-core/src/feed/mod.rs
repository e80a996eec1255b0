// ── Change feeds ──
//
// A `ChangeFeed` wraps one live query against one collection. Sources
// (WebSocket push, HTTP polling, in-process scripted) all deliver the same
// contract: an ordered, at-least-once stream of `SnapshotEvent`s whose
// change records are relative to the previous event on the same feed.

mod change_feed;
pub mod diff;
mod query;
pub mod remote;
pub mod scripted;

use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use thiserror::Error;

use passline_api::{ChangeKind, LiveFrame, RawDocument};

use crate::model::EntityId;

pub use change_feed::ChangeFeed;
pub use diff::diff_documents;
pub use query::{CollectionQuery, SortDirection, SortSpec};
pub use remote::{PollingSource, WebSocketSource};
pub use scripted::{FeedLogEntry, ScriptedSource};

/// One per-document change relative to the previous event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub id: EntityId,
    pub kind: ChangeKind,
}

impl ChangeRecord {
    pub fn new(id: impl Into<EntityId>, kind: ChangeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// A full, ordered result set plus the changes that produced it.
#[derive(Debug, Clone)]
pub struct SnapshotEvent {
    pub documents: Vec<RawDocument>,
    pub changes: Vec<ChangeRecord>,
    pub received_at: DateTime<Utc>,
}

impl SnapshotEvent {
    pub fn new(documents: Vec<RawDocument>, changes: Vec<ChangeRecord>) -> Self {
        Self {
            documents,
            changes,
            received_at: Utc::now(),
        }
    }

    /// Initial result set: every document tagged `added`.
    pub fn initial(documents: Vec<RawDocument>) -> Self {
        let changes = documents
            .iter()
            .map(|doc| ChangeRecord::new(doc.id.as_str(), ChangeKind::Added))
            .collect();
        Self::new(documents, changes)
    }
}

impl From<LiveFrame> for SnapshotEvent {
    fn from(frame: LiveFrame) -> Self {
        let changes = frame
            .changes
            .into_iter()
            .map(|c| ChangeRecord::new(c.id, c.kind))
            .collect();
        Self::new(frame.documents, changes)
    }
}

/// Failures a live query can surface. All are terminal for the feed that
/// produced them.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("live query connection failed: {0}")]
    Connection(String),

    #[error("live query closed (code {code}): {reason}")]
    Closed { code: u16, reason: String },

    #[error("live query rejected: {0}")]
    Rejected(String),

    #[error("change feed was already opened")]
    AlreadyOpened,
}

impl From<passline_api::Error> for FeedError {
    fn from(err: passline_api::Error) -> Self {
        match err {
            passline_api::Error::WebSocketClosed { code, reason } => Self::Closed { code, reason },
            passline_api::Error::LiveQuery(message) => Self::Rejected(message),
            other => Self::Connection(other.to_string()),
        }
    }
}

pub type FeedEvents = BoxStream<'static, Result<SnapshotEvent, FeedError>>;

/// An opened live query: its event stream plus the hook that releases it.
pub struct LiveQuery {
    pub events: FeedEvents,
    release: Box<dyn FnOnce() + Send>,
}

impl LiveQuery {
    pub fn new(events: FeedEvents, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            events,
            release: Box::new(release),
        }
    }

    pub(crate) fn into_parts(self) -> (FeedEvents, Box<dyn FnOnce() + Send>) {
        (self.events, self.release)
    }
}

/// Something that can open live queries against the collection store.
pub trait FeedSource: Send + Sync {
    fn open(&self, query: &CollectionQuery) -> LiveQuery;
}
