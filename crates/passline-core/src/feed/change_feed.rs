use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::{CollectionQuery, FeedError, FeedEvents, FeedSource};

type Release = Box<dyn FnOnce() + Send>;

enum FeedState {
    Idle,
    Open(Release),
    Closed,
}

/// One live query against one collection.
///
/// The event stream is lazy, infinite, and non-restartable: `open` succeeds
/// once per feed. `close` releases the underlying query exactly once no
/// matter how often it is called, and is a no-op on a feed that was never
/// opened. Dropping an open feed closes it.
pub struct ChangeFeed {
    source: Arc<dyn FeedSource>,
    state: Mutex<FeedState>,
}

impl ChangeFeed {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self {
            source,
            state: Mutex::new(FeedState::Idle),
        }
    }

    pub fn open(&self, query: &CollectionQuery) -> Result<FeedEvents, FeedError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !matches!(*state, FeedState::Idle) {
            return Err(FeedError::AlreadyOpened);
        }
        let (events, release) = self.source.open(query).into_parts();
        *state = FeedState::Open(release);
        debug!(collection = %query.collection, "change feed opened");
        Ok(events)
    }

    pub fn close(&self) {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *state, FeedState::Closed)
        };
        if let FeedState::Open(release) = previous {
            release();
            debug!("change feed closed");
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            FeedState::Open(_)
        )
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        self.close();
    }
}
