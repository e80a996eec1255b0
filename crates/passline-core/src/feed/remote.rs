// ── Remote feed sources ──
//
// Two conformant ways to watch a collection on the real store: WebSocket
// push (`live` frames) and HTTP polling with client-side diffing.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use passline_api::{LiveRequest, RawDocument, StoreClient, live};

use super::{diff_documents, CollectionQuery, FeedError, FeedSource, LiveQuery, SnapshotEvent};

/// Live queries over the store's WebSocket endpoint.
#[derive(Clone)]
pub struct WebSocketSource {
    client: StoreClient,
}

impl WebSocketSource {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }
}

impl FeedSource for WebSocketSource {
    fn open(&self, query: &CollectionQuery) -> LiveQuery {
        let cancel = CancellationToken::new();
        let request = match LiveRequest::new(&self.client, query.collection.name(), &query.to_list_query()) {
            Ok(request) => request,
            Err(e) => {
                let error = FeedError::from(e);
                let events = futures_util::stream::once(async move { Err(error) }).boxed();
                return LiveQuery::new(events, || {});
            }
        };

        let events = live::subscribe(request, cancel.clone())
            .map(|frame| frame.map(SnapshotEvent::from).map_err(FeedError::from))
            .boxed();
        LiveQuery::new(events, move || cancel.cancel())
    }
}

/// Live queries synthesized by listing a collection on an interval.
///
/// The first successful poll yields every document as `added`; later polls
/// yield only when something changed. A failed poll is terminal.
#[derive(Clone)]
pub struct PollingSource {
    client: StoreClient,
    interval: Duration,
}

impl PollingSource {
    pub fn new(client: StoreClient, interval: Duration) -> Self {
        Self { client, interval }
    }
}

impl FeedSource for PollingSource {
    fn open(&self, query: &CollectionQuery) -> LiveQuery {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let client = self.client.clone();
        let interval = self.interval;
        let query = query.clone();

        let events = async_stream::stream! {
            let list_query = query.to_list_query();
            let mut previous: Option<Vec<RawDocument>> = None;
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let listed = tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    result = client.list(query.collection.name(), &list_query) => result,
                };

                match listed {
                    Ok(mut documents) => {
                        query.arrange(&mut documents);
                        let event = match &previous {
                            None => SnapshotEvent::initial(documents.clone()),
                            Some(before) => {
                                let changes = diff_documents(before, &documents);
                                if changes.is_empty() {
                                    continue;
                                }
                                SnapshotEvent::new(documents.clone(), changes)
                            }
                        };
                        debug!(collection = %query.collection, changes = event.changes.len(), "poll produced changes");
                        previous = Some(documents);
                        yield Ok(event);
                    }
                    Err(e) => {
                        warn!(collection = %query.collection, error = %e, "poll failed");
                        yield Err(FeedError::from(e));
                        break;
                    }
                }
            }
        }
        .boxed();

        LiveQuery::new(events, move || cancel.cancel())
    }
}
