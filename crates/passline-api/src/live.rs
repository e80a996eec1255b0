//! WebSocket live queries.
//!
//! A live query is one WebSocket per collection subscription. The server
//! pushes a `snapshot` frame whenever the result set changes: the full,
//! ordered result set plus change records relative to the previous frame on
//! the same socket. The first frame after the handshake carries every
//! matching document tagged `added`.
//!
//! The stream returned by [`subscribe`] is non-restartable: when the socket
//! fails or closes it yields one terminal `Err` and ends. Reconnection is the
//! caller's job.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use passline_api::{ListQuery, LiveRequest, StoreClient, live};
//! use tokio_util::sync::CancellationToken;
//!
//! let request = LiveRequest::new(&client, "orders", &ListQuery::default())?;
//! let cancel = CancellationToken::new();
//! let mut frames = live::subscribe(request, cancel.clone());
//!
//! while let Some(Ok(frame)) = frames.next().await {
//!     println!("{} documents, {} changes", frame.documents.len(), frame.changes.len());
//! }
//! ```

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::{ListQuery, StoreClient};
use crate::error::Error;
use crate::models::{RawDocument, WireChange};

/// Close code reported when the socket ends without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// Everything needed to open one live-query socket.
#[derive(Debug, Clone)]
pub struct LiveRequest {
    pub url: Url,
    pub token: Option<SecretString>,
}

impl LiveRequest {
    /// Build a request for `collection` on the client's venue, reusing the
    /// client's session token.
    pub fn new(client: &StoreClient, collection: &str, query: &ListQuery) -> Result<Self, Error> {
        Ok(Self {
            url: client.live_url(collection, query)?,
            token: client.transport().token.clone(),
        })
    }
}

/// One result-set update from a live query.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveFrame {
    pub documents: Vec<RawDocument>,
    pub changes: Vec<WireChange>,
}

/// Frames the server sends over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    Snapshot {
        documents: Vec<RawDocument>,
        #[serde(default)]
        changes: Vec<WireChange>,
    },
    Error {
        message: String,
    },
    Heartbeat,
}

/// Open a live query and stream its frames.
///
/// The returned stream ends after `cancel` fires or after yielding one
/// terminal error.
pub fn subscribe(
    request: LiveRequest,
    cancel: CancellationToken,
) -> BoxStream<'static, Result<LiveFrame, Error>> {
    Box::pin(async_stream::stream! {
        tracing::info!(url = %request.url, "opening live query");

        let connected = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            result = connect(&request) => result,
        };
        let mut read = match connected {
            Ok(read) => read,
            Err(e) => {
                yield Err(e);
                return;
            }
        };

        tracing::debug!(url = %request.url, "live query connected");

        loop {
            let message = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                message = read.next() => message,
            };

            match message {
                Some(Ok(tungstenite::Message::Text(text))) => match parse_frame(&text) {
                    Ok(Some(frame)) => yield Ok(frame),
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                },
                Some(Ok(tungstenite::Message::Close(frame))) => {
                    let (code, reason) = frame.map_or_else(
                        || (ABNORMAL_CLOSURE, "no close payload".to_owned()),
                        |cf| (u16::from(cf.code), cf.reason.to_string()),
                    );
                    tracing::info!(code, %reason, "live query closed by server");
                    yield Err(Error::WebSocketClosed { code, reason });
                    break;
                }
                Some(Ok(_)) => {
                    // Ping/Pong/Binary: tungstenite answers pings itself
                }
                Some(Err(e)) => {
                    yield Err(Error::WebSocketConnect(e.to_string()));
                    break;
                }
                None => {
                    yield Err(Error::WebSocketClosed {
                        code: ABNORMAL_CLOSURE,
                        reason: "stream ended".into(),
                    });
                    break;
                }
            }
        }

        tracing::debug!(url = %request.url, "live query stream finished");
    })
}

type ReadHalf = futures_util::stream::SplitStream<
    tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
>;

async fn connect(request: &LiveRequest) -> Result<ReadHalf, Error> {
    let uri: tungstenite::http::Uri = request
        .url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let mut builder = ClientRequestBuilder::new(uri);
    if let Some(ref token) = request.token {
        builder = builder.with_header("Authorization", format!("Bearer {}", token.expose_secret()));
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(builder)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let (_write, read) = ws_stream.split();
    Ok(read)
}

/// Parse one text frame.
///
/// Unparseable frames and heartbeats are skipped (`Ok(None)`); a
/// server-side `error` frame is terminal.
fn parse_frame(text: &str) -> Result<Option<LiveFrame>, Error> {
    let frame: ServerFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(error = %e, "skipping unparseable live frame");
            return Ok(None);
        }
    };

    match frame {
        ServerFrame::Snapshot { documents, changes } => Ok(Some(LiveFrame { documents, changes })),
        ServerFrame::Error { message } => Err(Error::LiveQuery(message)),
        ServerFrame::Heartbeat => {
            tracing::trace!("live query heartbeat");
            Ok(None)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::ChangeKind;
    use serde_json::json;

    #[test]
    fn parse_snapshot_frame() {
        let raw = json!({
            "type": "snapshot",
            "documents": [
                { "id": "o-1", "status": "pending" },
                { "id": "o-2", "status": "ready" }
            ],
            "changes": [{ "id": "o-2", "kind": "modified" }]
        });

        let frame = parse_frame(&raw.to_string()).unwrap().unwrap();
        assert_eq!(frame.documents.len(), 2);
        assert_eq!(frame.documents[1].id, "o-2");
        assert_eq!(frame.changes.len(), 1);
        assert_eq!(frame.changes[0].kind, ChangeKind::Modified);
    }

    #[test]
    fn snapshot_without_changes_defaults_to_empty() {
        let raw = json!({ "type": "snapshot", "documents": [] });
        let frame = parse_frame(&raw.to_string()).unwrap().unwrap();
        assert!(frame.changes.is_empty());
    }

    #[test]
    fn heartbeat_is_skipped() {
        let raw = json!({ "type": "heartbeat" });
        assert!(parse_frame(&raw.to_string()).unwrap().is_none());
    }

    #[test]
    fn garbage_is_skipped() {
        assert!(parse_frame("not json at all").unwrap().is_none());
    }

    #[test]
    fn error_frame_is_terminal() {
        let raw = json!({ "type": "error", "message": "permission denied" });
        let err = parse_frame(&raw.to_string()).unwrap_err();
        assert!(matches!(err, Error::LiveQuery(ref m) if m == "permission denied"));
    }

    #[tokio::test]
    async fn unreachable_server_yields_one_terminal_error() {
        let request = LiveRequest {
            url: Url::parse("ws://127.0.0.1:9/v1/venues/x/collections/orders/live").unwrap(),
            token: None,
        };
        let mut frames = subscribe(request, CancellationToken::new());

        let first = frames.next().await.unwrap();
        assert!(matches!(first, Err(Error::WebSocketConnect(_))));
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn cancelled_before_connect_yields_nothing() {
        let request = LiveRequest {
            url: Url::parse("ws://127.0.0.1:9/live").unwrap(),
            token: None,
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut frames = subscribe(request, cancel);
        assert!(frames.next().await.is_none());
    }
}
