// Collection store HTTP client
//
// Wraps `reqwest::Client` with venue-scoped URL construction, the
// `{ "documents": [...] }` list envelope, and error-body decoding.
// PIN login lives in `auth.rs` as an inherent method on the same client.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::RawDocument;
use crate::transport::TransportConfig;

/// Query parameters shared by list requests and live-query subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Field the store sorts by.
    pub order_by: Option<String>,
    /// Sort descending (newest first) instead of ascending.
    pub descending: bool,
    /// Equality filters, encoded as repeated `where=field:value`.
    pub filters: Vec<(String, String)>,
    /// Maximum number of documents to return.
    pub limit: Option<u32>,
}

impl ListQuery {
    /// Append this query's parameters to `url`.
    pub fn apply(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        if let Some(ref field) = self.order_by {
            pairs.append_pair("order_by", field);
            pairs.append_pair("direction", if self.descending { "desc" } else { "asc" });
        }
        for (field, value) in &self.filters {
            pairs.append_pair("where", &format!("{field}:{value}"));
        }
        if let Some(limit) = self.limit {
            pairs.append_pair("limit", &limit.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order_by.is_none() && self.filters.is_empty() && self.limit.is_none()
    }
}

#[derive(Deserialize)]
struct ListEnvelope {
    documents: Vec<RawDocument>,
}

#[derive(Deserialize)]
struct CreatedEnvelope {
    id: String,
}

/// `{"error": {"message": "..."}}` body the store returns on failures.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Raw HTTP client for one venue of the collection store.
///
/// All methods speak [`RawDocument`]s; typed decoding happens in
/// `passline-core`.
#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: Url,
    venue: String,
    transport: TransportConfig,
}

impl StoreClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the store root (e.g. `https://store.example.com`).
    pub fn new(base_url: Url, venue: String, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            venue,
            transport: transport.clone(),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, venue: String) -> Self {
        Self {
            http,
            base_url,
            venue,
            transport: TransportConfig::default(),
        }
    }

    pub fn venue(&self) -> &str {
        &self.venue
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Transport settings, reused by live-query sockets.
    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Documents ────────────────────────────────────────────────────

    /// List the documents of `collection` matching `query`, in store order.
    pub async fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<RawDocument>, Error> {
        let mut url = self.documents_url(collection)?;
        query.apply(&mut url);
        debug!(%url, "listing documents");

        let resp = self.http.get(url).send().await?;
        let envelope: ListEnvelope = parse_json(check(resp).await?).await?;
        trace!(count = envelope.documents.len(), collection, "documents listed");
        Ok(envelope.documents)
    }

    /// Create a document and return the id the store assigned to it.
    pub async fn create(&self, collection: &str, fields: &Map<String, Value>) -> Result<String, Error> {
        let url = self.documents_url(collection)?;
        debug!(%url, "creating document");

        let resp = self.http.post(url).json(fields).send().await?;
        let created: CreatedEnvelope = parse_json(check(resp).await?).await?;
        Ok(created.id)
    }

    /// Delete a document by id.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), Error> {
        let mut url = self.documents_url(collection)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(id);
        debug!(%url, "deleting document");

        let resp = self.http.delete(url).send().await?;
        check(resp).await?;
        Ok(())
    }

    // ── URL construction ─────────────────────────────────────────────

    /// `{base}/v1/venues/{venue}/{suffix}`
    pub(crate) fn venue_url(&self, suffix: &str) -> Result<Url, Error> {
        let path = format!("/v1/venues/{}/{suffix}", self.venue);
        Ok(self.base_url.join(&path)?)
    }

    fn documents_url(&self, collection: &str) -> Result<Url, Error> {
        self.venue_url(&format!("collections/{collection}/documents"))
    }

    /// WebSocket URL for a live query over `collection`.
    ///
    /// `http` becomes `ws` and `https` becomes `wss`.
    pub fn live_url(&self, collection: &str, query: &ListQuery) -> Result<Url, Error> {
        let mut url = self.venue_url(&format!("collections/{collection}/live"))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocketConnect(format!("cannot use {scheme} for {url}")))?;
        query.apply(&mut url);
        Ok(url)
    }
}

// ── Response helpers ─────────────────────────────────────────────────

/// Map non-success responses into [`Error`], decoding the store's error body.
pub(crate) async fn check(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_owned()
            } else {
                body.clone()
            }
        });

    Err(match status.as_u16() {
        401 => Error::SessionExpired,
        code => Error::Api {
            status: code,
            message,
        },
    })
}

pub(crate) async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> StoreClient {
        StoreClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            "bistro".into(),
        )
    }

    #[test]
    fn list_query_encodes_sort_filters_and_limit() {
        let mut url = Url::parse("https://store.test/docs").unwrap();
        ListQuery {
            order_by: Some("created_at".into()),
            descending: true,
            filters: vec![("status".into(), "ready".into())],
            limit: Some(50),
        }
        .apply(&mut url);

        assert_eq!(
            url.query(),
            Some("order_by=created_at&direction=desc&where=status%3Aready&limit=50")
        );
    }

    #[test]
    fn empty_query_adds_nothing() {
        let mut url = Url::parse("https://store.test/docs").unwrap();
        ListQuery::default().apply(&mut url);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn live_url_switches_to_websocket_scheme() {
        let url = client("https://store.test")
            .live_url("orders", &ListQuery::default())
            .unwrap();
        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.path(), "/v1/venues/bistro/collections/orders/live");

        let plain = client("http://127.0.0.1:8080")
            .live_url("scans", &ListQuery::default())
            .unwrap();
        assert_eq!(plain.scheme(), "ws");
    }
}
