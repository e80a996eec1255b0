// ── Core error types ──
//
// User-facing errors from passline-core. Only write-path failures and
// configuration problems surface here; feed, decoding, and side-effect
// failures are contained inside the sync loop. The `From<passline_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

use crate::feed::FeedError;
use crate::model::Collection;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach collection store at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session expired -- log in again")]
    SessionExpired,

    #[error(transparent)]
    Feed(#[from] FeedError),

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{collection} document not found: {id}")]
    NotFound { collection: Collection, id: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Write rejected by store: {message}")]
    Rejected { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Store API error: {message}")]
    Api { message: String, status: Option<u16> },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("No async runtime is running; stores must be built inside one")]
    NoRuntime,

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Attach a collection and id to a bare 404 from the store.
    pub(crate) fn for_document(self, collection: Collection, id: &str) -> Self {
        match self {
            Self::Api {
                status: Some(404), ..
            } => Self::NotFound {
                collection,
                id: id.to_owned(),
            },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<passline_api::Error> for CoreError {
    fn from(err: passline_api::Error) -> Self {
        match err {
            passline_api::Error::Authentication { message } => Self::AuthenticationFailed { message },
            passline_api::Error::AccountInactive => Self::AuthenticationFailed {
                message: "Staff account is inactive".into(),
            },
            passline_api::Error::SessionExpired => Self::SessionExpired,
            passline_api::Error::Transport(ref e) => {
                if e.is_connect() || e.is_timeout() {
                    Self::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    Self::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            passline_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            passline_api::Error::Tls(msg) => Self::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            passline_api::Error::Api { status, message } if (400..500).contains(&status) && status != 404 => {
                Self::Rejected { message }
            }
            passline_api::Error::Api { status, message } => Self::Api {
                message,
                status: Some(status),
            },
            e @ (passline_api::Error::WebSocketConnect(_)
            | passline_api::Error::WebSocketClosed { .. }
            | passline_api::Error::LiveQuery(_)) => Self::Feed(FeedError::from(e)),
            passline_api::Error::Deserialization { message, body: _ } => {
                Self::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_become_rejections() {
        let err = CoreError::from(passline_api::Error::Api {
            status: 422,
            message: "name required".into(),
        });
        assert!(matches!(err, CoreError::Rejected { ref message } if message == "name required"));
    }

    #[test]
    fn not_found_gains_document_context() {
        let err = CoreError::from(passline_api::Error::Api {
            status: 404,
            message: "missing".into(),
        })
        .for_document(Collection::Staff, "s9");
        assert_eq!(err.to_string(), "staff document not found: s9");
    }

    #[test]
    fn socket_errors_map_to_feed_errors() {
        let err = CoreError::from(passline_api::Error::WebSocketClosed {
            code: 1011,
            reason: "overloaded".into(),
        });
        assert!(matches!(err, CoreError::Feed(FeedError::Closed { code: 1011, .. })));
    }
}
