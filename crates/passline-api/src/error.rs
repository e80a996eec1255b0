use thiserror::Error;

/// Top-level error type for the `passline-api` crate.
///
/// Covers every failure mode of the collection store surfaces:
/// authentication, transport, HTTP status, live-query sockets, and payloads.
/// `passline-core` maps these into user-facing variants.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// PIN rejected by the store.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// PIN matched a staff account that has been deactivated.
    #[error("Staff account is inactive")]
    AccountInactive,

    /// Session token expired or revoked.
    #[error("Session expired -- log in again")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Store API ───────────────────────────────────────────────────
    /// Non-success HTTP status with the store's error message, if any.
    #[error("Store API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Live queries ────────────────────────────────────────────────
    /// WebSocket handshake or read failed.
    #[error("Live query connection failed: {0}")]
    WebSocketConnect(String),

    /// Server closed the live query.
    #[error("Live query closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// Server reported a query-level failure inside the stream.
    #[error("Live query rejected: {0}")]
    LiveQuery(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session has expired and a fresh PIN login
    /// might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::WebSocketConnect(_) | Self::WebSocketClosed { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}
