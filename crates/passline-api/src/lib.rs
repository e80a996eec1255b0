//! Async client for the passline collection store.
//!
//! Two surfaces share one [`TransportConfig`]:
//!
//! - **[`StoreClient`]**: HTTP access to venue-scoped document collections
//!   (list, create, delete) plus the PIN login endpoint.
//! - **[`live`]**: WebSocket live queries. Each subscription yields
//!   [`LiveFrame`]s (full result set + per-document change records) until the
//!   socket drops, at which point a terminal error is yielded.
//!
//! Everything here speaks raw JSON documents ([`RawDocument`]); typed domain
//! entities live in `passline-core`.

pub mod auth;
pub mod client;
pub mod error;
pub mod live;
pub mod models;
pub mod transport;

pub use auth::PinLogin;
pub use client::{ListQuery, StoreClient};
pub use error::Error;
pub use live::{LiveFrame, LiveRequest};
pub use models::{ChangeKind, RawDocument, WireChange};
pub use transport::{TlsMode, TransportConfig};
