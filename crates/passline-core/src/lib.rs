// passline-core: live collection sync, transition detection, and
// notification dispatch between passline-api and the views.

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod detect;
pub mod error;
pub mod feed;
pub mod hub;
pub mod model;
pub mod notify;
pub mod store;
pub mod stream;
pub mod write;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{AuthRejection, Authenticator, Session};
pub use config::{LiveMode, SyncConfig, TlsVerification};
pub use coordinator::{Mount, SubscriptionCoordinator, ViewRole};
pub use detect::{Transition, TransitionKind};
pub use error::CoreError;
pub use feed::{ChangeFeed, CollectionQuery, FeedError, FeedSource, ScriptedSource, SnapshotEvent};
pub use hub::{Hub, Surfaces};
pub use notify::{
    AudioPlayer, Cue, DispatchReport, NotificationDispatcher, NotificationSettings, OsNotice,
    Permission, PlatformNotifier, SurfaceError, Toast, ToastSurface,
};
pub use store::{EntityStore, ReconnectPolicy, Snapshot, StoreWiring, Unsubscribe};
pub use stream::EntityStream;
pub use write::RemoteWriter;

/// Raw store documents, as fed to `ScriptedSource`.
pub use passline_api::RawDocument;

pub use model::{
    Collection, Entity, EntityId, Invoice, InvoiceStatus, Order, OrderItem, OrderStatus,
    ScanEvent, Staff, StaffRole, Table,
};
