// ── Subscription coordination ──
//
// A view declares which collections it needs; the coordinator subscribes
// them in order behind one `Mount` and releases them in reverse when the
// view goes away.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::hub::Hub;
use crate::model::{Collection, StaffRole};
use crate::store::Unsubscribe;

/// Client roles, each with a fixed collection list.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ViewRole {
    Kitchen,
    Server,
    Admin,
    Customer,
}

impl ViewRole {
    /// Collections in subscription order.
    pub fn collections(self) -> &'static [Collection] {
        match self {
            Self::Kitchen => &[Collection::Orders],
            Self::Server => &[Collection::Orders, Collection::Tables, Collection::Invoices],
            Self::Admin => &[
                Collection::Orders,
                Collection::Tables,
                Collection::Invoices,
                Collection::Scans,
                Collection::Staff,
            ],
            Self::Customer => &[Collection::Tables, Collection::Orders],
        }
    }
}

impl From<StaffRole> for ViewRole {
    fn from(role: StaffRole) -> Self {
        match role {
            StaffRole::Kitchen => Self::Kitchen,
            StaffRole::Server => Self::Server,
            StaffRole::Admin => Self::Admin,
        }
    }
}

/// Owns the subscriptions of every mounted view.
#[derive(Clone)]
pub struct SubscriptionCoordinator {
    hub: Arc<Hub>,
}

impl SubscriptionCoordinator {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Subscribe `collections` in order.
    ///
    /// The first mount in the process resolves notification permission,
    /// prompting if it is still undetermined. Stores already subscribed by
    /// another mount are shared, not reopened.
    pub async fn mount(&self, collections: &[Collection]) -> Mount {
        self.hub.dispatcher().ensure_permission().await;

        let mut handles = Vec::with_capacity(collections.len());
        for &collection in collections {
            handles.push((collection, self.hub.store(collection).subscribe()));
        }
        info!(collections = ?collections, "view mounted");
        Mount { handles }
    }

    pub async fn mount_role(&self, role: ViewRole) -> Mount {
        self.mount(role.collections()).await
    }
}

/// The subscriptions held by one mounted view. Released in reverse order on
/// `unmount` or drop.
#[must_use = "dropping a Mount unmounts the view immediately"]
pub struct Mount {
    handles: Vec<(Collection, Unsubscribe)>,
}

impl Mount {
    pub fn collections(&self) -> Vec<Collection> {
        self.handles.iter().map(|(c, _)| *c).collect()
    }

    pub fn unmount(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        while let Some((collection, mut handle)) = self.handles.pop() {
            handle.unsubscribe();
            debug!(%collection, "released");
        }
        info!("view unmounted");
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.release();
    }
}
