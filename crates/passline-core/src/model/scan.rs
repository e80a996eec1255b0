use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Collection, Entity, NoStatus};
use super::EntityId;

/// A customer scanned a table's QR code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub id: EntityId,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for ScanEvent {
    type Status = NoStatus;

    const COLLECTION: Collection = Collection::Scans;
    const TRACKS_STATUS: bool = false;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn status(&self) -> Option<NoStatus> {
        None
    }
}
