use serde::{Deserialize, Serialize};

use super::entity::{Collection, Entity, NoStatus};
use super::EntityId;

/// A seating position in the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: EntityId,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub seats: Option<u32>,
    #[serde(default)]
    pub occupied: bool,
}

impl Table {
    pub fn display_name(&self) -> String {
        match (&self.label, self.number) {
            (Some(label), _) => label.clone(),
            (None, Some(n)) => format!("Table {n}"),
            (None, None) => self.id.to_string(),
        }
    }
}

impl Entity for Table {
    type Status = NoStatus;

    const COLLECTION: Collection = Collection::Tables;
    const TRACKS_STATUS: bool = false;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn status(&self) -> Option<NoStatus> {
        None
    }
}
