// ── Entity contract ──
//
// Every collection the core synchronizes maps to one `Entity` type. The
// trait carries what the store and detector need: identity, the optional
// status field, the owning collection, and per-type notification rules.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use passline_api::RawDocument;

use super::EntityId;
use crate::detect::Transition;
use crate::feed::{CollectionQuery, SortDirection};
use crate::notify::{Effect, NotificationSettings};

/// The logical collections held by the remote store.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    Orders,
    Tables,
    Invoices,
    Scans,
    Staff,
}

impl Collection {
    /// Wire name of the collection.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The live query each store opens for this collection.
    ///
    /// Scans are newest-first; orders and invoices arrive oldest-first so
    /// kitchen tickets read top to bottom.
    pub fn default_query(self) -> CollectionQuery {
        let query = CollectionQuery::new(self);
        match self {
            Self::Scans => query.order_by("created_at", SortDirection::Descending),
            Self::Orders | Self::Invoices => query.order_by("created_at", SortDirection::Ascending),
            Self::Tables => query.order_by("number", SortDirection::Ascending),
            Self::Staff => query.order_by("name", SortDirection::Ascending),
        }
    }
}

/// Status type for entities without a status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoStatus {}

impl fmt::Display for NoStatus {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

/// A delivered document could not be decoded into its entity type.
#[derive(Debug, Clone, Error)]
#[error("malformed {collection} document {id}: {reason}")]
pub struct MalformedRecord {
    pub collection: Collection,
    pub id: String,
    pub reason: String,
}

/// A typed document held by an `EntityStore`.
pub trait Entity: Serialize + DeserializeOwned + fmt::Debug + Clone + Send + Sync + 'static {
    /// Closed status enumeration, or [`NoStatus`].
    type Status: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static;

    const COLLECTION: Collection;

    /// Whether this entity is expected to carry a status. A tracked entity
    /// whose status is absent is malformed for transition purposes.
    const TRACKS_STATUS: bool;

    fn id(&self) -> &EntityId;

    fn status(&self) -> Option<Self::Status>;

    /// Take `previous`'s status when this value arrived without one.
    fn keep_status(&mut self, _previous: &Self) {}

    /// Decode a raw store document.
    fn from_document(doc: &RawDocument) -> Result<Self, MalformedRecord> {
        serde_json::from_value(doc.to_value()).map_err(|e| MalformedRecord {
            collection: Self::COLLECTION,
            id: doc.id.clone(),
            reason: e.to_string(),
        })
    }

    /// Side effects a transition of this entity type should produce.
    fn effects(_transition: &Transition<Self>, _settings: &NotificationSettings) -> Vec<Effect> {
        Vec::new()
    }
}

/// Deserialize an optional enum field, mapping absent, null, non-string, or
/// unknown values to `None`.
///
/// Keeps the rest of the document usable when the store sends a status
/// this build does not know about.
pub(crate) fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<serde_json::Value>::deserialize(de)?;
    Ok(raw.and_then(|v| v.as_str().and_then(|s| s.parse().ok())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn collection_wire_names() {
        let names: Vec<&str> = Collection::iter().map(Collection::name).collect();
        assert_eq!(names, ["orders", "tables", "invoices", "scans", "staff"]);
        assert_eq!("scans".parse::<Collection>().unwrap(), Collection::Scans);
    }

    #[test]
    fn scans_are_newest_first() {
        let query = Collection::Scans.default_query();
        let sort = query.sort.unwrap();
        assert_eq!(sort.field, "created_at");
        assert_eq!(sort.direction, SortDirection::Descending);
    }
}
