use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Collection, Entity, lenient};
use super::EntityId;
use crate::detect::Transition;
use crate::notify::{Effect, NotificationSettings, policy};

/// Kitchen workflow status. Observed changes are never assumed to be
/// monotonic; any difference counts as a transition.
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
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Served,
}

impl OrderStatus {
    /// Still on the kitchen board.
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Served)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: EntityId,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Total quantity across items, saturating on absurd store values.
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .fold(0u64, |total, item| total.saturating_add(u64::from(item.quantity)))
    }

    /// Short human label, e.g. `table 4 (3 items)`.
    pub fn label(&self) -> String {
        let count = self.item_count();
        let noun = if count == 1 { "item" } else { "items" };
        match &self.table {
            Some(table) => format!("table {table} ({count} {noun})"),
            None => format!("order {} ({count} {noun})", self.id.short()),
        }
    }
}

impl Entity for Order {
    type Status = OrderStatus;

    const COLLECTION: Collection = Collection::Orders;
    const TRACKS_STATUS: bool = true;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn status(&self) -> Option<OrderStatus> {
        self.status
    }

    fn keep_status(&mut self, previous: &Self) {
        if self.status.is_none() {
            self.status = previous.status;
        }
    }

    fn effects(transition: &Transition<Self>, settings: &NotificationSettings) -> Vec<Effect> {
        policy::order_effects(transition, settings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use passline_api::RawDocument;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> RawDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn decodes_full_order() {
        let order = Order::from_document(&doc(json!({
            "id": "o1",
            "table": "4",
            "items": [{"name": "Ramen", "quantity": 2}, {"name": "Gyoza"}],
            "status": "preparing",
            "total": 31.5,
            "created_at": "2026-03-01T12:00:00Z"
        })))
        .unwrap();

        assert_eq!(order.status, Some(OrderStatus::Preparing));
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.label(), "table 4 (3 items)");
    }

    #[test]
    fn item_count_survives_huge_quantities() {
        let order = Order::from_document(&doc(json!({
            "id": "o3",
            "table": "4",
            "items": [{"name": "Oysters", "quantity": 4_000_000_000u32}, {"name": "Bread", "quantity": 4_000_000_000u32}],
        })))
        .unwrap();
        assert_eq!(order.item_count(), 8_000_000_000);
        assert_eq!(order.label(), "table 4 (8000000000 items)");
    }

    #[test]
    fn missing_status_decodes_as_none() {
        let order = Order::from_document(&doc(json!({"id": "o2"}))).unwrap();
        assert_eq!(order.status, None);
        assert!(order.items.is_empty());
    }

    #[test]
    fn unknown_status_decodes_as_none() {
        let order = Order::from_document(&doc(json!({"id": "o3", "status": "flambéed"}))).unwrap();
        assert_eq!(order.status, None);
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let err = Order::from_document(&doc(json!({"id": "o4", "items": "lots"}))).unwrap_err();
        assert_eq!(err.collection, Collection::Orders);
        assert_eq!(err.id, "o4");
    }

    #[test]
    fn served_is_closed() {
        assert!(OrderStatus::Ready.is_open());
        assert!(!OrderStatus::Served.is_open());
    }
}
