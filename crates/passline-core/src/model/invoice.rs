use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Collection, Entity, lenient};
use super::EntityId;

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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: EntityId,
    #[serde(default)]
    pub order_id: Option<EntityId>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Entity for Invoice {
    type Status = InvoiceStatus;

    const COLLECTION: Collection = Collection::Invoices;
    const TRACKS_STATUS: bool = true;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn status(&self) -> Option<InvoiceStatus> {
        self.status
    }

    fn keep_status(&mut self, previous: &Self) {
        if self.status.is_none() {
            self.status = previous.status;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_paid_invoice() {
        let doc = serde_json::from_value(json!({
            "id": "inv-9",
            "order_id": "o1",
            "total": 42.0,
            "status": "paid",
            "paid_at": "2026-03-01T13:10:00Z"
        }))
        .unwrap();
        let invoice = Invoice::from_document(&doc).unwrap();
        assert_eq!(invoice.status, Some(InvoiceStatus::Paid));
        assert_eq!(invoice.order_id, Some(EntityId::from("o1")));
        assert!(invoice.paid_at.is_some());
    }
}
