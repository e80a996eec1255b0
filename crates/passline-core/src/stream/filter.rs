// ── Filter predicates for entity streams ──
//
// Used by views to narrow snapshots without opening another live query.

use crate::model::{Invoice, InvoiceStatus, Order, OrderStatus, Staff, StaffRole};

/// Filter predicate for orders.
pub enum OrderFilter {
    All,
    /// Anything not yet served, including orders without a status.
    Open,
    ByStatus(OrderStatus),
    ByTable(String),
    Custom(Box<dyn Fn(&Order) -> bool + Send + Sync>),
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            Self::All => true,
            Self::Open => order.status.is_none_or(OrderStatus::is_open),
            Self::ByStatus(status) => order.status == Some(*status),
            Self::ByTable(table) => order.table.as_deref() == Some(table.as_str()),
            Self::Custom(f) => f(order),
        }
    }
}

/// Filter predicate for invoices.
pub enum InvoiceFilter {
    All,
    Unpaid,
    ByStatus(InvoiceStatus),
    Custom(Box<dyn Fn(&Invoice) -> bool + Send + Sync>),
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        match self {
            Self::All => true,
            Self::Unpaid => invoice.status == Some(InvoiceStatus::Pending),
            Self::ByStatus(status) => invoice.status == Some(*status),
            Self::Custom(f) => f(invoice),
        }
    }
}

/// Filter predicate for staff accounts.
pub enum StaffFilter {
    All,
    Active,
    ByRole(StaffRole),
}

impl StaffFilter {
    pub fn matches(&self, staff: &Staff) -> bool {
        match self {
            Self::All => true,
            Self::Active => staff.active,
            Self::ByRole(role) => staff.role == *role,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Entity;
    use serde_json::json;

    fn order(value: serde_json::Value) -> Order {
        Order::from_document(&serde_json::from_value(value).unwrap()).unwrap()
    }

    #[test]
    fn open_orders_exclude_served() {
        let filter = OrderFilter::Open;
        assert!(filter.matches(&order(json!({"id": "a", "status": "ready"}))));
        assert!(filter.matches(&order(json!({"id": "b"}))));
        assert!(!filter.matches(&order(json!({"id": "c", "status": "served"}))));
    }

    #[test]
    fn table_filter_matches_exactly() {
        let filter = OrderFilter::ByTable("4".into());
        assert!(filter.matches(&order(json!({"id": "a", "table": "4"}))));
        assert!(!filter.matches(&order(json!({"id": "b", "table": "14"}))));
    }
}
