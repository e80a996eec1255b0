// ── Domain model ──
//
// Typed entities for each synchronized collection. Documents arrive as raw
// JSON from the store and are decoded through `Entity::from_document`.

pub mod entity;
pub mod entity_id;
pub mod invoice;
pub mod order;
pub mod scan;
pub mod staff;
pub mod table;

pub use entity::{Collection, Entity, MalformedRecord, NoStatus};
pub use entity_id::EntityId;
pub use invoice::{Invoice, InvoiceStatus};
pub use order::{Order, OrderItem, OrderStatus};
pub use scan::ScanEvent;
pub use staff::{Staff, StaffRole};
pub use table::Table;
