// ── Wire models ──
//
// Documents are kept as raw JSON objects at this layer. The store assigns
// every document a string `id`; all other fields are opaque here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single document as delivered by the collection store.
///
/// The `id` is lifted out of the object; every other field stays in
/// `fields` so nothing the store sends is silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Rebuild the full JSON object, `id` included.
    pub fn to_value(&self) -> Value {
        let mut obj = self.fields.clone();
        obj.insert("id".into(), Value::String(self.id.clone()));
        Value::Object(obj)
    }
}

/// How a document changed relative to the previous event on the same feed.
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
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// A per-document change record as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireChange {
    pub id: String,
    pub kind: ChangeKind,
}
