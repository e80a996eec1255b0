// ── Core identity type ──
//
// Every document in the collection store carries a string id assigned by
// the store at creation. `EntityId` wraps it so ids from different
// collections never get confused with plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical identifier for any passline entity.
///
/// Opaque to the core: ids are compared for equality and hashed, never
/// parsed. Immutable once assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for compact displays: the last six characters.
    pub fn short(&self) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .nth(5)
            .map_or(0, |(idx, _)| idx);
        &self.0[start..]
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_display() {
        let id = EntityId::from("Xb7kQ2mPz0");
        assert_eq!(id.to_string(), "Xb7kQ2mPz0");
    }

    #[test]
    fn entity_id_from_str() {
        let id: EntityId = "order-17".parse().unwrap();
        assert_eq!(id.as_str(), "order-17");
    }

    #[test]
    fn entity_id_short_form() {
        assert_eq!(EntityId::from("Xb7kQ2mPz0").short(), "Q2mPz0");
        assert_eq!(EntityId::from("a1").short(), "a1");
    }

    #[test]
    fn entity_id_serializes_as_plain_string() {
        let id = EntityId::from("t-4");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"t-4\"");
        let back: EntityId = serde_json::from_str("\"t-4\"").unwrap();
        assert_eq!(back, id);
    }
}
