use serde::{Deserialize, Serialize};

use super::entity::{Collection, Entity, NoStatus};
use super::EntityId;

/// Role claim carried by a staff member and by their session.
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
pub enum StaffRole {
    Kitchen,
    Server,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: EntityId,
    pub name: String,
    pub role: StaffRole,
    #[serde(default = "active_default")]
    pub active: bool,
}

fn active_default() -> bool {
    true
}

impl Entity for Staff {
    type Status = NoStatus;

    const COLLECTION: Collection = Collection::Staff;
    const TRACKS_STATUS: bool = false;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn status(&self) -> Option<NoStatus> {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn staff_defaults_to_active() {
        let doc = serde_json::from_value(json!({"id": "s1", "name": "Mika", "role": "kitchen"})).unwrap();
        let staff = Staff::from_document(&doc).unwrap();
        assert!(staff.active);
        assert_eq!(staff.role, StaffRole::Kitchen);
    }

    #[test]
    fn unknown_role_is_malformed() {
        let doc = serde_json::from_value(json!({"id": "s2", "name": "Jo", "role": "owner"})).unwrap();
        assert!(Staff::from_document(&doc).is_err());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Admin".parse::<StaffRole>().unwrap(), StaffRole::Admin);
    }
}
