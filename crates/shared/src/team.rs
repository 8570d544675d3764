//! Team roster types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One roster entry. At most one member is lead at any time; the roster
/// store enforces that on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub is_lead: bool,
}

impl TeamMember {
    /// Trims all fields; a blank name becomes "Unnamed".
    pub fn new(name: &str, email: &str, role: &str, is_lead: bool) -> Self {
        let name = name.trim();
        Self {
            id: Uuid::new_v4(),
            name: if name.is_empty() {
                "Unnamed".to_string()
            } else {
                name.to_string()
            },
            email: email.trim().to_string(),
            role: role.trim().to_string(),
            is_lead,
        }
    }
}
