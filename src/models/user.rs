//! Dev user (internal team member) models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;

/// A member of the DevRev organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevUser {
    /// Object ID.
    pub id: String,

    /// Short human-readable ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,

    /// Handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Full name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Account state, e.g. `active`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DevUser {
    /// Returns the best available display name, falling back to email or ID.
    pub fn label(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.display_name.as_deref())
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

impl Resource for DevUser {
    const ENDPOINT: &'static str = "dev-users";
    const SINGULAR: &'static str = "dev_user";
    const PLURAL: &'static str = "dev_users";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_fallbacks() {
        let user: DevUser = serde_json::from_value(json!({"id": "u1", "email": "a@b.c"})).unwrap();
        assert_eq!(user.label(), "a@b.c");
        let user: DevUser = serde_json::from_value(json!({"id": "u1"})).unwrap();
        assert_eq!(user.label(), "u1");
        let user: DevUser =
            serde_json::from_value(json!({"id": "u1", "full_name": "Ada", "display_name": "ada"}))
                .unwrap();
        assert_eq!(user.label(), "Ada");
    }
}
