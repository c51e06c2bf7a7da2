//! Customer account models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;

/// A customer account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Object ID.
    pub id: String,

    /// Short human-readable ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,

    /// Account name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Web domains owned by the account.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,

    /// Commercial tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,

    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Account {
    const ENDPOINT: &'static str = "accounts";
    const SINGULAR: &'static str = "account";
    const PLURAL: &'static str = "accounts";

    fn id(&self) -> &str {
        &self.id
    }
}
