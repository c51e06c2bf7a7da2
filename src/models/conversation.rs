//! Conversation models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;

/// A customer conversation (chat, email thread).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Object ID.
    pub id: String,

    /// Short human-readable ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,

    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Stage object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Value>,

    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Conversation {
    const ENDPOINT: &'static str = "conversations";
    const SINGULAR: &'static str = "conversation";
    const PLURAL: &'static str = "conversations";

    fn id(&self) -> &str {
        &self.id
    }
}
