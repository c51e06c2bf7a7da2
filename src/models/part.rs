//! Product part models (products, capabilities, features, enhancements).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;

/// A node in the product part hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Object ID.
    pub id: String,

    /// Short human-readable ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,

    /// Name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Part type, e.g. `product` or `feature`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub part_type: Option<String>,

    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Part {
    const ENDPOINT: &'static str = "parts";
    const SINGULAR: &'static str = "part";
    const PLURAL: &'static str = "parts";

    fn id(&self) -> &str {
        &self.id
    }
}
