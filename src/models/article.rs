//! Knowledge-base article models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;

/// A knowledge-base article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Object ID.
    pub id: String,

    /// Short human-readable ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,

    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Publication status, e.g. `published` or `draft`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Article {
    const ENDPOINT: &'static str = "articles";
    const SINGULAR: &'static str = "article";
    const PLURAL: &'static str = "articles";

    fn id(&self) -> &str {
        &self.id
    }
}
