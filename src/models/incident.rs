//! Incident models. Incidents are only exposed by the beta API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;

/// An operational incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
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
    pub body: Option<String>,

    /// Stage, e.g. `acknowledged` or `mitigated`. May be a string or object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Value>,

    /// Severity. May be a string or object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Value>,

    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Incident {
    const ENDPOINT: &'static str = "incidents";
    const SINGULAR: &'static str = "incident";
    const PLURAL: &'static str = "incidents";

    fn id(&self) -> &str {
        &self.id
    }
}
