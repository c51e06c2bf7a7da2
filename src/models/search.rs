//! Hybrid search models (beta API).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Object namespaces a search can be restricted to.
pub const SEARCH_NAMESPACES: &[&str] = &[
    "account",
    "article",
    "conversation",
    "work",
    "user",
    "tag",
    "part",
    "rev_user",
    "dev_user",
];

/// Normalizes a namespace name, returning `None` for unknown values.
pub fn parse_namespace(value: &str) -> Option<&'static str> {
    let lower = value.trim().to_ascii_lowercase();
    SEARCH_NAMESPACES.iter().copied().find(|ns| *ns == lower)
}

/// Body of `/search.hybrid`.
#[derive(Debug, Clone, Serialize)]
pub struct HybridSearchRequest {
    /// Free-text query.
    pub query: String,
    /// Namespaces to search; all when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
    /// Semantic vs keyword weight, 0.0 to 1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_weight: Option<f64>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Pagination cursor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// One search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Hit type, matching a namespace.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,

    /// Relevance score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Highlighted snippets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<String>,

    /// Type-specific summary objects and anything else returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `/search.hybrid`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Hits in ranked order.
    #[serde(default)]
    pub results: Vec<SearchResult>,

    /// Cursor for the next page.
    #[serde(default)]
    pub next_cursor: Option<String>,

    /// Total number of hits, when reported.
    #[serde(default)]
    pub total_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_namespace() {
        assert_eq!(parse_namespace("WORK"), Some("work"));
        assert_eq!(parse_namespace(" dev_user "), Some("dev_user"));
        assert_eq!(parse_namespace("ticket"), None);
    }

    #[test]
    fn test_search_response_defaults() {
        let resp: SearchResponse = serde_json::from_value(json!({
            "results": [{"type": "work", "score": 0.9, "work": {"id": "w1"}}]
        }))
        .unwrap();
        assert_eq!(resp.results.len(), 1);
        assert_eq!(resp.results[0].result_type.as_deref(), Some("work"));
        assert!(resp.results[0].extra.contains_key("work"));
        assert!(resp.next_cursor.is_none());
    }
}
