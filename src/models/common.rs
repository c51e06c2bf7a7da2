//! Common types shared across DevRev API models.
//!
//! DevRev wraps every list response as `{"<plural>": [...], "next_cursor": ...}`
//! and every single-object response as `{"<singular>": {...}}`. The
//! [`Resource`] trait records those keys per object type so the client can
//! unwrap responses generically.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, DevRevError, ErrorKind};
use crate::pagination::Page;

/// A DevRev object type reachable through `<endpoint>.list` / `<endpoint>.get`.
pub trait Resource: DeserializeOwned + Serialize + Send {
    /// Endpoint prefix, e.g. `works` for `/works.list`.
    const ENDPOINT: &'static str;

    /// Key of the object in a get/create/update response.
    const SINGULAR: &'static str;

    /// Key of the array in a list response.
    const PLURAL: &'static str;

    /// Object ID.
    fn id(&self) -> &str;
}

/// Body of a `*.list` call.
///
/// Resource-specific filters are carried in `filters` and flattened next to
/// the pagination fields.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListRequest {
    /// Cursor returned by a previous call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Maximum number of objects to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Extra filter fields.
    #[serde(flatten)]
    pub filters: Map<String, Value>,
}

impl ListRequest {
    /// Creates an unfiltered request for the first page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Resumes from a cursor. Blank cursors are ignored.
    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor.filter(|c| !c.trim().is_empty());
        self
    }

    /// Adds a filter when `value` is present and not an empty list.
    ///
    /// A value that fails to serialize is an error rather than a dropped
    /// filter, since dropping it would widen the query.
    pub fn with_filter<V: Serialize>(
        mut self,
        key: &str,
        value: Option<V>,
    ) -> Result<Self, DevRevError> {
        if let Some(value) = value.map(serde_json::to_value).transpose()? {
            let empty_array = value.as_array().is_some_and(Vec::is_empty);
            if !value.is_null() && !empty_array {
                self.filters.insert(key.to_string(), value);
            }
        }
        Ok(self)
    }
}

impl From<Page> for ListRequest {
    fn from(page: Page) -> Self {
        ListRequest::new()
            .with_limit(page.limit)
            .with_cursor(page.cursor)
    }
}

/// A page of objects from a `*.list` call.
#[derive(Debug, Clone)]
pub struct ListResponse<T> {
    /// Objects on this page, in upstream order.
    pub items: Vec<T>,

    /// Cursor for the next page; `None` when this is the last page.
    pub next_cursor: Option<String>,
}

impl<T: Resource> ListResponse<T> {
    /// Unwraps a raw list body using `T::PLURAL`.
    ///
    /// A missing array is treated as an empty page.
    pub fn from_body(mut body: Map<String, Value>) -> Result<Self, DevRevError> {
        let items = match body.remove(T::PLURAL) {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        let next_cursor = body
            .remove("next_cursor")
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|c| !c.is_empty());
        Ok(Self { items, next_cursor })
    }
}

/// Unwraps a raw get/create/update body using `T::SINGULAR`.
pub fn unwrap_object<T: Resource>(mut body: Map<String, Value>) -> Result<T, DevRevError> {
    match body.remove(T::SINGULAR) {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Err(ApiError::new(
            ErrorKind::Unknown,
            format!("response is missing the '{}' object", T::SINGULAR),
        )
        .into()),
    }
}

/// Body of a `*.get` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequest {
    /// Object ID.
    pub id: String,
}

impl GetRequest {
    /// Creates a request for `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Part;
    use serde_json::json;

    #[test]
    fn test_list_request_serializes_only_set_fields() {
        let req = ListRequest::new()
            .with_limit(10)
            .with_cursor(Some("  ".to_string()))
            .with_filter("type", Some(vec!["issue"]))
            .unwrap()
            .with_filter::<Vec<String>>("owned_by", Some(vec![]))
            .unwrap()
            .with_filter::<String>("stage", None)
            .unwrap();
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"limit": 10, "type": ["issue"]}));
    }

    #[test]
    fn test_unserializable_filter_is_an_error() {
        use std::collections::HashMap;

        // JSON object keys must be strings.
        let mut by_tuple = HashMap::new();
        by_tuple.insert((1, 2), "x");
        let err = ListRequest::new()
            .with_filter("owned_by", Some(by_tuple))
            .unwrap_err();
        assert!(matches!(err, DevRevError::Serialization(_)));
    }

    #[test]
    fn test_list_response_from_body() {
        let body = json!({
            "parts": [{"id": "p1", "name": "Billing"}],
            "next_cursor": "abc"
        });
        let page: ListResponse<Part> =
            ListResponse::from_body(body.as_object().unwrap().clone()).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id(), "p1");
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn test_list_response_empty_cursor_is_none() {
        let body = json!({"parts": [], "next_cursor": ""});
        let page: ListResponse<Part> =
            ListResponse::from_body(body.as_object().unwrap().clone()).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_unwrap_object_missing_key() {
        let body = json!({"other": {}});
        let err = unwrap_object::<Part>(body.as_object().unwrap().clone()).unwrap_err();
        assert!(err.to_string().contains("'part'"));
    }
}
