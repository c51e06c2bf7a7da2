//! Cursor pagination helpers shared by every list tool.
//!
//! List endpoints in the DevRev API all speak the same cursor/limit dialect
//! but name their item arrays differently (`works`, `accounts`, ...). This
//! module normalizes the request side ([`clamp_page_size`], [`Page`]) and
//! the response side ([`build_envelope`], [`PaginatedEnvelope`]) so every
//! tool presents one contract to the agent. Nothing here performs I/O.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Default page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Clamps a requested page size to `1..=maximum`.
///
/// `None` yields `default`. Out-of-range requests are corrected rather than
/// rejected.
///
/// # Example
///
/// ```
/// use devrev_mcp::pagination::clamp_page_size;
///
/// assert_eq!(clamp_page_size(None, 25, 100), 25);
/// assert_eq!(clamp_page_size(Some(500), 25, 100), 100);
/// assert_eq!(clamp_page_size(Some(0), 25, 100), 1);
/// ```
#[must_use]
pub fn clamp_page_size(requested: Option<u32>, default: u32, maximum: u32) -> u32 {
    match requested {
        None => default,
        Some(limit) => limit.min(maximum).max(1),
    }
}

/// Configured page-size bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Page size used when the caller gives none.
    pub default_page_size: u32,
    /// Upper bound on any page size.
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl PageLimits {
    /// Builds a page from caller input, clamping the limit and dropping empty cursors.
    #[must_use]
    pub fn page(&self, cursor: Option<String>, limit: Option<u32>) -> Page {
        Page {
            cursor: cursor.filter(|c| !c.trim().is_empty()),
            limit: clamp_page_size(limit, self.default_page_size, self.max_page_size),
        }
    }
}

/// Request-side cursor and limit for one list call.
///
/// Construct through [`PageLimits::page`] so `limit` is always in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Cursor returned by a previous call, if resuming.
    pub cursor: Option<String>,
    /// Number of items to request.
    pub limit: u32,
}

/// Response-side wrapper for one page of items.
///
/// Serializes as `{"count": n, "<label>": [...], "next_cursor": "..."}` with
/// `next_cursor` omitted entirely when there is no further page.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedEnvelope {
    label: String,
    items: Vec<Value>,
    next_cursor: Option<String>,
}

impl PaginatedEnvelope {
    /// Number of items on this page.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Key the items are emitted under.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The items, in upstream order.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Cursor for the next page. `None` means this is the last page.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    /// Converts the envelope into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("count".to_string(), Value::from(self.items.len()));
        map.insert(self.label.clone(), Value::Array(self.items.clone()));
        if let Some(cursor) = &self.next_cursor {
            map.insert("next_cursor".to_string(), Value::String(cursor.clone()));
        }
        Value::Object(map)
    }
}

impl Serialize for PaginatedEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.next_cursor.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("count", &self.items.len())?;
        map.serialize_entry(&self.label, &self.items)?;
        if let Some(cursor) = &self.next_cursor {
            map.serialize_entry("next_cursor", cursor)?;
        }
        map.end()
    }
}

/// Label used when the requested one would collide with an envelope key.
pub const FALLBACK_LABEL: &str = "items";

const RESERVED_LABELS: [&str; 2] = ["count", "next_cursor"];

/// Wraps one upstream page in a [`PaginatedEnvelope`].
///
/// An empty-string cursor is treated the same as no cursor. A blank label,
/// or one naming an envelope key (`count`, `next_cursor`), is replaced by
/// [`FALLBACK_LABEL`] so the serialized object never repeats a key.
#[must_use]
pub fn build_envelope(
    items: Vec<Value>,
    next_cursor: Option<String>,
    label: impl Into<String>,
) -> PaginatedEnvelope {
    let mut label = label.into();
    if label.is_empty() || RESERVED_LABELS.contains(&label.as_str()) {
        tracing::warn!(label = %label, "Reserved envelope label, using {:?}", FALLBACK_LABEL);
        label = FALLBACK_LABEL.to_string();
    }
    PaginatedEnvelope {
        label,
        items,
        next_cursor: next_cursor.filter(|c| !c.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_clamp_page_size() {
        assert_eq!(clamp_page_size(None, 25, 100), 25);
        assert_eq!(clamp_page_size(Some(500), 25, 100), 100);
        assert_eq!(clamp_page_size(Some(0), 25, 100), 1);
        assert_eq!(clamp_page_size(Some(40), 25, 100), 40);
        assert_eq!(clamp_page_size(Some(100), 25, 100), 100);
        assert_eq!(clamp_page_size(Some(1), 25, 100), 1);
    }

    #[test]
    fn test_page_limits_drop_blank_cursor() {
        let limits = PageLimits::default();
        let page = limits.page(Some("   ".to_string()), Some(1000));
        assert_eq!(page.cursor, None);
        assert_eq!(page.limit, MAX_PAGE_SIZE);

        let page = limits.page(Some("abc".to_string()), None);
        assert_eq!(page.cursor.as_deref(), Some("abc"));
        assert_eq!(page.limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_envelope_without_cursor_omits_key() {
        let envelope = build_envelope(vec![], None, "items");
        assert_eq!(serde_json::to_value(&envelope).unwrap(), json!({"count": 0, "items": []}));
        assert_eq!(envelope.to_value(), json!({"count": 0, "items": []}));
    }

    #[test]
    fn test_envelope_with_cursor() {
        let item = json!({"id": "don:core:work/1"});
        let envelope = build_envelope(vec![item.clone()], Some("abc".to_string()), "items");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"count": 1, "items": [item], "next_cursor": "abc"})
        );
        assert_eq!(envelope.next_cursor(), Some("abc"));
    }

    #[test]
    fn test_envelope_empty_cursor_is_no_cursor() {
        let envelope = build_envelope(vec![json!(1), json!(2)], Some(String::new()), "works");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value, json!({"count": 2, "works": [1, 2]}));
        assert!(value.get("next_cursor").is_none());
    }

    #[test]
    fn test_envelope_uses_label() {
        let envelope = build_envelope(vec![json!({"id": "a"})], None, "accounts");
        assert_eq!(envelope.label(), "accounts");
        assert_eq!(envelope.count(), 1);
        assert_eq!(envelope.to_value()["accounts"][0]["id"], "a");
    }

    #[test]
    fn test_reserved_label_falls_back() {
        for reserved in ["count", "next_cursor", ""] {
            let envelope =
                build_envelope(vec![json!({"id": "a"})], Some("c2".to_string()), reserved);
            assert_eq!(envelope.label(), FALLBACK_LABEL);

            let serialized = serde_json::to_string(&envelope).unwrap();
            assert_eq!(serialized.matches("\"count\"").count(), 1);
            assert_eq!(serialized.matches("\"next_cursor\"").count(), 1);
            assert_eq!(
                serde_json::from_str::<Value>(&serialized).unwrap(),
                envelope.to_value()
            );
        }
    }
}
