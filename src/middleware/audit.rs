//! Structured audit events.
//!
//! Authentication outcomes and tool invocations are logged at INFO on the
//! `devrev_mcp::audit` target with `event_type = "audit"`, so a log sink can
//! route them separately from operational logs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Tracing target for audit events.
pub const AUDIT_TARGET: &str = "devrev_mcp::audit";

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turns audit emission on or off process-wide.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

/// Whether audit events are currently emitted.
#[must_use]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Audit category of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    /// list/get/count/export.
    Read,
    /// create/update/merge/transition.
    Write,
    /// delete.
    Delete,
    /// search and recommendations.
    Search,
    /// Anything else.
    Other,
}

impl ToolCategory {
    /// Lower-case name used in the event.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Read => "read",
            ToolCategory::Write => "write",
            ToolCategory::Delete => "delete",
            ToolCategory::Search => "search",
            ToolCategory::Other => "other",
        }
    }
}

const SUFFIX_CATEGORIES: &[(&str, ToolCategory)] = &[
    ("list", ToolCategory::Read),
    ("get", ToolCategory::Read),
    ("count", ToolCategory::Read),
    ("export", ToolCategory::Read),
    ("create", ToolCategory::Write),
    ("update", ToolCategory::Write),
    ("merge", ToolCategory::Write),
    ("transition", ToolCategory::Write),
    ("delete", ToolCategory::Delete),
];

/// Classifies a tool by its name.
///
/// Search wins over suffix rules, so `devrev_search_list` is `Search`.
#[must_use]
pub fn classify_tool(tool_name: &str) -> ToolCategory {
    let lower = tool_name.to_ascii_lowercase();
    if lower.contains("search") || lower.contains("recommendations") {
        return ToolCategory::Search;
    }
    SUFFIX_CATEGORIES
        .iter()
        .find(|(suffix, _)| {
            lower
                .strip_suffix(suffix)
                .is_some_and(|rest| rest.ends_with('_'))
        })
        .map(|(_, category)| *category)
        .unwrap_or(ToolCategory::Other)
}

/// Records a successful Bearer authentication.
pub fn auth_success(client_ip: &str, user_agent: &str) {
    if !is_enabled() {
        return;
    }
    tracing::info!(
        target: AUDIT_TARGET,
        event_type = "audit",
        action = "auth_success",
        principal = "static-token",
        client_ip,
        user_agent,
        "Authentication succeeded"
    );
}

/// Records a rejected request at the auth gate.
pub fn auth_failure(reason: &str, client_ip: &str, user_agent: &str) {
    if !is_enabled() {
        return;
    }
    tracing::info!(
        target: AUDIT_TARGET,
        event_type = "audit",
        action = "auth_failure",
        reason,
        client_ip,
        user_agent,
        "Authentication failed"
    );
}

/// Records a completed tool invocation.
///
/// `error_kind` is `None` on success.
pub fn tool_invocation(tool_name: &str, error_kind: Option<&str>, elapsed: Duration) {
    if !is_enabled() {
        return;
    }
    tracing::info!(
        target: AUDIT_TARGET,
        event_type = "audit",
        action = "tool_invocation",
        tool = tool_name,
        category = classify_tool(tool_name).as_str(),
        outcome = if error_kind.is_some() { "error" } else { "success" },
        error_kind = error_kind.unwrap_or(""),
        duration_ms = elapsed.as_millis() as u64,
        "Tool invoked"
    );
}
