//! Tool and prompt input parameter structs.
//!
//! This module defines the input types for each MCP tool and prompt, with
//! JSON Schema derivation for MCP discovery.
//!
//! # Input Sanitization
//!
//! Tool inputs implement `sanitize()`. It trims string fields, drops blank
//! strings and removes blank entries from ID lists. Call it before
//! processing input.

use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;

/// Helper function to trim an optional string.
fn trim_option(s: &Option<String>) -> Option<String> {
    s.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Trims every entry and drops blanks; an empty result becomes `None`.
fn trim_list(list: &Option<Vec<String>>) -> Option<Vec<String>> {
    list.as_ref()
        .map(|items| {
            items
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|items| !items.is_empty())
}

/// Pagination parameters shared by the simple list tools.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct PageInput {
    /// Pagination cursor from a previous response's `next_cursor`.
    #[serde(default)]
    pub cursor: Option<String>,

    /// Maximum number of items to return (default: 25, max: 100).
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PageInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            cursor: trim_option(&self.cursor),
            limit: self.limit,
        }
    }
}

/// Input for tools that fetch one object by ID.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ObjectIdInput {
    /// The object ID (DON format, e.g. don:core:dvrv-us-1:devo/1:ticket/123).
    pub id: String,
}

impl ObjectIdInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            id: self.id.trim().to_string(),
        }
    }
}

/// Input parameters for devrev_works_list.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListWorksInput {
    /// Filter by work type(s): TICKET, ISSUE, TASK, OPPORTUNITY.
    #[serde(default, rename = "type")]
    pub work_type: Option<Vec<String>>,

    /// Filter by part ID(s) the work applies to.
    #[serde(default)]
    pub applies_to_part: Option<Vec<String>>,

    /// Filter by owner user ID(s).
    #[serde(default)]
    pub owned_by: Option<Vec<String>>,

    /// Pagination cursor from a previous response.
    #[serde(default)]
    pub cursor: Option<String>,

    /// Maximum number of items to return (default: 25, max: 100).
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListWorksInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            work_type: trim_list(&self.work_type),
            applies_to_part: trim_list(&self.applies_to_part),
            owned_by: trim_list(&self.owned_by),
            cursor: trim_option(&self.cursor),
            limit: self.limit,
        }
    }
}

/// Input parameters for devrev_works_create.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateWorkInput {
    /// Title of the work item.
    pub title: String,

    /// Part ID the work applies to.
    pub applies_to_part: String,

    /// Work type: TICKET, ISSUE, TASK, or OPPORTUNITY.
    #[serde(rename = "type")]
    pub work_type: String,

    /// User IDs who own this work item.
    pub owned_by: Vec<String>,

    /// Description/body of the work item.
    #[serde(default)]
    pub body: Option<String>,

    /// Issue priority: P0, P1, P2, P3.
    #[serde(default)]
    pub priority: Option<String>,

    /// Ticket severity: BLOCKER, HIGH, MEDIUM, LOW.
    #[serde(default)]
    pub severity: Option<String>,
}

impl CreateWorkInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            applies_to_part: self.applies_to_part.trim().to_string(),
            work_type: self.work_type.trim().to_string(),
            owned_by: trim_list(&Some(self.owned_by)).unwrap_or_default(),
            body: trim_option(&self.body),
            priority: trim_option(&self.priority),
            severity: trim_option(&self.severity),
        }
    }
}

/// Input parameters for devrev_works_update.
///
/// Only provided fields are changed.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateWorkInput {
    /// The work item ID to update.
    pub id: String,

    /// New title.
    #[serde(default)]
    pub title: Option<String>,

    /// New description/body.
    #[serde(default)]
    pub body: Option<String>,

    /// New full list of owner user IDs.
    #[serde(default)]
    pub owned_by: Option<Vec<String>>,

    /// New issue priority: P0, P1, P2, P3.
    #[serde(default)]
    pub priority: Option<String>,

    /// New ticket severity: BLOCKER, HIGH, MEDIUM, LOW.
    #[serde(default)]
    pub severity: Option<String>,
}

impl UpdateWorkInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            id: self.id.trim().to_string(),
            title: trim_option(&self.title),
            body: trim_option(&self.body),
            owned_by: trim_list(&self.owned_by),
            priority: trim_option(&self.priority),
            severity: trim_option(&self.severity),
        }
    }
}

/// Input parameters for devrev_incidents_list.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListIncidentsInput {
    /// Filter by stage(s), e.g. acknowledged, identified, mitigated, resolved.
    #[serde(default)]
    pub stage: Option<Vec<String>>,

    /// Filter by severity(ies), e.g. sev0, sev1, sev2, sev3.
    #[serde(default)]
    pub severity: Option<Vec<String>>,

    /// Pagination cursor from a previous response.
    #[serde(default)]
    pub cursor: Option<String>,

    /// Maximum number of items to return (default: 25, max: 100).
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListIncidentsInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            stage: trim_list(&self.stage),
            severity: trim_list(&self.severity),
            cursor: trim_option(&self.cursor),
            limit: self.limit,
        }
    }
}

/// Input parameters for devrev_search_hybrid.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HybridSearchInput {
    /// The search query string.
    pub query: String,

    /// Limit search to specific types: ACCOUNT, ARTICLE, CONVERSATION, WORK,
    /// USER, TAG, PART, REV_USER, DEV_USER.
    #[serde(default)]
    pub namespaces: Option<Vec<String>>,

    /// Weight for semantic vs keyword matching (0.0-1.0). Higher favors semantic.
    #[serde(default)]
    pub semantic_weight: Option<f64>,

    /// Pagination cursor from a previous response.
    #[serde(default)]
    pub cursor: Option<String>,

    /// Maximum number of results (default: 25, max: 100).
    #[serde(default)]
    pub limit: Option<u32>,
}

impl HybridSearchInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            query: self.query.trim().to_string(),
            namespaces: trim_list(&self.namespaces),
            semantic_weight: self.semantic_weight,
            cursor: trim_option(&self.cursor),
            limit: self.limit,
        }
    }
}

// ============================================================================
// Prompt arguments
// ============================================================================

/// Arguments for prompts that only need a ticket ID.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TicketPromptArgs {
    /// DevRev ticket ID (DON format).
    pub ticket_id: String,
}

/// Arguments for the investigate_issue prompt.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InvestigatePromptArgs {
    /// DevRev ticket ID.
    pub ticket_id: String,

    /// Investigation depth: shallow, standard, or deep (default: standard).
    #[serde(default)]
    pub depth: Option<String>,
}

/// Arguments for the draft_response prompt.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DraftResponsePromptArgs {
    /// DevRev ticket ID.
    pub ticket_id: String,

    /// Response tone: formal, friendly, technical, or professional (default).
    #[serde(default)]
    pub tone: Option<String>,

    /// Whether to search the knowledge base for relevant articles (default: true).
    #[serde(default)]
    pub include_kb: Option<bool>,
}

/// Arguments for the summarize_account prompt.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AccountPromptArgs {
    /// DevRev account ID.
    pub account_id: String,
}

/// Arguments for the escalate_ticket prompt.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EscalatePromptArgs {
    /// DevRev ticket ID to escalate.
    pub ticket_id: String,

    /// Reason for escalation.
    pub reason: String,
}
