//! Work item models: tickets, issues, tasks and opportunities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;

/// Kind of work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkType {
    /// Customer-facing ticket.
    Ticket,
    /// Engineering issue.
    Issue,
    /// Task.
    Task,
    /// Sales opportunity.
    Opportunity,
}

impl WorkType {
    /// All variants, in display order.
    pub const ALL: [WorkType; 4] = [
        WorkType::Ticket,
        WorkType::Issue,
        WorkType::Task,
        WorkType::Opportunity,
    ];

    /// Upper-case name accepted from tool callers.
    pub fn name(&self) -> &'static str {
        match self {
            WorkType::Ticket => "TICKET",
            WorkType::Issue => "ISSUE",
            WorkType::Task => "TASK",
            WorkType::Opportunity => "OPPORTUNITY",
        }
    }

    /// Parses a work type case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(value.trim()))
    }
}

/// Issue priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuePriority {
    /// Highest.
    P0,
    /// High.
    P1,
    /// Medium.
    P2,
    /// Low.
    P3,
}

impl IssuePriority {
    /// All variants.
    pub const ALL: [IssuePriority; 4] = [
        IssuePriority::P0,
        IssuePriority::P1,
        IssuePriority::P2,
        IssuePriority::P3,
    ];

    /// Upper-case name accepted from tool callers.
    pub fn name(&self) -> &'static str {
        match self {
            IssuePriority::P0 => "P0",
            IssuePriority::P1 => "P1",
            IssuePriority::P2 => "P2",
            IssuePriority::P3 => "P3",
        }
    }

    /// Parses a priority case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(value.trim()))
    }
}

/// Ticket severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketSeverity {
    /// Blocks the customer.
    Blocker,
    /// High.
    High,
    /// Medium.
    Medium,
    /// Low.
    Low,
}

impl TicketSeverity {
    /// All variants.
    pub const ALL: [TicketSeverity; 4] = [
        TicketSeverity::Blocker,
        TicketSeverity::High,
        TicketSeverity::Medium,
        TicketSeverity::Low,
    ];

    /// Upper-case name accepted from tool callers.
    pub fn name(&self) -> &'static str {
        match self {
            TicketSeverity::Blocker => "BLOCKER",
            TicketSeverity::High => "HIGH",
            TicketSeverity::Medium => "MEDIUM",
            TicketSeverity::Low => "LOW",
        }
    }

    /// Parses a severity case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(value.trim()))
    }
}

/// A DevRev work item.
///
/// Only the fields used for display are typed; everything else the API
/// returns is preserved in `extra` and passed through to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    /// Object ID (a DON).
    pub id: String,

    /// Short human-readable ID, e.g. `TKT-12`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,

    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Work type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub work_type: Option<WorkType>,

    /// Description body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Stage object (`{"name": ...}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Value>,

    /// Issue priority (issues only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<IssuePriority>,

    /// Ticket severity (tickets only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<TicketSeverity>,

    /// Owners (user summaries).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owned_by: Vec<Value>,

    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Work {
    /// Returns the stage name, if any.
    pub fn stage_name(&self) -> Option<&str> {
        self.stage
            .as_ref()
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
    }
}

impl Resource for Work {
    const ENDPOINT: &'static str = "works";
    const SINGULAR: &'static str = "work";
    const PLURAL: &'static str = "works";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Body of `/works.create`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateWorkRequest {
    /// Title.
    pub title: String,
    /// Part the work applies to.
    pub applies_to_part: String,
    /// Work type.
    #[serde(rename = "type")]
    pub work_type: WorkType,
    /// Owner user IDs.
    pub owned_by: Vec<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Priority (issues).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<IssuePriority>,
    /// Severity (tickets).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<TicketSeverity>,
}

/// Body of `/works.update`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateWorkRequest {
    /// Work item to update.
    pub id: String,
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Replacement owner list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<OwnedBySet>,
    /// New priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<IssuePriority>,
    /// New severity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<TicketSeverity>,
}

impl UpdateWorkRequest {
    /// True when no field besides `id` is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.owned_by.is_none()
            && self.priority.is_none()
            && self.severity.is_none()
    }
}

/// Replace-semantics wrapper DevRev expects for list fields on update.
#[derive(Debug, Clone, Serialize)]
pub struct OwnedBySet {
    /// New full set of owner IDs.
    pub set: Vec<String>,
}
