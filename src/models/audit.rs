//! Audit models.
//!
//! Two kinds of audit data live here: [`AuditStep`], one line of a payslip's
//! calculation trace, and [`AuditEntry`], an event appended to the external
//! audit sink when a structure is created or a run finishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single step in a payslip's calculation trace.
///
/// Each step captures the input, output, and reasoning for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number, starting at 1.
    pub step_number: u32,
    /// The code of the component that was applied.
    pub rule_id: String,
    /// The human-readable name of the component.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the amount.
    pub reasoning: String,
}

/// The event an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// A new salary structure version was created.
    #[serde(rename = "salary_structure.created")]
    StructureCreated,
    /// A payroll run completed and its payslips were persisted.
    #[serde(rename = "payroll_run.completed")]
    RunCompleted,
    /// A payroll run failed and nothing was persisted.
    #[serde(rename = "payroll_run.failed")]
    RunFailed,
}

impl AuditAction {
    /// Returns the dotted action name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructureCreated => "salary_structure.created",
            Self::RunCompleted => "payroll_run.completed",
            Self::RunFailed => "payroll_run.failed",
        }
    }
}

/// Request context forwarded by the caller, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Correlation id of the originating request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Client IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client user agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// The authenticated user behind an operation, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The user's id.
    pub id: Uuid,
    /// Context of the request the user made.
    #[serde(default)]
    pub metadata: RequestMetadata,
}

impl Actor {
    /// An actor with no request context.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            metadata: RequestMetadata::default(),
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier for the entry.
    pub id: Uuid,
    /// Who performed the action.
    pub actor: Uuid,
    /// The organization the action belongs to.
    pub organization_id: Uuid,
    /// What happened.
    pub action: AuditAction,
    /// The kind of resource affected (e.g., "salary_structure").
    pub resource: String,
    /// The affected resource's id.
    pub resource_id: Uuid,
    /// State before the action, if it existed.
    pub before: Option<serde_json::Value>,
    /// State after the action.
    pub after: Option<serde_json::Value>,
    /// Whether the action succeeded.
    pub success: bool,
    /// Request context.
    pub metadata: RequestMetadata,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry stamped with a fresh id and the current time.
    pub fn new(
        actor: Uuid,
        organization_id: Uuid,
        action: AuditAction,
        resource: impl Into<String>,
        resource_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor,
            organization_id,
            action,
            resource: resource.into(),
            resource_id,
            before: None,
            after: None,
            success: true,
            metadata: RequestMetadata::default(),
            recorded_at: Utc::now(),
        }
    }

    /// Sets the before/after diff.
    pub fn with_diff(
        mut self,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    /// Sets the success flag.
    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    /// Sets the request context.
    pub fn with_metadata(mut self, metadata: RequestMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
