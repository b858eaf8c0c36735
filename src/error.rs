//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the engine can report: malformed structure definitions,
//! missing records, excess deductions, persistence failures and run state
//! violations.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{RunEvent, RunStatus};

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::Validation {
///     message: "components must not be empty".to_string(),
/// };
/// assert_eq!(error.to_string(), "Validation failed: components must not be empty");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A structure definition or run request was malformed.
    #[error("Validation failed: {message}")]
    Validation {
        /// A description of what was invalid.
        message: String,
    },

    /// A structure, run or payslip could not be found.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// The kind of record that was looked up.
        resource: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Total deductions exceeded gross pay for one employee.
    #[error("{}", excess_deductions_message(employee_id.as_deref(), gross, deductions))]
    ExcessDeductions {
        /// The employee whose payslip failed, when computed inside a run.
        employee_id: Option<String>,
        /// Gross pay at the end of the component pass.
        gross: Decimal,
        /// Total deductions at the end of the component pass.
        deductions: Decimal,
    },

    /// The persistence layer rejected a write.
    #[error("Persistence error: {message}")]
    Persistence {
        /// A description of the storage failure.
        message: String,
    },

    /// Another writer took the structure version this insert expected.
    #[error("Version conflict for organization {organization_id}: expected version {expected}, got {actual}")]
    VersionConflict {
        /// The organization whose version history was written.
        organization_id: Uuid,
        /// The version the store would accept next.
        expected: u32,
        /// The version the insert carried.
        actual: u32,
    },

    /// A run was asked to make a transition its state machine forbids.
    #[error("Invalid run transition: cannot {event} a {from} run")]
    InvalidTransition {
        /// The status the run was in.
        from: RunStatus,
        /// The event that was rejected.
        event: RunEvent,
    },

    /// A locked run was asked to change.
    #[error("Payroll run {run_id} is locked")]
    RunLocked {
        /// The locked run.
        run_id: Uuid,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

fn excess_deductions_message(employee_id: Option<&str>, gross: &Decimal, deductions: &Decimal) -> String {
    match employee_id {
        Some(id) => format!(
            "Deductions {} exceed gross {} for employee {}",
            deductions.normalize(),
            gross.normalize(),
            id
        ),
        None => format!(
            "Deductions {} exceed gross {}",
            deductions.normalize(),
            gross.normalize()
        ),
    }
}

impl EngineError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a missing record.
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Shorthand for a storage failure.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Attaches the employee id to an excess-deductions error raised by the
    /// calculator, leaving every other variant untouched.
    pub fn for_employee(self, employee: &str) -> Self {
        match self {
            Self::ExcessDeductions {
                gross, deductions, ..
            } => Self::ExcessDeductions {
                employee_id: Some(employee.to_string()),
                gross,
                deductions,
            },
            other => other,
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
