//! Request types for the payroll API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Component, EmployeeSalary, StructureDefinition};

/// Request body for `POST /organizations/:org/salary-structures`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStructureRequest {
    /// The user creating the version.
    pub actor_id: Uuid,
    /// Display name of the structure.
    pub name: String,
    /// First date the structure applies to.
    pub effective_from: NaiveDate,
    /// Last date the structure applies to, if bounded.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    /// Ordered component rules.
    pub components: Vec<Component>,
}

impl From<CreateStructureRequest> for StructureDefinition {
    fn from(req: CreateStructureRequest) -> Self {
        StructureDefinition {
            name: req.name,
            effective_from: req.effective_from,
            effective_to: req.effective_to,
            components: req.components,
        }
    }
}

/// Request body for `POST /organizations/:org/payroll-runs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRunRequest {
    /// The user starting the run.
    pub actor_id: Uuid,
    /// First day of the pay period.
    pub period_start: NaiveDate,
    /// Last day of the pay period.
    pub period_end: NaiveDate,
    /// Employees to pay, in payslip order.
    pub employees: Vec<EmployeeSalary>,
}

/// Request body for `POST /payslips/preview`.
///
/// Computes a payslip against an ad-hoc structure without storing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    /// The structure to evaluate.
    pub structure: StructureDefinition,
    /// Base salary in minor units.
    pub base_salary: i64,
}
