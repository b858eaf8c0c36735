//! Payslip models.
//!
//! This module contains the pure [`PayslipComputation`] produced by the
//! calculator and the persisted [`Payslip`] record that a completed run
//! writes for each employee.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuditStep, CalculationType, ComponentType, PayrollRun};

/// One employee submitted to a payroll run.
///
/// Supplied by the employee directory; base salary is in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSalary {
    /// Identifier of the employee in the directory.
    pub employee_id: String,
    /// Base salary for the period, in minor units.
    pub base_salary: i64,
}

/// A component's contribution to one payslip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipComponent {
    /// Component display name.
    pub name: String,
    /// Component code.
    pub code: String,
    /// Earning or deduction.
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    /// How the amount was derived.
    pub calculation_type: CalculationType,
    /// The amount, in (possibly fractional) minor units.
    pub amount: Decimal,
    /// True when a cap reduced the computed amount.
    #[serde(default)]
    pub capped: bool,
}

/// The full breakdown for one base salary under one structure.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayslipComputation;
/// use rust_decimal::Decimal;
///
/// let computation = PayslipComputation {
///     base_salary: 50000,
///     gross: Decimal::new(50000, 0),
///     deductions: Decimal::ZERO,
///     net: Decimal::new(50000, 0),
///     net_rounded: 50000,
///     components: vec![],
///     audit_steps: vec![],
/// };
/// assert_eq!(computation.net_rounded, 50000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipComputation {
    /// Base salary, in minor units.
    pub base_salary: i64,
    /// Base salary plus every earning.
    pub gross: Decimal,
    /// Sum of every deduction.
    pub deductions: Decimal,
    /// `gross - deductions`, unrounded.
    pub net: Decimal,
    /// `net` rounded half-up on its magnitude, in minor units.
    pub net_rounded: i64,
    /// Per-component amounts, in structure definition order.
    pub components: Vec<PayslipComponent>,
    /// How each amount was reached.
    pub audit_steps: Vec<AuditStep>,
}

/// A persisted payslip belonging to a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payslip {
    /// Unique identifier for the payslip.
    pub id: Uuid,
    /// The run that produced this payslip.
    pub payroll_run_id: Uuid,
    /// The owning organization.
    pub organization_id: Uuid,
    /// The structure version the run snapshotted.
    pub salary_structure_id: Uuid,
    /// The snapshotted structure's version number.
    pub structure_version: u32,
    /// The employee this payslip is for.
    pub employee_id: String,
    /// Base salary, in minor units.
    pub base_salary: i64,
    /// Base salary plus every earning.
    pub gross: Decimal,
    /// Sum of every deduction.
    pub deductions: Decimal,
    /// Unrounded net.
    pub net: Decimal,
    /// Rounded net, in minor units.
    pub net_rounded: i64,
    /// Per-component amounts, in structure definition order.
    pub components: Vec<PayslipComponent>,
    /// When the payslip was staged.
    pub created_at: DateTime<Utc>,
}

impl Payslip {
    /// Builds the record for `employee_id` from a computation staged by `run`.
    pub fn from_computation(
        run: &PayrollRun,
        employee_id: &str,
        computation: PayslipComputation,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            payroll_run_id: run.id,
            organization_id: run.organization_id,
            salary_structure_id: run.salary_structure_id,
            structure_version: run.structure_version,
            employee_id: employee_id.to_string(),
            base_salary: computation.base_salary,
            gross: computation.gross,
            deductions: computation.deductions,
            net: computation.net,
            net_rounded: computation.net_rounded,
            components: computation.components,
            created_at: Utc::now(),
        }
    }
}
