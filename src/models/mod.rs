//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod payroll_run;
mod payslip;
mod salary_structure;

pub use audit::{Actor, AuditAction, AuditEntry, AuditStep, RequestMetadata};
pub use payroll_run::{PayrollRun, RunEvent, RunOutcome, RunStatus, RunTotals};
pub use payslip::{EmployeeSalary, Payslip, PayslipComponent, PayslipComputation};
pub use salary_structure::{
    CalculationType, Component, ComponentType, SalaryStructure, StructureDefinition,
};
