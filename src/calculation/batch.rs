//! Batch payslip computation and run totals.
//!
//! Employees in a batch are independent, so large batches are computed on
//! rayon's thread pool. Results always come back in input order and totals
//! are reduced over that ordered list, so parallelism never changes the
//! outcome of a run.

use rayon::prelude::*;
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeSalary, Payslip, PayslipComputation, RunTotals, SalaryStructure};

use super::payslip::compute_payslip;

/// Default batch size at which computation moves onto the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Computes every employee in `employees` under `structure`.
///
/// Batches of at least `parallel_threshold` employees are computed in
/// parallel. On failure the error of the first failing employee in input
/// order is returned, tagged with that employee's id, so the reported
/// failure does not depend on scheduling.
pub fn compute_batch(
    structure: &SalaryStructure,
    employees: &[EmployeeSalary],
    parallel_threshold: usize,
) -> EngineResult<Vec<PayslipComputation>> {
    let compute = |employee: &EmployeeSalary| {
        compute_payslip(structure, employee.base_salary)
            .map_err(|e| e.for_employee(&employee.employee_id))
    };

    let results: Vec<EngineResult<PayslipComputation>> =
        if parallel_threshold > 0 && employees.len() >= parallel_threshold {
            employees.par_iter().map(compute).collect()
        } else {
            employees.iter().map(compute).collect()
        };

    results.into_iter().collect()
}

/// Sums a run's payslips into its totals.
///
/// `net` is the sum of each payslip's already-rounded `net_rounded`, not the
/// rounded sum of exact nets. A sum that overflows is a `Validation` error.
pub fn aggregate_totals(payslips: &[Payslip]) -> EngineResult<RunTotals> {
    let overflow = |field: &str| {
        EngineError::validation(format!("run total {} overflows", field))
    };

    payslips.iter().try_fold(
        RunTotals {
            gross: Decimal::ZERO,
            deductions: Decimal::ZERO,
            net: 0,
        },
        |acc, p| {
            Ok(RunTotals {
                gross: acc.gross.checked_add(p.gross).ok_or_else(|| overflow("gross"))?,
                deductions: acc
                    .deductions
                    .checked_add(p.deductions)
                    .ok_or_else(|| overflow("deductions"))?,
                net: acc
                    .net
                    .checked_add(p.net_rounded)
                    .ok_or_else(|| overflow("net"))?,
            })
        },
    )
}
