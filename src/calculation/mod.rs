//! Calculation logic for the payroll engine.
//!
//! This module contains the pure payslip calculator, the final-step rounding
//! rule, batch computation across a run's employees and the reduction of
//! payslips into run totals.

mod batch;
mod payslip;
mod rounding;

pub use batch::{DEFAULT_PARALLEL_THRESHOLD, aggregate_totals, compute_batch};
pub use payslip::{ComponentAmountResult, apply_component, compute_payslip};
pub use rounding::round_net;
