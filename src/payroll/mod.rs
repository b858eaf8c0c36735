//! Payroll run orchestration.
//!
//! This module drives batches of employees through the payslip calculator
//! and owns the run lifecycle: snapshot, compute, persist atomically, lock.

mod orchestrator;


pub use orchestrator::{INTERRUPTED_RUN_REASON, PayrollOrchestrator};
