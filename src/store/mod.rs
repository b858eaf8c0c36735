//! Storage for salary structures, payroll runs and payslips.
//!
//! This module defines the repository traits the engine persists through,
//! an in-memory implementation of them, and the [`SalaryStructureStore`]
//! service that owns structure versioning.

mod memory;
mod repository;
mod structures;

pub use memory::InMemoryStore;
pub use repository::{PayrollRepository, SalaryStructureRepository};
pub use structures::SalaryStructureStore;
