//! Persistence traits.
//!
//! The engine talks to storage only through these traits. Implementations
//! must honour two rules: structures are never rewritten once inserted, and a
//! run is only updated by compare-and-set against the state the caller last
//! saw, which makes it impossible to overwrite a locked run.

use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{PayrollRun, Payslip, SalaryStructure};

/// Storage for salary structure versions.
pub trait SalaryStructureRepository: Send + Sync {
    /// Returns the highest-version structure for `organization_id`.
    fn find_latest(&self, organization_id: Uuid) -> EngineResult<Option<SalaryStructure>>;

    /// Returns one specific version.
    fn find_version(
        &self,
        organization_id: Uuid,
        version: u32,
    ) -> EngineResult<Option<SalaryStructure>>;

    /// Returns every version for the organization, oldest first.
    fn list_versions(&self, organization_id: Uuid) -> EngineResult<Vec<SalaryStructure>>;

    /// Inserts a new version.
    ///
    /// Fails with `Persistence` if the version is not exactly one more than
    /// the current latest, which catches two writers racing for the same
    /// version number.
    fn insert(&self, structure: SalaryStructure) -> EngineResult<()>;
}

/// Storage for payroll runs and their payslips.
pub trait PayrollRepository: Send + Sync {
    /// Inserts a freshly created run.
    fn insert_run(&self, run: &PayrollRun) -> EngineResult<()>;

    /// Replaces `current` with `next`.
    ///
    /// Fails with `RunLocked` if the stored run is locked and with
    /// `InvalidTransition` if its status no longer matches `current.status`.
    fn update_run(&self, current: &PayrollRun, next: &PayrollRun) -> EngineResult<()>;

    /// Looks up a run within an organization.
    fn find_run(&self, run_id: Uuid, organization_id: Uuid) -> EngineResult<Option<PayrollRun>>;

    /// Returns every run for the organization, oldest first.
    fn list_runs(&self, organization_id: Uuid) -> EngineResult<Vec<PayrollRun>>;

    /// Returns every run, in any organization, that is not yet terminal.
    fn find_unfinished_runs(&self) -> EngineResult<Vec<PayrollRun>>;

    /// Persists all payslips of a run in one all-or-nothing write.
    fn insert_payslips(&self, run_id: Uuid, payslips: Vec<Payslip>) -> EngineResult<()>;

    /// Returns a run's payslips in batch order.
    fn list_payslips(&self, run_id: Uuid, organization_id: Uuid) -> EngineResult<Vec<Payslip>>;

    /// Removes every payslip of a run, returning how many were removed.
    fn delete_payslips(&self, run_id: Uuid) -> EngineResult<usize>;
}
