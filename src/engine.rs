//! The payroll engine facade.
//!
//! [`PayrollEngine`] wires the structure store, the payslip calculator and
//! the run orchestrator over one pair of repositories and one audit sink.
//! It is the type callers (the HTTP layer, the binary, tests) hold on to.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::audit::AuditRecorder;
use crate::calculation;
use crate::error::EngineResult;
use crate::models::{
    Actor, EmployeeSalary, PayrollRun, Payslip, PayslipComputation, SalaryStructure,
    StructureDefinition,
};
use crate::payroll::PayrollOrchestrator;
use crate::store::{InMemoryStore, PayrollRepository, SalaryStructureRepository, SalaryStructureStore};

/// Entry point for every payroll operation.
#[derive(Clone)]
pub struct PayrollEngine {
    structures: SalaryStructureStore,
    orchestrator: PayrollOrchestrator,
}

impl PayrollEngine {
    /// Creates an engine over the given repositories.
    pub fn new(
        structure_repo: Arc<dyn SalaryStructureRepository>,
        run_repo: Arc<dyn PayrollRepository>,
        audit: Arc<dyn AuditRecorder>,
    ) -> Self {
        let structures = SalaryStructureStore::new(structure_repo, audit.clone());
        let orchestrator = PayrollOrchestrator::new(structures.clone(), run_repo, audit);
        Self {
            structures,
            orchestrator,
        }
    }

    /// Creates an engine backed by a fresh [`InMemoryStore`].
    pub fn in_memory(audit: Arc<dyn AuditRecorder>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(store.clone(), store, audit)
    }

    /// Sets the batch size at which run computation goes parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.orchestrator = self.orchestrator.with_parallel_threshold(threshold);
        self
    }

    /// Creates the next salary structure version for an organization.
    pub fn create_salary_structure(
        &self,
        organization_id: Uuid,
        definition: StructureDefinition,
        actor: &Actor,
    ) -> EngineResult<SalaryStructure> {
        self.structures
            .create_version(organization_id, definition, actor)
    }

    /// Returns the organization's highest-version structure.
    pub fn get_active_salary_structure(&self, organization_id: Uuid) -> EngineResult<SalaryStructure> {
        self.structures.get_active(organization_id)
    }

    /// Returns one structure version.
    pub fn get_salary_structure_version(
        &self,
        organization_id: Uuid,
        version: u32,
    ) -> EngineResult<SalaryStructure> {
        self.structures.get_version(organization_id, version)
    }

    /// Returns every structure version, oldest first.
    pub fn list_salary_structures(&self, organization_id: Uuid) -> EngineResult<Vec<SalaryStructure>> {
        self.structures.list_versions(organization_id)
    }

    /// Computes one payslip without persisting anything.
    pub fn compute_payslip(
        &self,
        structure: &SalaryStructure,
        base_salary: i64,
    ) -> EngineResult<PayslipComputation> {
        calculation::compute_payslip(structure, base_salary)
    }

    /// Runs payroll for a batch of employees. See
    /// [`PayrollOrchestrator::start_run`].
    pub fn start_payroll_run(
        &self,
        organization_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
        employees: Vec<EmployeeSalary>,
        actor: &Actor,
    ) -> EngineResult<PayrollRun> {
        self.orchestrator
            .start_run(organization_id, period_start, period_end, employees, actor)
    }

    /// Looks up a run within an organization.
    pub fn get_run(&self, run_id: Uuid, organization_id: Uuid) -> EngineResult<Option<PayrollRun>> {
        self.orchestrator.get_run(run_id, organization_id)
    }

    /// Returns every run of an organization, oldest first.
    pub fn list_runs(&self, organization_id: Uuid) -> EngineResult<Vec<PayrollRun>> {
        self.orchestrator.list_runs(organization_id)
    }

    /// Returns a run's payslips in batch order.
    pub fn list_payslips(&self, run_id: Uuid, organization_id: Uuid) -> EngineResult<Vec<Payslip>> {
        self.orchestrator.list_payslips(run_id, organization_id)
    }

    /// Fails runs left unfinished by an earlier process.
    pub fn recover_interrupted_runs(&self) -> EngineResult<Vec<PayrollRun>> {
        self.orchestrator.recover_interrupted_runs()
    }
}
