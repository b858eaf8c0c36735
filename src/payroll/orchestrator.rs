//! Payroll run orchestration.
//!
//! [`PayrollOrchestrator::start_run`] drives one batch of employees from a
//! pending run to a terminal one within a single call:
//!
//! 1. snapshot the organization's active structure into a pending run
//! 2. move the run to processing
//! 3. compute every employee, staging payslips in memory
//! 4. write all payslips in one batch, then complete and lock the run
//!
//! Any failure after the run exists marks it failed and locked, appends a
//! failure audit entry and hands the original error back. No payslip of a
//! failed run is ever left in storage.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audit::AuditRecorder;
use crate::calculation::{DEFAULT_PARALLEL_THRESHOLD, aggregate_totals, compute_batch};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Actor, AuditAction, AuditEntry, EmployeeSalary, PayrollRun, Payslip, RunEvent, RunOutcome,
    RunStatus, SalaryStructure,
};
use crate::store::{PayrollRepository, SalaryStructureStore};

/// Failure reason recorded on runs found unfinished at startup.
pub const INTERRUPTED_RUN_REASON: &str = "run interrupted before reaching a terminal state";

/// Runs payroll batches against versioned salary structures.
#[derive(Clone)]
pub struct PayrollOrchestrator {
    structures: SalaryStructureStore,
    runs: Arc<dyn PayrollRepository>,
    audit: Arc<dyn AuditRecorder>,
    parallel_threshold: usize,
}

impl PayrollOrchestrator {
    /// Creates an orchestrator with the default parallel threshold.
    pub fn new(
        structures: SalaryStructureStore,
        runs: Arc<dyn PayrollRepository>,
        audit: Arc<dyn AuditRecorder>,
    ) -> Self {
        Self {
            structures,
            runs,
            audit,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Sets the batch size at which employees are computed in parallel.
    /// Zero keeps every batch sequential.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Runs payroll for `employees` over the given period.
    ///
    /// # Returns
    ///
    /// The completed, locked run. Errors raised before the run exists
    /// (`Validation` for a malformed batch, `NotFound` when the organization
    /// has no structure) leave nothing behind. Errors raised after it exists
    /// (`ExcessDeductions`, `Persistence`) are returned unchanged once the
    /// run has been marked failed with zero payslips.
    pub fn start_run(
        &self,
        organization_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
        employees: Vec<EmployeeSalary>,
        actor: &Actor,
    ) -> EngineResult<PayrollRun> {
        validate_batch(period_start, period_end, &employees)?;

        let structure = self.structures.get_active(organization_id)?;
        let run = PayrollRun::snapshot(
            &structure,
            period_start,
            period_end,
            employees.len(),
            actor.id,
        );
        self.runs.insert_run(&run)?;

        info!(
            organization_id = %organization_id,
            run_id = %run.id,
            structure_version = run.structure_version,
            employee_count = employees.len(),
            "Payroll run created"
        );

        let start_time = Instant::now();
        let processing = match self.advance(&run, RunEvent::Start, None) {
            Ok(processing) => processing,
            Err(err) => return Err(self.abort(&run, err, actor)),
        };

        match self.process(&processing, &structure, &employees) {
            Ok(completed) => {
                info!(
                    organization_id = %organization_id,
                    run_id = %completed.id,
                    employee_count = employees.len(),
                    gross = %completed.totals.gross,
                    net = completed.totals.net,
                    duration_us = start_time.elapsed().as_micros() as u64,
                    "Payroll run completed"
                );
                self.audit.append(
                    AuditEntry::new(
                        actor.id,
                        organization_id,
                        AuditAction::RunCompleted,
                        "payroll_run",
                        completed.id,
                    )
                    .with_diff(
                        serde_json::to_value(&processing).ok(),
                        serde_json::to_value(&completed).ok(),
                    )
                    .with_metadata(actor.metadata.clone()),
                );
                Ok(completed)
            }
            Err(err) => Err(self.abort(&processing, err, actor)),
        }
    }

    /// Computes, persists and completes a processing run.
    fn process(
        &self,
        processing: &PayrollRun,
        structure: &SalaryStructure,
        employees: &[EmployeeSalary],
    ) -> EngineResult<PayrollRun> {
        let computations = compute_batch(structure, employees, self.parallel_threshold)?;

        let payslips: Vec<Payslip> = computations
            .into_iter()
            .zip(employees)
            .map(|(computation, employee)| {
                Payslip::from_computation(processing, &employee.employee_id, computation)
            })
            .collect();
        let totals = aggregate_totals(&payslips)?;

        self.runs.insert_payslips(processing.id, payslips)?;

        let outcome = RunOutcome::Completed {
            totals,
            at: Utc::now(),
        };
        match self.advance(processing, RunEvent::Complete, Some(outcome)) {
            Ok(completed) => Ok(completed),
            Err(err) => {
                // The run never completed, so the batch must not survive it.
                if let Err(rollback) = self.runs.delete_payslips(processing.id) {
                    error!(
                        run_id = %processing.id,
                        error = %rollback,
                        "Failed to roll back payslips of an uncompleted run"
                    );
                }
                Err(err)
            }
        }
    }

    /// Applies `event` to `current` and persists the result.
    fn advance(
        &self,
        current: &PayrollRun,
        event: RunEvent,
        outcome: Option<RunOutcome>,
    ) -> EngineResult<PayrollRun> {
        let next = current.apply(event, outcome)?;
        self.runs.update_run(current, &next)?;
        Ok(next)
    }

    /// Marks `current` failed, audits it and returns `err` for the caller.
    fn abort(&self, current: &PayrollRun, err: EngineError, actor: &Actor) -> EngineError {
        warn!(
            organization_id = %current.organization_id,
            run_id = %current.id,
            error = %err,
            "Payroll run failed"
        );

        let outcome = RunOutcome::Failed {
            reason: err.to_string(),
            at: Utc::now(),
        };
        let failed = match self.advance(current, RunEvent::Fail, Some(outcome)) {
            Ok(failed) => Some(failed),
            Err(persist_err) => {
                error!(
                    run_id = %current.id,
                    error = %persist_err,
                    "Could not record payroll run failure; recovery will close it"
                );
                None
            }
        };

        self.audit.append(
            AuditEntry::new(
                actor.id,
                current.organization_id,
                AuditAction::RunFailed,
                "payroll_run",
                current.id,
            )
            .with_diff(
                serde_json::to_value(current).ok(),
                failed.as_ref().and_then(|f| serde_json::to_value(f).ok()),
            )
            .with_success(false)
            .with_metadata(actor.metadata.clone()),
        );

        err
    }

    /// Fails every run left pending or processing, e.g. by a crash.
    ///
    /// Any payslips stored for such a run are removed before it is marked
    /// failed. Returns the runs that were closed.
    pub fn recover_interrupted_runs(&self) -> EngineResult<Vec<PayrollRun>> {
        let mut recovered = Vec::new();

        for run in self.runs.find_unfinished_runs()? {
            let removed = self.runs.delete_payslips(run.id)?;
            let outcome = RunOutcome::Failed {
                reason: INTERRUPTED_RUN_REASON.to_string(),
                at: Utc::now(),
            };
            let failed = self.advance(&run, RunEvent::Fail, Some(outcome))?;

            warn!(
                organization_id = %run.organization_id,
                run_id = %run.id,
                previous_status = %run.status,
                payslips_removed = removed,
                "Interrupted payroll run marked failed"
            );

            self.audit.append(
                AuditEntry::new(
                    run.created_by,
                    run.organization_id,
                    AuditAction::RunFailed,
                    "payroll_run",
                    run.id,
                )
                .with_diff(
                    serde_json::to_value(&run).ok(),
                    serde_json::to_value(&failed).ok(),
                )
                .with_success(false),
            );

            recovered.push(failed);
        }

        Ok(recovered)
    }

    /// Looks up a run within an organization.
    pub fn get_run(&self, run_id: Uuid, organization_id: Uuid) -> EngineResult<Option<PayrollRun>> {
        self.runs.find_run(run_id, organization_id)
    }

    /// Returns every run of an organization, oldest first.
    pub fn list_runs(&self, organization_id: Uuid) -> EngineResult<Vec<PayrollRun>> {
        self.runs.list_runs(organization_id)
    }

    /// Returns a run's payslips in batch order.
    ///
    /// Fails with `NotFound` if the run does not exist in the organization.
    /// Only a completed run lists payslips. Rows written while a run is
    /// still processing stay hidden, since a failed completion removes them.
    pub fn list_payslips(&self, run_id: Uuid, organization_id: Uuid) -> EngineResult<Vec<Payslip>> {
        match self.runs.find_run(run_id, organization_id)? {
            None => Err(EngineError::not_found("Payroll run", run_id)),
            Some(run) if run.status != RunStatus::Completed => Ok(Vec::new()),
            Some(_) => self.runs.list_payslips(run_id, organization_id),
        }
    }
}

/// Rejects a batch before any run is created for it.
fn validate_batch(
    period_start: NaiveDate,
    period_end: NaiveDate,
    employees: &[EmployeeSalary],
) -> EngineResult<()> {
    if period_end < period_start {
        return Err(EngineError::validation(format!(
            "period_end {} is before period_start {}",
            period_end, period_start
        )));
    }
    if employees.is_empty() {
        return Err(EngineError::validation(
            "payroll run requires at least one employee",
        ));
    }

    let mut seen = HashSet::with_capacity(employees.len());
    for employee in employees {
        if employee.employee_id.trim().is_empty() {
            return Err(EngineError::validation("employee_id is required"));
        }
        if employee.base_salary < 0 {
            return Err(EngineError::validation(format!(
                "employee {}: base_salary must not be negative",
                employee.employee_id
            )));
        }
        if !seen.insert(employee.employee_id.as_str()) {
            return Err(EngineError::validation(format!(
                "employee {} appears more than once in the batch",
                employee.employee_id
            )));
        }
    }

    Ok(())
}
