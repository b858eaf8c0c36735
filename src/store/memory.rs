//! In-memory repository.
//!
//! Backs the binary and the test suite. Every write takes a single write
//! lock, so a batch of payslips becomes visible all at once or not at all.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{PayrollRun, Payslip, SalaryStructure};

use super::repository::{PayrollRepository, SalaryStructureRepository};

fn poisoned<T>(_: PoisonError<T>) -> EngineError {
    EngineError::persistence("store lock poisoned")
}

/// Thread-safe in-memory storage for structures, runs and payslips.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// Structure versions per organization, ascending by version.
    structures: RwLock<HashMap<Uuid, Vec<SalaryStructure>>>,
    /// Runs by id, plus insertion order for listing.
    runs: RwLock<(HashMap<Uuid, PayrollRun>, Vec<Uuid>)>,
    /// Payslips per run, in batch order.
    payslips: RwLock<HashMap<Uuid, Vec<Payslip>>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SalaryStructureRepository for InMemoryStore {
    fn find_latest(&self, organization_id: Uuid) -> EngineResult<Option<SalaryStructure>> {
        let structures = self.structures.read().map_err(poisoned)?;
        Ok(structures
            .get(&organization_id)
            .and_then(|versions| versions.iter().max_by_key(|s| s.version))
            .cloned())
    }

    fn find_version(
        &self,
        organization_id: Uuid,
        version: u32,
    ) -> EngineResult<Option<SalaryStructure>> {
        let structures = self.structures.read().map_err(poisoned)?;
        Ok(structures
            .get(&organization_id)
            .and_then(|versions| versions.iter().find(|s| s.version == version))
            .cloned())
    }

    fn list_versions(&self, organization_id: Uuid) -> EngineResult<Vec<SalaryStructure>> {
        let structures = self.structures.read().map_err(poisoned)?;
        Ok(structures
            .get(&organization_id)
            .cloned()
            .unwrap_or_default())
    }

    fn insert(&self, structure: SalaryStructure) -> EngineResult<()> {
        let mut structures = self.structures.write().map_err(poisoned)?;
        let versions = structures.entry(structure.organization_id).or_default();

        let expected = versions.last().map_or(1, |s| s.version + 1);
        if structure.version != expected {
            return Err(EngineError::VersionConflict {
                organization_id: structure.organization_id,
                expected,
                actual: structure.version,
            });
        }

        versions.push(structure);
        Ok(())
    }
}

impl PayrollRepository for InMemoryStore {
    fn insert_run(&self, run: &PayrollRun) -> EngineResult<()> {
        let mut guard = self.runs.write().map_err(poisoned)?;
        let (runs, order) = &mut *guard;

        if runs.contains_key(&run.id) {
            return Err(EngineError::persistence(format!(
                "payroll run {} already exists",
                run.id
            )));
        }

        runs.insert(run.id, run.clone());
        order.push(run.id);
        Ok(())
    }

    fn update_run(&self, current: &PayrollRun, next: &PayrollRun) -> EngineResult<()> {
        let mut guard = self.runs.write().map_err(poisoned)?;
        let (runs, _) = &mut *guard;

        let stored = runs
            .get_mut(&current.id)
            .ok_or_else(|| EngineError::not_found("Payroll run", current.id))?;

        if stored.locked {
            return Err(EngineError::RunLocked { run_id: stored.id });
        }
        if stored.status != current.status {
            return Err(EngineError::InvalidTransition {
                from: stored.status,
                event: event_between(current, next),
            });
        }

        *stored = next.clone();
        Ok(())
    }

    fn find_run(&self, run_id: Uuid, organization_id: Uuid) -> EngineResult<Option<PayrollRun>> {
        let guard = self.runs.read().map_err(poisoned)?;
        Ok(guard
            .0
            .get(&run_id)
            .filter(|run| run.organization_id == organization_id)
            .cloned())
    }

    fn list_runs(&self, organization_id: Uuid) -> EngineResult<Vec<PayrollRun>> {
        let guard = self.runs.read().map_err(poisoned)?;
        let (runs, order) = &*guard;
        Ok(order
            .iter()
            .filter_map(|id| runs.get(id))
            .filter(|run| run.organization_id == organization_id)
            .cloned()
            .collect())
    }

    fn find_unfinished_runs(&self) -> EngineResult<Vec<PayrollRun>> {
        let guard = self.runs.read().map_err(poisoned)?;
        let (runs, order) = &*guard;
        Ok(order
            .iter()
            .filter_map(|id| runs.get(id))
            .filter(|run| !run.status.is_terminal())
            .cloned()
            .collect())
    }

    fn insert_payslips(&self, run_id: Uuid, payslips: Vec<Payslip>) -> EngineResult<()> {
        if let Some(stray) = payslips.iter().find(|p| p.payroll_run_id != run_id) {
            return Err(EngineError::persistence(format!(
                "payslip {} belongs to run {}, not {}",
                stray.id, stray.payroll_run_id, run_id
            )));
        }

        let mut all = self.payslips.write().map_err(poisoned)?;
        if all.get(&run_id).is_some_and(|existing| !existing.is_empty()) {
            return Err(EngineError::persistence(format!(
                "payslips for run {} were already written",
                run_id
            )));
        }

        all.insert(run_id, payslips);
        Ok(())
    }

    fn list_payslips(&self, run_id: Uuid, organization_id: Uuid) -> EngineResult<Vec<Payslip>> {
        let all = self.payslips.read().map_err(poisoned)?;
        Ok(all
            .get(&run_id)
            .map(|payslips| {
                payslips
                    .iter()
                    .filter(|p| p.organization_id == organization_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn delete_payslips(&self, run_id: Uuid) -> EngineResult<usize> {
        let mut all = self.payslips.write().map_err(poisoned)?;
        Ok(all.remove(&run_id).map_or(0, |removed| removed.len()))
    }
}

/// Best-effort name for the event that would move `current` to `next`.
fn event_between(current: &PayrollRun, next: &PayrollRun) -> crate::models::RunEvent {
    use crate::models::{RunEvent, RunStatus};

    match (current.status, next.status) {
        (_, RunStatus::Processing) => RunEvent::Start,
        (_, RunStatus::Completed) => RunEvent::Complete,
        _ => RunEvent::Fail,
    }
}
