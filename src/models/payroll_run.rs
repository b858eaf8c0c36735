//! Payroll run model and its lifecycle state machine.
//!
//! A run moves `pending → processing → {completed | failed}`. The legal moves
//! are encoded in [`RunStatus::transition`], a total function over every
//! (status, event) pair, so the state machine can be tested without any
//! storage behind it. [`PayrollRun::apply`] is the only way a run record
//! changes after creation, and it refuses once the run is locked.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::SalaryStructure;

/// Lifecycle status of a payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, structure snapshotted, nothing computed yet.
    Pending,
    /// Employees are being computed.
    Processing,
    /// Every payslip was computed and persisted. Terminal.
    Completed,
    /// The batch was aborted and nothing was persisted. Terminal.
    Failed,
}

impl RunStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns the status that follows `event`, or `InvalidTransition`.
    ///
    /// | from        | event    | to          |
    /// |-------------|----------|-------------|
    /// | pending     | start    | processing  |
    /// | pending     | fail     | failed      |
    /// | processing  | complete | completed   |
    /// | processing  | fail     | failed      |
    ///
    /// Every other pair is rejected; in particular nothing ever returns to
    /// `pending` and terminal statuses accept no event.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::{RunEvent, RunStatus};
    ///
    /// assert_eq!(
    ///     RunStatus::Pending.transition(RunEvent::Start).unwrap(),
    ///     RunStatus::Processing
    /// );
    /// assert!(RunStatus::Completed.transition(RunEvent::Fail).is_err());
    /// ```
    pub fn transition(self, event: RunEvent) -> EngineResult<RunStatus> {
        match (self, event) {
            (Self::Pending, RunEvent::Start) => Ok(Self::Processing),
            (Self::Processing, RunEvent::Complete) => Ok(Self::Completed),
            (Self::Pending | Self::Processing, RunEvent::Fail) => Ok(Self::Failed),
            (from, event) => Err(EngineError::InvalidTransition { from, event }),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Something that happens to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEvent {
    /// Begin computing employees.
    Start,
    /// All payslips computed and persisted.
    Complete,
    /// The batch was aborted.
    Fail,
}

impl RunEvent {
    /// Returns the string representation of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregated money totals for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    /// Sum of every payslip's gross.
    pub gross: Decimal,
    /// Sum of every payslip's deductions.
    pub deductions: Decimal,
    /// Sum of every payslip's already-rounded net, in minor units.
    pub net: i64,
}

/// The outcome recorded on a run when it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The batch persisted.
    Completed {
        /// Totals over the persisted payslips.
        totals: RunTotals,
        /// When the run completed.
        at: DateTime<Utc>,
    },
    /// The batch was aborted.
    Failed {
        /// The error message that aborted the batch.
        reason: String,
        /// When the run failed.
        at: DateTime<Utc>,
    },
}

/// One execution of payroll over a batch of employees.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{PayrollRun, RunStatus};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let run = PayrollRun::new(
///     Uuid::new_v4(),
///     Uuid::new_v4(),
///     3,
///     NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
///     12,
///     Uuid::new_v4(),
/// );
/// assert_eq!(run.status, RunStatus::Pending);
/// assert!(!run.locked);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRun {
    /// Unique identifier for the run.
    pub id: Uuid,
    /// The owning organization.
    pub organization_id: Uuid,
    /// The structure version snapshotted at creation.
    pub salary_structure_id: Uuid,
    /// The snapshotted structure's version number.
    pub structure_version: u32,
    /// First day of the pay period.
    pub period_start: NaiveDate,
    /// Last day of the pay period.
    pub period_end: NaiveDate,
    /// Lifecycle status.
    pub status: RunStatus,
    /// Set when the run reaches a terminal status.
    pub locked: bool,
    /// Money totals, zero until completion.
    pub totals: RunTotals,
    /// Number of employees submitted in the batch.
    pub employee_count: usize,
    /// Who started the run.
    pub created_by: Uuid,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
    /// When the run completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the run failed.
    pub failed_at: Option<DateTime<Utc>>,
    /// The message of the error that failed the run.
    pub failure_reason: Option<String>,
}

impl PayrollRun {
    /// Creates a pending, unlocked run with zero totals.
    pub fn new(
        organization_id: Uuid,
        salary_structure_id: Uuid,
        structure_version: u32,
        period_start: NaiveDate,
        period_end: NaiveDate,
        employee_count: usize,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            salary_structure_id,
            structure_version,
            period_start,
            period_end,
            status: RunStatus::Pending,
            locked: false,
            totals: RunTotals::default(),
            employee_count,
            created_by,
            created_at: Utc::now(),
            completed_at: None,
            failed_at: None,
            failure_reason: None,
        }
    }

    /// Creates a pending run that snapshots `structure`.
    pub fn snapshot(
        structure: &SalaryStructure,
        period_start: NaiveDate,
        period_end: NaiveDate,
        employee_count: usize,
        created_by: Uuid,
    ) -> Self {
        Self::new(
            structure.organization_id,
            structure.id,
            structure.version,
            period_start,
            period_end,
            employee_count,
            created_by,
        )
    }

    /// Returns the run after `event`, leaving `self` untouched.
    ///
    /// `Complete` and `Fail` lock the run and stamp the outcome; a `Complete`
    /// or `Fail` event must carry the matching [`RunOutcome`]. A locked run
    /// rejects every event with `RunLocked`.
    pub fn apply(&self, event: RunEvent, outcome: Option<RunOutcome>) -> EngineResult<PayrollRun> {
        if self.locked {
            return Err(EngineError::RunLocked { run_id: self.id });
        }

        let status = self.status.transition(event)?;
        let mut next = self.clone();
        next.status = status;

        match (event, outcome) {
            (RunEvent::Start, None) => {}
            (RunEvent::Complete, Some(RunOutcome::Completed { totals, at })) => {
                next.totals = totals;
                next.completed_at = Some(at);
                next.locked = true;
            }
            (RunEvent::Fail, Some(RunOutcome::Failed { reason, at })) => {
                next.failure_reason = Some(reason);
                next.failed_at = Some(at);
                next.locked = true;
            }
            (event, _) => {
                return Err(EngineError::InvalidTransition {
                    from: self.status,
                    event,
                });
            }
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [RunStatus; 4] = [
        RunStatus::Pending,
        RunStatus::Processing,
        RunStatus::Completed,
        RunStatus::Failed,
    ];
    const ALL_EVENTS: [RunEvent; 3] = [RunEvent::Start, RunEvent::Complete, RunEvent::Fail];

    fn create_test_run() -> PayrollRun {
        PayrollRun::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            1,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            2,
            Uuid::new_v4(),
        )
    }

    fn failed(reason: &str) -> Option<RunOutcome> {
        Some(RunOutcome::Failed {
            reason: reason.to_string(),
            at: Utc::now(),
        })
    }

    #[test]
    fn test_transition_table_is_total() {
        let allowed = [
            (RunStatus::Pending, RunEvent::Start, RunStatus::Processing),
            (RunStatus::Pending, RunEvent::Fail, RunStatus::Failed),
            (RunStatus::Processing, RunEvent::Complete, RunStatus::Completed),
            (RunStatus::Processing, RunEvent::Fail, RunStatus::Failed),
        ];

        for from in ALL_STATUSES {
            for event in ALL_EVENTS {
                let expected = allowed
                    .iter()
                    .find(|(f, e, _)| *f == from && *e == event)
                    .map(|(_, _, to)| *to);
                match (from.transition(event), expected) {
                    (Ok(to), Some(expected)) => assert_eq!(to, expected),
                    (Err(EngineError::InvalidTransition { from: f, event: e }), None) => {
                        assert_eq!(f, from);
                        assert_eq!(e, event);
                    }
                    (result, expected) => {
                        panic!("{from} + {event}: got {result:?}, expected {expected:?}")
                    }
                }
            }
        }
    }

    #[test]
    fn test_no_transition_reenters_pending() {
        for from in ALL_STATUSES {
            for event in ALL_EVENTS {
                if let Ok(to) = from.transition(event) {
                    assert_ne!(to, RunStatus::Pending);
                }
            }
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Processing.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }

    #[test]
    fn test_apply_start_keeps_run_unlocked() {
        let run = create_test_run();
        let processing = run.apply(RunEvent::Start, None).unwrap();

        assert_eq!(processing.status, RunStatus::Processing);
        assert!(!processing.locked);
        assert_eq!(run.status, RunStatus::Pending);
    }

    #[test]
    fn test_apply_complete_locks_and_stamps_totals() {
        let run = create_test_run().apply(RunEvent::Start, None).unwrap();
        let totals = RunTotals {
            gross: Decimal::new(140000, 0),
            deductions: Decimal::new(3600, 0),
            net: 136400,
        };
        let completed = run
            .apply(
                RunEvent::Complete,
                Some(RunOutcome::Completed {
                    totals: totals.clone(),
                    at: Utc::now(),
                }),
            )
            .unwrap();

        assert_eq!(completed.status, RunStatus::Completed);
        assert!(completed.locked);
        assert_eq!(completed.totals, totals);
        assert!(completed.completed_at.is_some());
        assert!(completed.failed_at.is_none());
    }

    #[test]
    fn test_apply_fail_records_reason() {
        let run = create_test_run().apply(RunEvent::Start, None).unwrap();
        let failed_run = run.apply(RunEvent::Fail, failed("boom")).unwrap();

        assert_eq!(failed_run.status, RunStatus::Failed);
        assert!(failed_run.locked);
        assert_eq!(failed_run.failure_reason.as_deref(), Some("boom"));
        assert!(failed_run.failed_at.is_some());
        assert_eq!(failed_run.totals, RunTotals::default());
    }

    #[test]
    fn test_locked_run_rejects_every_event() {
        let locked = create_test_run()
            .apply(RunEvent::Fail, failed("aborted"))
            .unwrap();

        for event in ALL_EVENTS {
            let result = locked.apply(event, failed("again"));
            assert!(matches!(result, Err(EngineError::RunLocked { run_id }) if run_id == locked.id));
        }
    }

    #[test]
    fn test_complete_without_outcome_rejected() {
        let run = create_test_run().apply(RunEvent::Start, None).unwrap();
        let result = run.apply(RunEvent::Complete, None);
        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&RunStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(RunStatus::Failed.to_string(), "failed");
    }
}
