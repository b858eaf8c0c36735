//! Audit sinks.
//!
//! The engine appends an [`AuditEntry`] when a structure version is created
//! and when a run completes or fails. Appending is best-effort: the trait
//! returns nothing, and a sink that cannot store an entry must swallow the
//! problem rather than fail the operation being audited.

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::models::AuditEntry;

/// An append-only destination for audit entries.
pub trait AuditRecorder: Send + Sync {
    /// Appends one entry. Must not panic or block on slow storage.
    fn append(&self, entry: AuditEntry);
}

/// Keeps entries in memory, in append order.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every entry appended so far.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl AuditRecorder for InMemoryAuditLog {
    fn append(&self, entry: AuditEntry) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push(entry);
    }
}

/// Emits each entry as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditRecorder;

impl AuditRecorder for TracingAuditRecorder {
    fn append(&self, entry: AuditEntry) {
        info!(
            target: "payroll_engine::audit",
            audit_id = %entry.id,
            action = entry.action.as_str(),
            actor = %entry.actor,
            organization_id = %entry.organization_id,
            resource = %entry.resource,
            resource_id = %entry.resource_id,
            success = entry.success,
            request_id = entry.metadata.request_id.as_deref().unwrap_or("-"),
            "Audit entry recorded"
        );
    }
}

/// Forwards every entry to each inner recorder in turn.
#[derive(Clone, Default)]
pub struct FanoutAuditRecorder {
    sinks: Vec<Arc<dyn AuditRecorder>>,
}

impl FanoutAuditRecorder {
    /// Creates a recorder that forwards to `sinks`.
    pub fn new(sinks: Vec<Arc<dyn AuditRecorder>>) -> Self {
        Self { sinks }
    }
}

impl AuditRecorder for FanoutAuditRecorder {
    fn append(&self, entry: AuditEntry) {
        for sink in &self.sinks {
            sink.append(entry.clone());
        }
    }
}
