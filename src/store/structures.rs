//! Salary structure versioning.
//!
//! [`SalaryStructureStore`] is the only way new structure versions are
//! created. It assigns `latest + 1`, relies on the repository to reject a
//! racing writer, and resolves the active structure with an explicit query
//! per organization on every call.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::AuditRecorder;
use crate::error::{EngineError, EngineResult};
use crate::models::{Actor, AuditAction, AuditEntry, SalaryStructure, StructureDefinition};

use super::repository::SalaryStructureRepository;

/// How many times a version conflict is retried before giving up.
const MAX_VERSION_ATTEMPTS: usize = 3;

/// Creates and resolves versioned salary structures.
#[derive(Clone)]
pub struct SalaryStructureStore {
    repo: Arc<dyn SalaryStructureRepository>,
    audit: Arc<dyn AuditRecorder>,
}

impl SalaryStructureStore {
    /// Creates a store over `repo` that reports to `audit`.
    pub fn new(repo: Arc<dyn SalaryStructureRepository>, audit: Arc<dyn AuditRecorder>) -> Self {
        Self { repo, audit }
    }

    /// Creates the next structure version for `organization_id`.
    ///
    /// # Returns
    ///
    /// The stored structure, or:
    /// - `Validation` if the definition is malformed (no components,
    ///   duplicate codes, bad values)
    /// - `VersionConflict` if concurrent writers keep taking the version
    /// - `Persistence` if storage fails
    pub fn create_version(
        &self,
        organization_id: Uuid,
        definition: StructureDefinition,
        actor: &Actor,
    ) -> EngineResult<SalaryStructure> {
        definition.validate()?;

        let mut attempt = 0;
        let structure = loop {
            attempt += 1;
            let latest = self.repo.find_latest(organization_id)?;
            let candidate = SalaryStructure::next_version(
                organization_id,
                latest.as_ref(),
                definition.clone(),
                actor.id,
            )?;

            match self.repo.insert(candidate.clone()) {
                Ok(()) => break candidate,
                Err(err @ EngineError::VersionConflict { .. }) if attempt < MAX_VERSION_ATTEMPTS => {
                    warn!(
                        organization_id = %organization_id,
                        attempt,
                        error = %err,
                        "Structure version insert conflicted, retrying"
                    );
                }
                Err(err) => return Err(err),
            }
        };

        info!(
            organization_id = %organization_id,
            structure_id = %structure.id,
            version = structure.version,
            components = structure.components.len(),
            "Salary structure version created"
        );

        self.audit.append(
            AuditEntry::new(
                actor.id,
                organization_id,
                AuditAction::StructureCreated,
                "salary_structure",
                structure.id,
            )
            .with_diff(None, serde_json::to_value(&structure).ok())
            .with_metadata(actor.metadata.clone()),
        );

        Ok(structure)
    }

    /// Returns the highest-version structure for `organization_id`.
    ///
    /// Selection is by version number alone; `is_active` is not consulted.
    pub fn get_active(&self, organization_id: Uuid) -> EngineResult<SalaryStructure> {
        self.repo
            .find_latest(organization_id)?
            .ok_or_else(|| EngineError::not_found("Salary structure", organization_id))
    }

    /// Returns a specific version, e.g. the one a run snapshotted.
    pub fn get_version(&self, organization_id: Uuid, version: u32) -> EngineResult<SalaryStructure> {
        self.repo
            .find_version(organization_id, version)?
            .ok_or_else(|| {
                EngineError::not_found(
                    "Salary structure",
                    format!("{organization_id} v{version}"),
                )
            })
    }

    /// Returns every version for `organization_id`, oldest first.
    pub fn list_versions(&self, organization_id: Uuid) -> EngineResult<Vec<SalaryStructure>> {
        self.repo.list_versions(organization_id)
    }
}
