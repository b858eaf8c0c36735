//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! settings and seed salary structures from YAML files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::engine::PayrollEngine;
use crate::error::{EngineError, EngineResult};
use crate::models::{Actor, SalaryStructure};

use super::types::{EngineConfig, StructureSeed};

/// Loads engine configuration from a directory.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml          # Server and calculation settings
/// └── structures/          # Optional seed structures
///     └── 01-acme.yaml     # Applied in file-name order
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Listening on {}", loader.config().server.addr());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
    seeds: Vec<StructureSeed>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `engine.yaml` is missing (`ConfigNotFound`)
    /// - Any file contains invalid YAML (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let config = Self::load_yaml::<EngineConfig>(&path.join("engine.yaml"))?;
        let seeds = Self::load_seeds(&path.join("structures"))?;

        Ok(Self { config, seeds })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every seed file in the structures directory, sorted by name.
    fn load_seeds(structures_dir: &Path) -> EngineResult<Vec<StructureSeed>> {
        if !structures_dir.exists() {
            return Ok(Vec::new());
        }

        let dir_str = structures_dir.display().to_string();
        let entries = fs::read_dir(structures_dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;
            let path = entry.path();
            if path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
            {
                files.push(path);
            }
        }
        files.sort();

        files.iter().map(|file| Self::load_yaml(file)).collect()
    }

    /// Returns the engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the seed structures in application order.
    pub fn seeds(&self) -> &[StructureSeed] {
        &self.seeds
    }

    /// Creates every seed structure through `engine`, in file order.
    ///
    /// Each seed becomes the next version for its organization, so reseeding
    /// an existing store appends versions rather than replacing them.
    pub fn seed(&self, engine: &PayrollEngine) -> EngineResult<Vec<SalaryStructure>> {
        let mut created = Vec::with_capacity(self.seeds.len());

        for seed in &self.seeds {
            let structure = engine.create_salary_structure(
                seed.organization_id,
                seed.structure.clone(),
                &Actor::new(seed.created_by),
            )?;
            created.push(structure);
        }

        if !created.is_empty() {
            info!(count = created.len(), "Seed salary structures applied");
        }
        Ok(created)
    }
}
