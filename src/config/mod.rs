//! Configuration loading for the payroll engine.
//!
//! This module loads server and calculation settings plus optional seed
//! salary structures from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Parallel threshold: {}", config.config().engine.parallel_threshold);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EngineConfig, EngineSettings, ServerConfig, StructureSeed};
