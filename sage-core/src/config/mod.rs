//! Configuration for retrieval, assembly, and refinement.
//!
//! Everything that was a hard-coded literal in the production system
//! (sibling groups, market sets, mandatory column names) lives here as
//! declarative data with serde overrides, so the assembler logic stays
//! generic.

mod assembly_config;
mod refine_config;
mod retrieval_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use assembly_config::AssemblyConfig;
pub use refine_config::RefineConfig;
pub use retrieval_config::RetrievalConfig;

use crate::errors::{SageResult, SchemaError};

/// Top-level configuration, loadable from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SageConfig {
    pub retrieval: RetrievalConfig,
    pub assembly: AssemblyConfig,
    pub refine: RefineConfig,
}

impl SageConfig {
    /// Load from a TOML file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> SageResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str(&text).map_err(|e| SchemaError::ArtifactMalformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }
}
