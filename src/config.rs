use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Switches and thresholds for one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Expand fragments carrying R-group labels into one substance per
    /// variant, using definitions found in page text.
    pub resolve_rgroups: bool,
    /// Collapse substances sharing an InChI.
    pub deduplicate: bool,
    /// AuxInfo strings longer than this are dropped.
    pub aux_info_limit: usize,
    pub min_fragment_atoms: usize,
    /// Default agent band half-width, as a fraction of arrow length, for
    /// steps whose arrow carries no extent.
    pub agent_extent_ratio: f64,
    pub haworth_horizontal_tolerance_deg: f64,
    pub detect_projections: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            resolve_rgroups: false,
            deduplicate: true,
            aux_info_limit: 4000,
            min_fragment_atoms: 2,
            agent_extent_ratio: 0.5,
            haworth_horizontal_tolerance_deg: 5.0,
            detect_projections: true,
        }
    }
}

impl ExtractionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Json {
            what: "extraction config".to_string(),
            source,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
