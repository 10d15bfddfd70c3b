//! Configuration loading and representation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use forgeplan_purchasing::ProcurementOptions;
use forgeplan_scheduling::PlanningOptions;

/// Environment variable holding the path of a JSON config file.
pub const CONFIG_ENV: &str = "FORGEPLAN_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Planning and procurement options, loaded together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeplanConfig {
    pub planning: PlanningOptions,
    pub procurement: ProcurementOptions,
}

impl ForgeplanConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Load from the file named by `FORGEPLAN_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    /// Load from `path` when given, otherwise return the defaults.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading configuration");
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            planning: self.planning.normalized(),
            procurement: self.procurement.normalized(),
        }
    }
}
