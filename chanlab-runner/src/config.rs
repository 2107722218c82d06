//! Serializable run configuration, loaded from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use chanlab_core::domain::{ParamError, StrategyParameters};

use crate::optimizer::ParamGrid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid parameters: {0}")]
    Params(#[from] ParamError),
}

/// Everything needed to reproduce a run: input paths, the base parameter
/// tuple, and an optional sweep section for the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub data: DataConfig,

    /// Base strategy parameters. Missing fields take their defaults, so a
    /// config may pin only the axes it cares about.
    #[serde(default)]
    pub params: StrategyParameters,

    /// Present only for `optimize` runs.
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    pub prices: PathBuf,
    pub fundamentals: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SweepConfig {
    pub grid: ParamGrid,
    /// Concurrency cap for candidate runs; 0 means use all available cores.
    pub max_workers: usize,
    /// How many ranked candidates to keep in the report. Floored at 1: a
    /// configured 0 still reports the best candidate.
    pub top_n: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            grid: ParamGrid::default(),
            max_workers: 0,
            top_n: 10,
        }
    }
}

impl RunConfig {
    /// Load and validate a config file. Relative data paths are resolved
    /// against the config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: RunConfig =
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.params.validate()?;
        if let Some(base) = path.parent() {
            config.data.prices = resolve(base, &config.data.prices);
            config.data.fundamentals = resolve(base, &config.data.fundamentals);
        }
        Ok(config)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
