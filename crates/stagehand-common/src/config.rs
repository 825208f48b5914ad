//! Global configuration model for Stagehand environments.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StagehandError};

/// Root configuration for a Stagehand environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagehandConfig {
    /// Base directory for Stagehand state and data.
    pub data_dir: PathBuf,
    /// Path to the state index file.
    pub state_file: PathBuf,
    /// Runtime versions the environment accepts.
    pub supported_runtimes: Vec<String>,
    /// Runtime used when a descriptor gives no version hint.
    pub default_runtime: String,
    /// Manifest location relative to an application root.
    pub manifest_path: PathBuf,
}

impl Default for StagehandConfig {
    fn default() -> Self {
        Self {
            data_dir: crate::constants::data_dir().clone(),
            state_file: crate::constants::default_state_file(),
            supported_runtimes: crate::constants::DEFAULT_SUPPORTED_RUNTIMES
                .iter()
                .map(ToString::to_string)
                .collect(),
            default_runtime: crate::constants::DEFAULT_RUNTIME.to_string(),
            manifest_path: PathBuf::from(crate::constants::DEFAULT_MANIFEST_PATH),
        }
    }
}

impl StagehandConfig {
    /// Loads a configuration file, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// describes an unusable configuration.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| StagehandError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the runtime settings are coherent.
    ///
    /// # Errors
    ///
    /// Returns an error if no runtimes are supported or the default runtime
    /// is not one of them.
    pub fn validate(&self) -> Result<()> {
        if self.supported_runtimes.is_empty() {
            return Err(StagehandError::Config {
                message: "supported_runtimes must not be empty".into(),
            });
        }
        if !self.supported_runtimes.contains(&self.default_runtime) {
            return Err(StagehandError::Config {
                message: format!(
                    "default_runtime \"{}\" is not listed in supported_runtimes",
                    self.default_runtime
                ),
            });
        }
        if self.manifest_path.is_absolute() {
            return Err(StagehandError::Config {
                message: "manifest_path must be relative to the application root".into(),
            });
        }
        Ok(())
    }
}
