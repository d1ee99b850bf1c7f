use super::Result;
use crate::api::fanout::RegionErrorPolicy;
use crate::display::OutputFormat;
use crate::error::StorageError;
use crate::utils::retry::RetrySettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR_NAME: &str = "run-cli";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of `config.toml`. Every field is optional; unset fields fall
/// through to the environment, gcloud and built-in defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// A region code, or `-` for every region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Bound on a whole listing or operation wait, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_errors: Option<RegionErrorPolicy>,
    /// Absent means no retries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetrySettings>,
}

impl Config {
    /// Load from `path`, or from the default location. A missing file is
    /// an empty configuration.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if !config_path.exists() {
            log::debug!("No config file at {}", config_path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|e| StorageError::ConfigParseError {
            message: format!("{}: {}", config_path.display(), e),
        })
    }

    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::FileIo {
                path: parent.to_string_lossy().to_string(),
                source,
            })?;
        }

        let toml_content = toml::to_string(self).map_err(|e| StorageError::ConfigParseError {
            message: e.to_string(),
        })?;

        fs::write(&config_path, toml_content).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        log::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// `~/.config/run-cli/config.toml` or the platform equivalent.
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(StorageError::ConfigDirNotFound)?;
        Ok(Self::file_in(&config_dir.join(CONFIG_DIR_NAME)))
    }

    /// Config file inside an explicit directory (`--config-dir`).
    pub fn file_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }
}
