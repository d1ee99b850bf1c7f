use crate::AppError;
use crate::api::fanout::{RegionErrorPolicy, RegionSelector};
use crate::display::OutputFormat;
use crate::error::ConfigError;
use crate::storage::config::Config;
use crate::utils::validation::validate_project_id;
use std::path::PathBuf;

/// Reads and edits the persisted configuration.
pub struct ConfigService {
    config: Config,
}

impl ConfigService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set `key` after validating `value`. Hyphenated key spellings
    /// (`region-errors`) are accepted too.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let value = value.trim();
        let invalid = |reason: String| ConfigError::InvalidValue {
            field: key.to_string(),
            value: value.to_string(),
            reason,
        };

        match key.replace('-', "_").as_str() {
            "project" => {
                validate_project_id(value).map_err(|e| invalid(e.to_string()))?;
                self.config.project = Some(value.to_string());
            }
            "region" => {
                let selector = RegionSelector::parse(value).map_err(|e| invalid(e.to_string()))?;
                self.config.region = Some(selector.as_str().to_string());
            }
            "format" => {
                let format = value
                    .parse::<OutputFormat>()
                    .map_err(|e| invalid(e.to_string()))?;
                self.config.format = Some(format);
            }
            "timeout_secs" | "timeout" => {
                let secs = positive_secs(value).map_err(invalid)?;
                self.config.timeout_secs = Some(secs);
            }
            "deadline_secs" | "deadline" => {
                let secs = positive_secs(value).map_err(invalid)?;
                self.config.deadline_secs = Some(secs);
            }
            "region_errors" => {
                let policy = value
                    .parse::<RegionErrorPolicy>()
                    .map_err(|e| invalid(e.to_string()))?;
                self.config.region_errors = Some(policy);
            }
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                }
                .into());
            }
        }

        log::debug!("Set config {} = {}", key, value);
        Ok(())
    }

    /// Clear `key` so it falls back to the next source.
    pub fn unset(&mut self, key: &str) -> Result<(), AppError> {
        match key.replace('-', "_").as_str() {
            "project" => self.config.project = None,
            "region" => self.config.region = None,
            "format" => self.config.format = None,
            "timeout_secs" | "timeout" => self.config.timeout_secs = None,
            "deadline_secs" | "deadline" => self.config.deadline_secs = None,
            "region_errors" => self.config.region_errors = None,
            "retry" => self.config.retry = None,
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Key/value pairs for `config show`. Unset keys show as `-`.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let or_unset = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
        let retry = self.config.retry.as_ref().map(|r| {
            format!(
                "max_retries={}, initial_delay_ms={}, max_delay_ms={}, retry_client_errors={}",
                r.max_retries, r.initial_delay_ms, r.max_delay_ms, r.retry_client_errors
            )
        });

        vec![
            ("project", or_unset(self.config.project.clone())),
            ("region", or_unset(self.config.region.clone())),
            ("format", or_unset(self.config.format.map(|f| f.to_string()))),
            ("timeout_secs", or_unset(self.config.timeout_secs.map(|t| t.to_string()))),
            ("deadline_secs", or_unset(self.config.deadline_secs.map(|t| t.to_string()))),
            (
                "region_errors",
                or_unset(self.config.region_errors.map(|p| p.to_string())),
            ),
            ("retry", or_unset(retry)),
        ]
    }

    pub fn save_config(&self, path: Option<PathBuf>) -> Result<(), AppError> {
        self.config.save(path).map_err(|e| e.into())
    }
}

fn positive_secs(value: &str) -> Result<u64, String> {
    match value.parse::<u64>() {
        Ok(0) | Err(_) => Err("expected a positive number of seconds".to_string()),
        Ok(secs) => Ok(secs),
    }
}
