//! Effective settings for one invocation.
//!
//! Each value is taken from the first source that has it: command-line
//! flag, environment, config file, active gcloud configuration, then the
//! built-in default.

use crate::AppError;
use crate::api::client::DEFAULT_TIMEOUT_SECS;
use crate::api::fanout::{Fanout, RegionErrorPolicy, RegionSelector};
use crate::api::operation::PollSettings;
use crate::api::region::DEFAULT_REGION;
use crate::display::OutputFormat;
use crate::error::CliError;
use crate::storage::config::Config;
use crate::storage::gcloud::GcloudInfo;
use crate::utils::retry::{RetryConfig, RetryExecutor};
use crate::utils::validation::validate_project_id;
use serde::Serialize;
use std::env;
use std::fmt;
use std::time::Duration;

pub const PROJECT_ENV: &str = "RUN_PROJECT";
pub const REGION_ENV: &str = "RUN_REGION";

/// Where a setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingSource {
    Flag,
    Env,
    Config,
    Gcloud,
    Default,
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SettingSource::Flag => "flag",
            SettingSource::Env => "environment",
            SettingSource::Config => "config file",
            SettingSource::Gcloud => "gcloud",
            SettingSource::Default => "default",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: SettingSource,
}

impl<T> Sourced<T> {
    fn new(value: T, source: SettingSource) -> Self {
        Self { value, source }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub project: Option<String>,
    pub region: Option<String>,
    pub format: Option<OutputFormat>,
    pub timeout_secs: Option<u64>,
    pub deadline_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub project: Option<Sourced<String>>,
    pub region: Sourced<RegionSelector>,
    pub format: OutputFormat,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Bound on a whole listing or operation wait. `None` means no bound
    /// beyond the per-request timeout and the default poll timeout.
    pub deadline_secs: Option<u64>,
    pub region_errors: RegionErrorPolicy,
    pub retry: Option<RetryConfig>,
}

impl Settings {
    /// Resolve against the process environment.
    pub fn resolve(
        overrides: &Overrides,
        config: &Config,
        gcloud: &GcloudInfo,
    ) -> Result<Self, AppError> {
        Self::resolve_with(overrides, config, gcloud, |key| env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve_with<F>(
        overrides: &Overrides,
        config: &Config,
        gcloud: &GcloudInfo,
        env_lookup: F,
    ) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env_lookup(key).filter(|v| !v.trim().is_empty());

        let project = first_of([
            (overrides.project.clone(), SettingSource::Flag),
            (lookup(PROJECT_ENV), SettingSource::Env),
            (config.project.clone(), SettingSource::Config),
            (gcloud.project.clone(), SettingSource::Gcloud),
        ]);
        if let Some(project) = &project {
            validate_project_id(&project.value)?;
        }

        let gcloud_region = gcloud
            .region_configured
            .then(|| gcloud.region.clone());
        let region = first_of([
            (overrides.region.clone(), SettingSource::Flag),
            (lookup(REGION_ENV), SettingSource::Env),
            (config.region.clone(), SettingSource::Config),
            (gcloud_region, SettingSource::Gcloud),
        ])
        .unwrap_or_else(|| Sourced::new(DEFAULT_REGION.to_string(), SettingSource::Default));
        let region = Sourced::new(RegionSelector::parse(&region.value)?, region.source);

        let timeout_secs = overrides
            .timeout_secs
            .or(config.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let deadline_secs = overrides.deadline_secs.or(config.deadline_secs);
        require_positive("timeout", Some(timeout_secs))?;
        require_positive("deadline", deadline_secs)?;

        Ok(Self {
            project,
            region,
            format: overrides.format.or(config.format).unwrap_or_default(),
            timeout_secs,
            deadline_secs,
            region_errors: config.region_errors.unwrap_or_default(),
            retry: config.retry.as_ref().map(RetryConfig::from),
        })
    }

    /// The project to operate on, or an error explaining how to set one.
    pub fn require_project(&self) -> Result<&str, AppError> {
        self.project
            .as_ref()
            .map(|p| p.value.as_str())
            .ok_or_else(|| {
                CliError::ProjectRequired {
                    hint: format!(
                        "Pass --project, set {}, run 'run-cli config set project <id>' or 'gcloud config set project <id>'",
                        PROJECT_ENV
                    ),
                }
                .into()
            })
    }

    /// A single region, for commands that address one resource.
    pub fn require_region(&self) -> Result<&str, AppError> {
        match &self.region.value {
            RegionSelector::Region(region) => Ok(region),
            RegionSelector::AllRegions => Err(CliError::InvalidArguments(
                "this command needs a single --region, not all regions".to_string(),
            )
            .into()),
        }
    }

    pub fn retry_executor(&self) -> Option<RetryExecutor> {
        self.retry.clone().map(RetryExecutor::new)
    }

    /// Regions to fan out to, bounded by the deadline when one is set.
    pub fn fanout(&self) -> Fanout {
        match self.deadline_secs {
            Some(secs) => Fanout::default().with_deadline(Duration::from_secs(secs)),
            None => Fanout::default(),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        match self.deadline_secs {
            Some(secs) => PollSettings::default().with_timeout(Duration::from_secs(secs)),
            None => PollSettings::default(),
        }
    }
}

fn require_positive(name: &str, secs: Option<u64>) -> Result<(), AppError> {
    match secs {
        Some(0) => Err(CliError::InvalidArguments(format!(
            "{} must be a positive number of seconds",
            name
        ))
        .into()),
        _ => Ok(()),
    }
}

fn first_of<const N: usize>(candidates: [(Option<String>, SettingSource); N]) -> Option<Sourced<String>> {
    candidates
        .into_iter()
        .find_map(|(value, source)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| Sourced::new(v.trim().to_string(), source))
        })
}
