use crate::error::ApiError;
use backoff::{ExponentialBackoff, backoff::Backoff};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Retry configuration for remote calls. Nothing is retried unless a
/// [`RetryExecutor`] built from this is handed to the caller.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
    /// Whether to retry on client errors (4xx other than auth)
    pub retry_client_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            retry_client_errors: false,
        }
    }
}

/// Retry section of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Also retry 4xx responses other than auth failures.
    #[serde(default)]
    pub retry_client_errors: bool,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            retry_client_errors: settings.retry_client_errors,
            ..Self::default()
        }
    }
}

/// Runs an async operation under an exponential backoff policy.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.config.initial_delay,
            max_interval: self.config.max_delay,
            multiplier: self.config.multiplier,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if !self.should_retry(&error, attempt) {
                        return Err(error);
                    }

                    match backoff.next_backoff() {
                        Some(delay) => {
                            log::debug!(
                                "Retrying after {:?} (attempt {}): {}",
                                delay,
                                attempt,
                                error
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(error),
                    }
                }
            }
        }
    }

    fn should_retry(&self, error: &ApiError, attempt: u32) -> bool {
        if attempt >= self.config.max_retries {
            log::warn!(
                "Max retry attempts reached ({}), giving up",
                self.config.max_retries
            );
            return false;
        }

        match error {
            ApiError::Http {
                status: 500..=599, ..
            } => true,
            ApiError::Http { status: 429, .. } => true,
            ApiError::Timeout { .. } | ApiError::Transport { .. } => true,
            ApiError::Http {
                status: 400..=499, ..
            } => self.config.retry_client_errors,
            // Auth failures need a new credential, not another attempt.
            ApiError::Unauthorized { .. } => false,
            ApiError::Http { .. } | ApiError::Decode { .. } | ApiError::Operation { .. } => false,
        }
    }
}
