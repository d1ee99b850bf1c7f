//! Waiting on long-running operations.

use crate::api::classify::classify;
use crate::api::client::RunClient;
use crate::api::models::Operation;
use crate::error::{ApiError, AppError};
use backoff::{ExponentialBackoff, backoff::Backoff};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;

/// How an [`OperationHandle`] polls.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    /// Give up after this long.
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            multiplier: 1.5,
            timeout: Duration::from_secs(600),
        }
    }
}

impl PollSettings {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A server-side mutation in progress. [`wait`](Self::wait) resolves it to
/// the resource the operation produces.
#[derive(Debug)]
pub struct OperationHandle<T> {
    client: RunClient,
    target: String,
    action: &'static str,
    operation: Operation,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> OperationHandle<T> {
    pub fn new(
        client: RunClient,
        target: String,
        action: &'static str,
        operation: Operation,
    ) -> Self {
        Self {
            client,
            target,
            action,
            operation,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.operation.name
    }

    pub fn is_done(&self) -> bool {
        self.operation.done
    }

    /// Poll until the operation is done, backing off between polls.
    pub async fn wait(mut self) -> Result<T, AppError> {
        let poll = self.client.poll_settings().clone();
        let mut backoff = ExponentialBackoff {
            initial_interval: poll.initial_interval,
            max_interval: poll.max_interval,
            multiplier: poll.multiplier,
            max_elapsed_time: Some(poll.timeout),
            ..Default::default()
        };

        while !self.operation.done {
            let Some(delay) = backoff.next_backoff() else {
                return Err(self.fail(ApiError::Timeout {
                    timeout_secs: poll.timeout.as_secs(),
                    endpoint: format!("/v2/{}", self.operation.name),
                }));
            };
            log::debug!("Operation {} not done, polling again in {:?}", self.operation.name, delay);
            tokio::time::sleep(delay).await;
            self.operation = self
                .client
                .get_operation(&self.operation.name, &self.target)
                .await?;
        }

        self.finish()
    }

    fn finish(self) -> Result<T, AppError> {
        if let Some(status) = &self.operation.error {
            let err = ApiError::Operation {
                operation: self.operation.name.clone(),
                code: status.code,
                message: status.message.clone(),
            };
            return Err(self.fail(err));
        }

        let response = self.operation.response.clone().unwrap_or_default();
        serde_json::from_value::<T>(response).map_err(|e| {
            self.fail(ApiError::Decode {
                endpoint: format!("/v2/{}", self.operation.name),
                message: e.to_string(),
            })
        })
    }

    fn fail(&self, err: ApiError) -> AppError {
        AppError::Request {
            action: self.action,
            target: self.target.clone(),
            source: classify(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::Endpoints;
    use crate::api::models::WireStatus;
    use crate::storage::credentials::StaticTokenProvider;
    use serde_json::json;
    use std::sync::Arc;

    fn client() -> RunClient {
        RunClient::with_endpoints(
            Endpoints::single("http://127.0.0.1:9"),
            Arc::new(StaticTokenProvider::new("t")),
        )
        .expect("client")
    }

    #[tokio::test]
    async fn test_done_operation_decodes_response() {
        let operation = Operation {
            name: "projects/p/locations/r/operations/1".to_string(),
            done: true,
            response: Some(json!({"name": "svc", "generation": "3"})),
            ..Default::default()
        };
        let handle: OperationHandle<crate::api::models::WireService> =
            OperationHandle::new(client(), "service 'svc'".to_string(), "update", operation);
        assert!(handle.is_done());

        let service = handle.wait().await.expect("already done");
        assert_eq!(service.name, "svc");
        assert_eq!(service.generation, 3);
    }

    #[tokio::test]
    async fn test_done_operation_with_error() {
        let operation = Operation {
            name: "operations/2".to_string(),
            done: true,
            error: Some(WireStatus {
                code: 9,
                message: "revision failed to start".to_string(),
                status: None,
            }),
            ..Default::default()
        };
        let handle: OperationHandle<serde_json::Value> =
            OperationHandle::new(client(), "job 'nightly'".to_string(), "run", operation);

        let err = handle.wait().await.expect_err("operation failed");
        assert_eq!(
            err.to_string(),
            "failed to run job 'nightly': operation operations/2 failed with code 9: revision failed to start"
        );
        assert!(!err.is_auth());
    }
}
