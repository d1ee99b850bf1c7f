use crate::api::classify::classify;
use crate::api::models::{
    ErrorEnvelope, ListDomainMappingsResponse, ListExecutionsResponse, ListJobsResponse,
    ListRevisionsResponse, ListServicesResponse, ListWorkerPoolsResponse, Operation,
    SearchProjectsResponse, WireDomainMapping, WireExecution, WireJob, WireProject, WireRevision,
    WireService, WireWorkerPool,
};
use crate::api::operation::{OperationHandle, PollSettings};
use crate::api::pagination::{ListResponse, Page, PageToken, list_all, list_all_with_retry};
use crate::api::resource::{ResourceKind, ResourceRef, location_path};
use crate::error::{ApiError, AppError, AuthError};
use crate::storage::credentials::{AccessToken, CLOUD_PLATFORM_SCOPE, CredentialProvider};
use crate::utils::retry::RetryExecutor;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("run-cli/", env!("CARGO_PKG_VERSION"));

/// Base URLs of the remote APIs. Tests point these at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub run: String,
    pub resource_manager: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            run: "https://run.googleapis.com".to_string(),
            resource_manager: "https://cloudresourcemanager.googleapis.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Both APIs served from one base URL.
    pub fn single(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            run: base.clone(),
            resource_manager: base,
        }
    }
}

/// HTTP transport for the Cloud Run control plane.
///
/// Cheap to clone; clones share the connection pool and the cached token.
#[derive(Clone)]
pub struct RunClient {
    client: Client,
    endpoints: Endpoints,
    credentials: Arc<dyn CredentialProvider>,
    token: Arc<OnceCell<AccessToken>>,
    timeout_secs: u64,
    retry: Option<RetryExecutor>,
    poll: PollSettings,
}

impl std::fmt::Debug for RunClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunClient")
            .field("endpoints", &self.endpoints)
            .field("credentials", &self.credentials.name())
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry.is_some())
            .finish()
    }
}

impl RunClient {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Result<Self, ApiError> {
        Self::with_endpoints(Endpoints::default(), credentials)
    }

    pub fn with_endpoints(
        endpoints: Endpoints,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_http_client(DEFAULT_TIMEOUT_SECS)?,
            endpoints,
            credentials,
            token: Arc::new(OnceCell::new()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: None,
            poll: PollSettings::default(),
        })
    }

    /// Per-request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Result<Self, ApiError> {
        self.client = build_http_client(timeout_secs)?;
        self.timeout_secs = timeout_secs;
        Ok(self)
    }

    /// Retry each page fetch and read under `retry`. Without one nothing
    /// is retried.
    pub fn with_retry(mut self, retry: Option<RetryExecutor>) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn poll_settings(&self) -> &PollSettings {
        &self.poll
    }

    /// Token from the credential provider, fetched once per client.
    pub async fn access_token(&self) -> Result<AccessToken, AuthError> {
        self.token
            .get_or_try_init(|| self.credentials.access_token(&[CLOUD_PLATFORM_SCOPE]))
            .await
            .cloned()
    }

    pub fn build_request(&self, method: Method, url: &str, token: &AccessToken) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(token.secret())
            .header("Accept", "application/json")
    }

    // Listing

    pub async fn list_services(&self, project: &str, region: &str) -> Result<Vec<WireService>, AppError> {
        let path = format!("/v2/{}/services", location_path(project, region));
        self.list_collection::<ListServicesResponse>(ResourceKind::Service, Api::Run, path, "pageToken")
            .await
    }

    pub async fn list_revisions(
        &self,
        project: &str,
        region: &str,
        service: &str,
    ) -> Result<Vec<WireRevision>, AppError> {
        let path = format!(
            "/v2/{}/services/{}/revisions",
            location_path(project, region),
            service
        );
        self.list_collection::<ListRevisionsResponse>(ResourceKind::Revision, Api::Run, path, "pageToken")
            .await
    }

    pub async fn list_jobs(&self, project: &str, region: &str) -> Result<Vec<WireJob>, AppError> {
        let path = format!("/v2/{}/jobs", location_path(project, region));
        self.list_collection::<ListJobsResponse>(ResourceKind::Job, Api::Run, path, "pageToken")
            .await
    }

    pub async fn list_executions(
        &self,
        project: &str,
        region: &str,
        job: &str,
    ) -> Result<Vec<WireExecution>, AppError> {
        let path = format!("/v2/{}/jobs/{}/executions", location_path(project, region), job);
        self.list_collection::<ListExecutionsResponse>(ResourceKind::Execution, Api::Run, path, "pageToken")
            .await
    }

    pub async fn list_worker_pools(
        &self,
        project: &str,
        region: &str,
    ) -> Result<Vec<WireWorkerPool>, AppError> {
        let path = format!("/v2/{}/workerPools", location_path(project, region));
        self.list_collection::<ListWorkerPoolsResponse>(ResourceKind::WorkerPool, Api::Run, path, "pageToken")
            .await
    }

    pub async fn list_domain_mappings(
        &self,
        project: &str,
        region: &str,
    ) -> Result<Vec<WireDomainMapping>, AppError> {
        let path = format!("/v1/{}/domainmappings", location_path(project, region));
        self.list_collection::<ListDomainMappingsResponse>(
            ResourceKind::DomainMapping,
            Api::Run,
            path,
            "continue",
        )
        .await
    }

    pub async fn search_projects(&self) -> Result<Vec<WireProject>, AppError> {
        self.list_collection::<SearchProjectsResponse>(
            ResourceKind::Project,
            Api::ResourceManager,
            "/v3/projects:search".to_string(),
            "pageToken",
        )
        .await
    }

    // Single resources

    /// The raw JSON document of a resource, unknown fields included.
    pub async fn get_resource(&self, reference: &ResourceRef) -> Result<Value, AppError> {
        let path = format!("/v2/{}", reference.name());
        let token = self.access_token().await?;
        self.with_retry_policy(|| self.send_json::<Value>(Method::GET, Api::Run, &path, None, &token))
            .await
            .map_err(|e| request_error("get", reference, e))
    }

    pub async fn get_service(&self, reference: &ResourceRef) -> Result<WireService, AppError> {
        let raw = self.get_resource(reference).await?;
        decode_value(raw, &reference.name()).map_err(|e| request_error("get", reference, e))
    }

    pub async fn get_worker_pool(&self, reference: &ResourceRef) -> Result<WireWorkerPool, AppError> {
        let raw = self.get_resource(reference).await?;
        decode_value(raw, &reference.name()).map_err(|e| request_error("get", reference, e))
    }

    /// PATCH the full document back. The returned handle resolves to the
    /// updated resource.
    pub async fn update_resource<T: DeserializeOwned>(
        &self,
        reference: &ResourceRef,
        document: &Value,
    ) -> Result<OperationHandle<T>, AppError> {
        let path = format!("/v2/{}", reference.name());
        let token = self.access_token().await?;
        let operation = self
            .send_json::<Operation>(Method::PATCH, Api::Run, &path, Some(document), &token)
            .await
            .map_err(|e| request_error("update", reference, e))?;
        log::debug!("Update of {} started as {}", reference, operation.name);
        Ok(OperationHandle::new(self.clone(), reference.describe(), "update", operation))
    }

    /// Start a job execution. The handle resolves to the execution.
    pub async fn run_job<T: DeserializeOwned>(
        &self,
        reference: &ResourceRef,
    ) -> Result<OperationHandle<T>, AppError> {
        let path = format!("/v2/{}:run", reference.name());
        let token = self.access_token().await?;
        let body = Value::Object(serde_json::Map::new());
        let operation = self
            .send_json::<Operation>(Method::POST, Api::Run, &path, Some(&body), &token)
            .await
            .map_err(|e| request_error("run", reference, e))?;
        log::debug!("Run of {} started as {}", reference, operation.name);
        Ok(OperationHandle::new(self.clone(), reference.describe(), "run", operation))
    }

    /// Current state of a long-running operation started on `target`.
    pub async fn get_operation(&self, name: &str, target: &str) -> Result<Operation, AppError> {
        let path = format!("/v2/{}", name.trim_start_matches('/'));
        let token = self.access_token().await?;
        self.with_retry_policy(|| self.send_json::<Operation>(Method::GET, Api::Run, &path, None, &token))
            .await
            .map_err(|e| AppError::Request {
                action: "poll operation for",
                target: target.to_string(),
                source: classify(e),
            })
    }

    // Plumbing

    async fn list_collection<R>(
        &self,
        resource: ResourceKind,
        api: Api,
        path: String,
        page_param: &'static str,
    ) -> Result<Vec<R::Item>, AppError>
    where
        R: ListResponse + DeserializeOwned,
    {
        let token = self.access_token().await?;
        let fetch = |page: PageToken| self.fetch_page::<R>(api, &path, page_param, page, &token);

        let result = match &self.retry {
            Some(retry) => list_all_with_retry(fetch, retry).await,
            None => list_all(fetch).await,
        };

        result.map_err(|e| AppError::List {
            resource,
            source: classify(e),
        })
    }

    async fn fetch_page<R>(
        &self,
        api: Api,
        path: &str,
        page_param: &str,
        page: PageToken,
        token: &AccessToken,
    ) -> Result<Page<R::Item>, ApiError>
    where
        R: ListResponse + DeserializeOwned,
    {
        let url = format!("{}{}", self.base(api), path);
        let mut request = self.build_request(Method::GET, &url, token);
        if !page.is_end() {
            request = request.query(&[(page_param, page.as_str())]);
        }

        let response = request.send().await.map_err(|e| self.send_error(e, path))?;
        let body: R = self.handle_response(response, path).await?;
        Ok(body.into_page())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        api: Api,
        path: &str,
        body: Option<&Value>,
        token: &AccessToken,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base(api), path);
        let mut request = self.build_request(method, &url, token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| self.send_error(e, path))?;
        self.handle_response(response, path).await
    }

    async fn with_retry_policy<T, F, Fut>(&self, operation: F) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, ApiError>>,
    {
        match &self.retry {
            Some(retry) => retry.execute(operation).await,
            None => operation().await,
        }
    }

    fn base(&self, api: Api) -> &str {
        match api {
            Api::Run => self.endpoints.run.trim_end_matches('/'),
            Api::ResourceManager => self.endpoints.resource_manager.trim_end_matches('/'),
        }
    }

    fn send_error(&self, error: reqwest::Error, endpoint: &str) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout {
                timeout_secs: self.timeout_secs,
                endpoint: endpoint.to_string(),
            }
        } else {
            ApiError::Transport {
                endpoint: endpoint.to_string(),
                message: error.to_string(),
            }
        }
    }

    pub async fn handle_response<T>(&self, response: Response, endpoint: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await.map_err(|e| self.send_error(e, endpoint))?;
            return serde_json::from_slice::<T>(&bytes).map_err(|e| ApiError::Decode {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            });
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(error_from_body(status.as_u16(), endpoint, &error_text, self.timeout_secs))
    }
}

#[derive(Debug, Clone, Copy)]
enum Api {
    Run,
    ResourceManager,
}

fn build_http_client(timeout_secs: u64) -> Result<Client, ApiError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ApiError::Transport {
            endpoint: "client_init".to_string(),
            message: format!("Failed to create HTTP client: {}", e),
        })
}

fn request_error(action: &'static str, reference: &ResourceRef, error: ApiError) -> AppError {
    AppError::Request {
        action,
        target: reference.describe(),
        source: classify(error),
    }
}

fn decode_value<T: DeserializeOwned>(value: Value, endpoint: &str) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// Turn a non-success response into an [`ApiError`], reading the Google
/// error envelope when there is one.
pub(crate) fn error_from_body(status: u16, endpoint: &str, body: &str, timeout_secs: u64) -> ApiError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let status_name = envelope.as_ref().and_then(|e| e.error.status.clone());
    let message = envelope
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    let auth_status = matches!(
        status_name.as_deref(),
        Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED")
    );

    match status {
        401 | 403 => ApiError::Unauthorized {
            status,
            status_name: status_name.unwrap_or_else(|| {
                if status == 401 {
                    "UNAUTHENTICATED".to_string()
                } else {
                    "PERMISSION_DENIED".to_string()
                }
            }),
            endpoint: endpoint.to_string(),
            server_message: message,
        },
        _ if auth_status => ApiError::Unauthorized {
            status,
            status_name: status_name.unwrap_or_default(),
            endpoint: endpoint.to_string(),
            server_message: message,
        },
        408 | 504 => ApiError::Timeout {
            timeout_secs,
            endpoint: endpoint.to_string(),
        },
        _ => ApiError::Http {
            status,
            endpoint: endpoint.to_string(),
            message,
        },
    }
}
