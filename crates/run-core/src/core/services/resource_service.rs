use crate::AppError;
use crate::api::client::RunClient;
use crate::api::fanout::{Fanout, FanoutReport, RegionError, RegionErrorPolicy, RegionSelector};
use crate::api::models::{WireExecution, WireService, WireWorkerPool};
use crate::api::resource::{ResourceKind, ResourceRef};
use crate::core::models::{
    DomainMapping, Execution, Job, Project, Revision, Service, WorkerPool,
};
use crate::error::{ApiError, ClassifiedError};
use crate::utils::validation::ScaleRequest;
use serde_json::{Map, Value, json};
use std::future::Future;

/// Outcome of `run_job`.
#[derive(Debug, Clone, PartialEq)]
pub enum JobRun {
    /// The execution was started; the operation is still running.
    Started { operation: String },
    /// The operation finished and produced this execution.
    Finished(Execution),
}

/// Lists, describes and updates Cloud Run resources across regions.
#[derive(Debug, Clone)]
pub struct ResourceService {
    client: RunClient,
    fanout: Fanout,
    policy: RegionErrorPolicy,
}

impl ResourceService {
    pub fn new(client: RunClient) -> Self {
        Self {
            client,
            fanout: Fanout::default(),
            policy: RegionErrorPolicy::default(),
        }
    }

    pub fn with_fanout(mut self, fanout: Fanout) -> Self {
        self.fanout = fanout;
        self
    }

    pub fn with_policy(mut self, policy: RegionErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn client(&self) -> &RunClient {
        &self.client
    }

    pub async fn list_services(
        &self,
        project: &str,
        selector: &RegionSelector,
    ) -> Result<Vec<Service>, AppError> {
        let client = self.client.clone();
        self.collect(ResourceKind::Service, project, selector, move |project, region| {
            let client = client.clone();
            async move {
                let wires = client.list_services(&project, &region).await?;
                Ok::<_, AppError>(wires.iter().map(|w| Service::from_wire(w, &region)).collect())
            }
        })
        .await
    }

    pub async fn list_revisions(
        &self,
        project: &str,
        selector: &RegionSelector,
        service: &str,
    ) -> Result<Vec<Revision>, AppError> {
        let client = self.client.clone();
        let service = service.to_string();
        self.collect(ResourceKind::Revision, project, selector, move |project, region| {
            let client = client.clone();
            let service = service.clone();
            async move {
                let wires = client.list_revisions(&project, &region, &service).await?;
                Ok::<_, AppError>(wires.iter().map(|w| Revision::from_wire(w, &region)).collect())
            }
        })
        .await
    }

    pub async fn list_jobs(
        &self,
        project: &str,
        selector: &RegionSelector,
    ) -> Result<Vec<Job>, AppError> {
        let client = self.client.clone();
        self.collect(ResourceKind::Job, project, selector, move |project, region| {
            let client = client.clone();
            async move {
                let wires = client.list_jobs(&project, &region).await?;
                Ok::<_, AppError>(wires.iter().map(|w| Job::from_wire(w, &region)).collect())
            }
        })
        .await
    }

    pub async fn list_executions(
        &self,
        project: &str,
        selector: &RegionSelector,
        job: &str,
    ) -> Result<Vec<Execution>, AppError> {
        let client = self.client.clone();
        let job = job.to_string();
        self.collect(ResourceKind::Execution, project, selector, move |project, region| {
            let client = client.clone();
            let job = job.clone();
            async move {
                let wires = client.list_executions(&project, &region, &job).await?;
                Ok::<_, AppError>(wires.iter().map(|w| Execution::from_wire(w, &region)).collect())
            }
        })
        .await
    }

    pub async fn list_worker_pools(
        &self,
        project: &str,
        selector: &RegionSelector,
    ) -> Result<Vec<WorkerPool>, AppError> {
        let client = self.client.clone();
        self.collect(ResourceKind::WorkerPool, project, selector, move |project, region| {
            let client = client.clone();
            async move {
                let wires = client.list_worker_pools(&project, &region).await?;
                Ok::<_, AppError>(wires.iter().map(|w| WorkerPool::from_wire(w, &region)).collect())
            }
        })
        .await
    }

    pub async fn list_domain_mappings(
        &self,
        project: &str,
        selector: &RegionSelector,
    ) -> Result<Vec<DomainMapping>, AppError> {
        let client = self.client.clone();
        self.collect(ResourceKind::DomainMapping, project, selector, move |project, region| {
            let client = client.clone();
            async move {
                let wires = client.list_domain_mappings(&project, &region).await?;
                Ok::<_, AppError>(
                    wires
                        .iter()
                        .map(|w| DomainMapping::from_wire(w, &region))
                        .collect(),
                )
            }
        })
        .await
    }

    /// Projects visible to the caller. Not regional.
    pub async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let wires = self.client.search_projects().await?;
        Ok(wires.iter().map(Project::from_wire).collect())
    }

    pub async fn describe_service(&self, reference: &ResourceRef) -> Result<Service, AppError> {
        let wire = self.client.get_service(reference).await?;
        Ok(Service::from_wire(&wire, reference.region()))
    }

    pub async fn describe_worker_pool(&self, reference: &ResourceRef) -> Result<WorkerPool, AppError> {
        let wire = self.client.get_worker_pool(reference).await?;
        Ok(WorkerPool::from_wire(&wire, reference.region()))
    }

    /// Apply `request` to the service and wait for the rollout.
    pub async fn scale_service(
        &self,
        reference: &ResourceRef,
        request: ScaleRequest,
    ) -> Result<Service, AppError> {
        let mut document = self.client.get_resource(reference).await?;
        apply_service_scaling(&mut document, request, &reference.name())?;
        log::info!("Scaling {} ({:?})", reference.describe(), request);

        let operation = self
            .client
            .update_resource::<WireService>(reference, &document)
            .await?;
        let wire = operation.wait().await?;
        Ok(Service::from_wire(&wire, reference.region()))
    }

    /// Set a worker pool's manual instance count and wait for the rollout.
    pub async fn scale_worker_pool(
        &self,
        reference: &ResourceRef,
        instances: u32,
    ) -> Result<WorkerPool, AppError> {
        let mut document = self.client.get_resource(reference).await?;
        apply_worker_pool_scaling(&mut document, instances, &reference.name())?;
        log::info!("Scaling {} to {} instance(s)", reference.describe(), instances);

        let operation = self
            .client
            .update_resource::<WireWorkerPool>(reference, &document)
            .await?;
        let wire = operation.wait().await?;
        Ok(WorkerPool::from_wire(&wire, reference.region()))
    }

    /// Start an execution of a job. With `wait`, block until it completes.
    pub async fn run_job(&self, reference: &ResourceRef, wait: bool) -> Result<JobRun, AppError> {
        let operation = self.client.run_job::<WireExecution>(reference).await?;
        if !wait {
            return Ok(JobRun::Started {
                operation: operation.name().to_string(),
            });
        }
        let wire = operation.wait().await?;
        Ok(JobRun::Finished(Execution::from_wire(&wire, reference.region())))
    }

    async fn collect<T, F, Fut>(
        &self,
        resource: ResourceKind,
        project: &str,
        selector: &RegionSelector,
        per_region: F,
    ) -> Result<Vec<T>, AppError>
    where
        F: Fn(String, String) -> Fut,
        Fut: Future<Output = Result<Vec<T>, AppError>> + Send + 'static,
        T: Send + 'static,
    {
        match selector {
            RegionSelector::Region(_) => self.fanout.list(project, selector, per_region).await,
            RegionSelector::AllRegions => {
                let report = self.fanout.fan_out(project, per_region).await;
                self.apply_policy(resource, report)
            }
        }
    }

    fn apply_policy<T>(
        &self,
        resource: ResourceKind,
        report: FanoutReport<T, AppError>,
    ) -> Result<Vec<T>, AppError> {
        let (items, mut failures) = report.into_parts();
        if failures.is_empty() {
            return Ok(items);
        }
        failures.sort_by(|a, b| a.0.cmp(&b.0));

        match self.policy {
            RegionErrorPolicy::Ignore => {
                log::debug!(
                    "Ignoring {} failed region(s) while listing {}",
                    failures.len(),
                    resource
                );
            }
            RegionErrorPolicy::Warn => {
                let all_auth = failures
                    .iter()
                    .all(|(_, err)| matches!(err, RegionError::Failed(e) if e.is_auth()));
                match failures.first() {
                    Some((_, err)) if all_auth => {
                        log::warn!("Skipped {} region(s): {}", failures.len(), err);
                    }
                    _ => {
                        for (region, err) in &failures {
                            log::warn!("Skipping region {}: {}", region, err);
                        }
                    }
                }
            }
            RegionErrorPolicy::Fail => {
                if let Some((region, err)) = failures.into_iter().next() {
                    return Err(self.region_failure(resource, region, err));
                }
            }
        }

        Ok(items)
    }

    fn region_failure(
        &self,
        resource: ResourceKind,
        region: String,
        error: RegionError<AppError>,
    ) -> AppError {
        let cause = match error {
            RegionError::Failed(err) => return err,
            RegionError::TimedOut => ApiError::Timeout {
                timeout_secs: self.fanout.deadline().map(|d| d.as_secs().max(1)).unwrap_or_default(),
                endpoint: format!("region {}", region),
            },
            RegionError::Aborted(reason) => ApiError::Transport {
                endpoint: format!("region {}", region),
                message: reason,
            },
        };
        AppError::List {
            resource,
            source: ClassifiedError::Other(cause),
        }
    }
}

fn scaling_section<'a>(
    document: &'a mut Value,
    name: &str,
) -> Result<&'a mut Map<String, Value>, ApiError> {
    let not_an_object = || ApiError::Decode {
        endpoint: format!("/v2/{}", name),
        message: "resource is not a JSON object".to_string(),
    };
    let object = document.as_object_mut().ok_or_else(not_an_object)?;
    let scaling = object.entry("scaling").or_insert(Value::Null);
    if !scaling.is_object() {
        *scaling = Value::Object(Map::new());
    }
    scaling.as_object_mut().ok_or_else(not_an_object)
}

/// Rewrite the service-level `scaling` block. Other fields are untouched.
pub fn apply_service_scaling(
    document: &mut Value,
    request: ScaleRequest,
    name: &str,
) -> Result<(), ApiError> {
    let scaling = scaling_section(document, name)?;
    match request {
        ScaleRequest::Manual { instances } => {
            scaling.insert("scalingMode".to_string(), json!("MANUAL"));
            scaling.insert("manualInstanceCount".to_string(), json!(instances));
        }
        ScaleRequest::Automatic { min, max } => {
            scaling.insert("scalingMode".to_string(), json!("AUTOMATIC"));
            scaling.remove("manualInstanceCount");
            scaling.insert("minInstanceCount".to_string(), json!(min));
            match max {
                Some(max) => {
                    scaling.insert("maxInstanceCount".to_string(), json!(max));
                }
                None => {
                    scaling.remove("maxInstanceCount");
                }
            }
        }
    }
    Ok(())
}

/// Set `scaling.manualInstanceCount` on a worker pool document.
pub fn apply_worker_pool_scaling(
    document: &mut Value,
    instances: u32,
    name: &str,
) -> Result<(), ApiError> {
    let scaling = scaling_section(document, name)?;
    scaling.insert("manualInstanceCount".to_string(), json!(instances));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fanout::RegionOutcome;
    use crate::storage::credentials::StaticTokenProvider;
    use std::sync::Arc;

    fn service(policy: RegionErrorPolicy) -> ResourceService {
        let client = RunClient::new(Arc::new(StaticTokenProvider::new("token"))).expect("client");
        ResourceService::new(client).with_policy(policy)
    }

    fn auth_failure() -> AppError {
        AppError::List {
            resource: ResourceKind::Service,
            source: crate::api::classify::classify(ApiError::Unauthorized {
                status: 403,
                status_name: "PERMISSION_DENIED".to_string(),
                endpoint: "/v2/x".to_string(),
                server_message: "denied".to_string(),
            }),
        }
    }

    fn report(error: Option<RegionError<AppError>>) -> FanoutReport<&'static str, AppError> {
        FanoutReport {
            outcomes: vec![
                RegionOutcome {
                    region: "us-central1".to_string(),
                    items: vec!["a", "b"],
                    error: None,
                },
                RegionOutcome {
                    region: "asia-east1".to_string(),
                    items: Vec::new(),
                    error,
                },
            ],
        }
    }

    #[test]
    fn test_warn_and_ignore_keep_successful_regions() {
        for policy in [RegionErrorPolicy::Warn, RegionErrorPolicy::Ignore] {
            let items = service(policy)
                .apply_policy(ResourceKind::Service, report(Some(RegionError::Failed(auth_failure()))))
                .expect("policy keeps going");
            assert_eq!(items, vec!["a", "b"]);
        }
    }

    #[test]
    fn test_fail_policy_returns_region_error() {
        let err = service(RegionErrorPolicy::Fail)
            .apply_policy(ResourceKind::Service, report(Some(RegionError::Failed(auth_failure()))))
            .expect_err("fail policy");
        assert!(err.is_auth());
        assert!(err.to_string().starts_with("failed to list services: authentication failed"));
    }

    #[test]
    fn test_fail_policy_reports_timeouts() {
        let err = service(RegionErrorPolicy::Fail)
            .apply_policy(ResourceKind::Job, report(Some(RegionError::TimedOut)))
            .expect_err("timed out region");
        let message = err.to_string();
        assert!(message.starts_with("failed to list jobs"));
        assert!(message.contains("region asia-east1"));
    }

    #[test]
    fn test_fail_policy_without_failures() {
        let items = service(RegionErrorPolicy::Fail)
            .apply_policy(ResourceKind::Service, report(None))
            .expect("no failures");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_manual_service_scaling_keeps_unknown_fields() {
        let mut document = json!({
            "name": "projects/p/locations/r/services/api",
            "etag": "abc",
            "customAudiences": ["x"],
            "scaling": {"minInstanceCount": 1}
        });
        apply_service_scaling(&mut document, ScaleRequest::Manual { instances: 3 }, "api")
            .expect("scaling");

        assert_eq!(document["etag"], "abc");
        assert_eq!(document["customAudiences"][0], "x");
        assert_eq!(document["scaling"]["scalingMode"], "MANUAL");
        assert_eq!(document["scaling"]["manualInstanceCount"], 3);
        assert_eq!(document["scaling"]["minInstanceCount"], 1);
    }

    #[test]
    fn test_automatic_service_scaling() {
        let mut document = json!({"scaling": {"manualInstanceCount": 4, "maxInstanceCount": 9}});
        apply_service_scaling(
            &mut document,
            ScaleRequest::Automatic { min: 1, max: None },
            "api",
        )
        .expect("scaling");

        let scaling = &document["scaling"];
        assert_eq!(scaling["scalingMode"], "AUTOMATIC");
        assert_eq!(scaling["minInstanceCount"], 1);
        assert!(scaling.get("maxInstanceCount").is_none());
        assert!(scaling.get("manualInstanceCount").is_none());

        apply_service_scaling(
            &mut document,
            ScaleRequest::Automatic { min: 2, max: Some(5) },
            "api",
        )
        .expect("scaling");
        assert_eq!(document["scaling"]["maxInstanceCount"], 5);
    }

    #[test]
    fn test_worker_pool_scaling_creates_section() {
        let mut document = json!({"name": "pool", "scaling": null});
        apply_worker_pool_scaling(&mut document, 2, "pool").expect("scaling");
        assert_eq!(document["scaling"]["manualInstanceCount"], 2);
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let mut document = json!([1, 2]);
        assert!(apply_worker_pool_scaling(&mut document, 2, "pool").is_err());
    }
}
