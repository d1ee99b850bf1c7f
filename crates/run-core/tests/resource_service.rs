//! `ResourceService` flows: region fan-out and operation polling.

use run_core::api::client::{Endpoints, RunClient};
use run_core::api::fanout::{Fanout, RegionErrorPolicy, RegionSelector};
use run_core::api::operation::PollSettings;
use run_core::api::resource::{ResourceKind, ResourceRef};
use run_core::core::models::ScalingMode;
use run_core::core::services::resource_service::{JobRun, ResourceService};
use run_core::storage::credentials::StaticTokenProvider;
use run_core::utils::validation::ScaleRequest;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE_NAME: &str = "projects/my-project/locations/us-central1/services/api";
const OPERATION_NAME: &str = "projects/my-project/locations/us-central1/operations/op-1";

fn resources(server: &MockServer) -> ResourceService {
    let client = RunClient::with_endpoints(
        Endpoints::single(&server.uri()),
        Arc::new(StaticTokenProvider::new("test-token")),
    )
    .expect("client")
    .with_poll_settings(PollSettings {
        initial_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(20),
        multiplier: 1.5,
        timeout: Duration::from_secs(5),
    });
    ResourceService::new(client).with_fanout(Fanout::new(["us-central1", "europe-west1"]))
}

async fn mount_regions(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/projects/my-project/locations/us-central1/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": [
                {"name": "projects/my-project/locations/us-central1/jobs/nightly"},
                {"name": "projects/my-project/locations/us-central1/jobs/hourly"}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/projects/my-project/locations/europe-west1/jobs"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "denied", "status": "PERMISSION_DENIED"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_all_regions_drops_failing_region() {
    let server = MockServer::start().await;
    mount_regions(&server).await;

    let jobs = resources(&server)
        .list_jobs("my-project", &RegionSelector::AllRegions)
        .await
        .expect("partial results");

    let names: Vec<&str> = jobs.iter().map(|j| j.short_name.as_str()).collect();
    assert_eq!(names, vec!["nightly", "hourly"]);
    assert!(jobs.iter().all(|j| j.region == "us-central1"));
}

#[tokio::test]
async fn test_fail_policy_surfaces_region_error() {
    let server = MockServer::start().await;
    mount_regions(&server).await;

    let err = resources(&server)
        .with_policy(RegionErrorPolicy::Fail)
        .list_jobs("my-project", &RegionSelector::AllRegions)
        .await
        .expect_err("europe-west1 fails");

    assert!(err.is_auth());
    assert!(err.to_string().starts_with("failed to list jobs: authentication failed"));
}

#[tokio::test]
async fn test_concrete_region_returns_its_error() {
    let server = MockServer::start().await;
    mount_regions(&server).await;

    let err = resources(&server)
        .list_jobs("my-project", &RegionSelector::Region("europe-west1".to_string()))
        .await
        .expect_err("concrete region error is not dropped");
    assert!(err.is_auth());
}

async fn mount_slow_region(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/projects/my-project/locations/us-central1/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": [{"name": "projects/my-project/locations/us-central1/jobs/nightly"}]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/projects/my-project/locations/europe-west1/jobs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"jobs": []}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(server)
        .await;
}

fn with_deadline(resources: ResourceService) -> ResourceService {
    resources.with_fanout(
        Fanout::new(["us-central1", "europe-west1"]).with_deadline(Duration::from_millis(300)),
    )
}

#[tokio::test]
async fn test_deadline_drops_slow_region() {
    let server = MockServer::start().await;
    mount_slow_region(&server).await;

    let jobs = with_deadline(resources(&server))
        .list_jobs("my-project", &RegionSelector::AllRegions)
        .await
        .expect("slow region is dropped");

    let names: Vec<&str> = jobs.iter().map(|j| j.short_name.as_str()).collect();
    assert_eq!(names, vec!["nightly"]);
}

#[tokio::test]
async fn test_deadline_with_fail_policy_reports_timeout() {
    let server = MockServer::start().await;
    mount_slow_region(&server).await;

    let err = with_deadline(resources(&server))
        .with_policy(RegionErrorPolicy::Fail)
        .list_jobs("my-project", &RegionSelector::AllRegions)
        .await
        .expect_err("slow region fails the listing");

    assert!(!err.is_auth());
    assert_eq!(
        err.to_string(),
        "failed to list jobs: request to region europe-west1 timed out after 1s"
    );
}

#[tokio::test]
async fn test_scale_service_patches_document_and_waits() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v2/{}", SERVICE_NAME)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": SERVICE_NAME,
            "etag": "\"abc\"",
            "invokerIamDisabled": true,
            "scaling": {"minInstanceCount": 0}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/v2/{}", SERVICE_NAME)))
        .and(body_partial_json(json!({
            "etag": "\"abc\"",
            "invokerIamDisabled": true,
            "scaling": {"scalingMode": "MANUAL", "manualInstanceCount": 3}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION_NAME,
            "done": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v2/{}", OPERATION_NAME)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": OPERATION_NAME, "done": false})))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v2/{}", OPERATION_NAME)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION_NAME,
            "done": true,
            "response": {
                "@type": "type.googleapis.com/google.cloud.run.v2.Service",
                "name": SERVICE_NAME,
                "scaling": {"scalingMode": "MANUAL", "manualInstanceCount": 3}
            }
        })))
        .mount(&server)
        .await;

    let reference = ResourceRef::new("my-project", "us-central1", ResourceKind::Service, "api");
    let service = resources(&server)
        .scale_service(&reference, ScaleRequest::Manual { instances: 3 })
        .await
        .expect("scaled");

    assert_eq!(service.short_name, "api");
    assert_eq!(service.region, "us-central1");
    assert_eq!(service.scaling.mode, ScalingMode::Manual);
    assert_eq!(service.scaling.manual_instances, Some(3));
}

#[tokio::test]
async fn test_failed_operation_is_reported_against_the_resource() {
    let server = MockServer::start().await;
    let pool_name = "projects/my-project/locations/us-central1/workerPools/consumers";

    Mock::given(method("GET"))
        .and(path(format!("/v2/{}", pool_name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": pool_name})))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/v2/{}", pool_name)))
        .and(body_partial_json(json!({"scaling": {"manualInstanceCount": 2}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION_NAME,
            "done": true,
            "error": {"code": 3, "message": "quota exceeded"}
        })))
        .mount(&server)
        .await;

    let reference = ResourceRef::new("my-project", "us-central1", ResourceKind::WorkerPool, "consumers");
    let err = resources(&server)
        .scale_worker_pool(&reference, 2)
        .await
        .expect_err("operation error");

    assert_eq!(
        err.to_string(),
        format!(
            "failed to update worker pool 'consumers': operation {} failed with code 3: quota exceeded",
            OPERATION_NAME
        )
    );
}

#[tokio::test]
async fn test_run_job_without_waiting() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/projects/my-project/locations/us-central1/jobs/nightly:run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION_NAME,
            "done": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reference = ResourceRef::new("my-project", "us-central1", ResourceKind::Job, "nightly");
    let run = resources(&server).run_job(&reference, false).await.expect("started");
    assert_eq!(
        run,
        JobRun::Started {
            operation: OPERATION_NAME.to_string()
        }
    );
}
