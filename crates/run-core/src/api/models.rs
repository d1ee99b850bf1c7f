//! Wire structures of the Cloud Run and Resource Manager REST APIs.
//!
//! These mirror the JSON the servers send. Everything is optional or
//! defaulted so a sparse response still decodes; the mappers in
//! `core::models` turn them into domain entities.

use crate::api::pagination::{ListResponse, Page};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// int64 fields arrive as JSON strings, int32 fields as numbers. Accept
/// both and fall back to zero on anything else.
fn deserialize_int64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(n) => Ok(n.as_i64().unwrap_or_default()),
        Value::String(s) => Ok(s.parse::<i64>().unwrap_or_default()),
        _ => Ok(0),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub state: String,
    pub message: String,
    pub last_transition_time: Option<String>,
    pub severity: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireEnvVar {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireResources {
    pub limits: HashMap<String, String>,
    pub cpu_idle: bool,
    pub startup_cpu_boost: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WirePort {
    pub name: String,
    pub container_port: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireContainer {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub env: Vec<WireEnvVar>,
    pub resources: Option<WireResources>,
    pub ports: Vec<WirePort>,
}

/// Revision-level autoscaling bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireRevisionScaling {
    pub min_instance_count: Option<i32>,
    pub max_instance_count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireRevisionTemplate {
    pub revision: String,
    pub containers: Vec<WireContainer>,
    pub scaling: Option<WireRevisionScaling>,
    pub service_account: String,
    pub timeout: String,
    pub max_instance_request_concurrency: Option<i32>,
}

/// Service-level scaling: either automatic within bounds, or a fixed
/// instance count in manual mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireServiceScaling {
    pub min_instance_count: Option<i32>,
    pub max_instance_count: Option<i32>,
    pub scaling_mode: Option<String>,
    pub manual_instance_count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireTrafficStatus {
    #[serde(rename = "type")]
    pub target_type: String,
    pub revision: String,
    pub percent: i32,
    pub tag: String,
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireService {
    pub name: String,
    pub uid: String,
    pub description: String,
    #[serde(deserialize_with = "deserialize_int64")]
    pub generation: i64,
    pub labels: HashMap<String, String>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
    pub creator: String,
    pub last_modifier: String,
    pub ingress: String,
    pub launch_stage: String,
    pub uri: String,
    pub urls: Vec<String>,
    pub template: Option<WireRevisionTemplate>,
    pub scaling: Option<WireServiceScaling>,
    pub traffic_statuses: Vec<WireTrafficStatus>,
    pub terminal_condition: Option<WireCondition>,
    pub conditions: Vec<WireCondition>,
    pub latest_ready_revision: String,
    pub latest_created_revision: String,
    pub reconciling: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireRevision {
    pub name: String,
    pub uid: String,
    #[serde(deserialize_with = "deserialize_int64")]
    pub generation: i64,
    pub service: String,
    pub create_time: Option<String>,
    pub containers: Vec<WireContainer>,
    pub scaling: Option<WireRevisionScaling>,
    pub max_instance_request_concurrency: Option<i32>,
    pub service_account: String,
    pub timeout: String,
    pub conditions: Vec<WireCondition>,
    pub log_uri: String,
    pub reconciling: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireTaskTemplate {
    pub containers: Vec<WireContainer>,
    pub max_retries: Option<i32>,
    pub timeout: String,
    pub service_account: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireExecutionTemplate {
    pub parallelism: Option<i32>,
    pub task_count: Option<i32>,
    pub template: Option<WireTaskTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireExecutionReference {
    pub name: String,
    pub create_time: Option<String>,
    pub completion_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireJob {
    pub name: String,
    pub uid: String,
    #[serde(deserialize_with = "deserialize_int64")]
    pub generation: i64,
    pub labels: HashMap<String, String>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
    pub creator: String,
    pub last_modifier: String,
    pub launch_stage: String,
    pub template: Option<WireExecutionTemplate>,
    pub terminal_condition: Option<WireCondition>,
    pub conditions: Vec<WireCondition>,
    pub execution_count: i32,
    pub latest_created_execution: Option<WireExecutionReference>,
    pub reconciling: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireExecution {
    pub name: String,
    pub uid: String,
    pub job: String,
    pub create_time: Option<String>,
    pub start_time: Option<String>,
    pub completion_time: Option<String>,
    pub task_count: i32,
    pub parallelism: i32,
    pub succeeded_count: i32,
    pub failed_count: i32,
    pub running_count: i32,
    pub cancelled_count: i32,
    pub retried_count: i32,
    pub log_uri: String,
    pub conditions: Vec<WireCondition>,
    pub reconciling: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireWorkerPoolScaling {
    pub manual_instance_count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireWorkerPoolTemplate {
    pub containers: Vec<WireContainer>,
    pub service_account: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireWorkerPool {
    pub name: String,
    pub uid: String,
    pub description: String,
    #[serde(deserialize_with = "deserialize_int64")]
    pub generation: i64,
    pub labels: HashMap<String, String>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
    pub creator: String,
    pub last_modifier: String,
    pub launch_stage: String,
    pub scaling: Option<WireWorkerPoolScaling>,
    pub template: Option<WireWorkerPoolTemplate>,
    pub terminal_condition: Option<WireCondition>,
    pub conditions: Vec<WireCondition>,
    pub latest_ready_revision: String,
    pub reconciling: bool,
}

/// Domain mappings only exist in the Knative-style v1 API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireObjectMeta {
    pub name: String,
    pub namespace: String,
    pub creation_timestamp: Option<String>,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireDomainMappingSpec {
    pub route_name: String,
    pub certificate_mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireV1Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    pub reason: String,
    pub message: String,
    pub last_transition_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireResourceRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub rrdata: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireDomainMappingStatus {
    pub conditions: Vec<WireV1Condition>,
    pub mapped_route_name: String,
    pub url: String,
    pub resource_records: Vec<WireResourceRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireDomainMapping {
    pub metadata: Option<WireObjectMeta>,
    pub spec: Option<WireDomainMappingSpec>,
    pub status: Option<WireDomainMappingStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireProject {
    /// `projects/{number}`
    pub name: String,
    pub project_id: String,
    pub display_name: String,
    pub state: String,
    pub parent: String,
    pub create_time: Option<String>,
    pub labels: HashMap<String, String>,
}

// List responses

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListServicesResponse {
    pub services: Vec<WireService>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListRevisionsResponse {
    pub revisions: Vec<WireRevision>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListJobsResponse {
    pub jobs: Vec<WireJob>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListExecutionsResponse {
    pub executions: Vec<WireExecution>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListWorkerPoolsResponse {
    pub worker_pools: Vec<WireWorkerPool>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListMeta {
    #[serde(rename = "continue")]
    pub continue_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListDomainMappingsResponse {
    pub items: Vec<WireDomainMapping>,
    pub metadata: Option<ListMeta>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchProjectsResponse {
    pub projects: Vec<WireProject>,
    pub next_page_token: Option<String>,
}

impl ListResponse for ListServicesResponse {
    type Item = WireService;

    fn into_page(self) -> Page<WireService> {
        Page::new(self.services, self.next_page_token)
    }
}

impl ListResponse for ListRevisionsResponse {
    type Item = WireRevision;

    fn into_page(self) -> Page<WireRevision> {
        Page::new(self.revisions, self.next_page_token)
    }
}

impl ListResponse for ListJobsResponse {
    type Item = WireJob;

    fn into_page(self) -> Page<WireJob> {
        Page::new(self.jobs, self.next_page_token)
    }
}

impl ListResponse for ListExecutionsResponse {
    type Item = WireExecution;

    fn into_page(self) -> Page<WireExecution> {
        Page::new(self.executions, self.next_page_token)
    }
}

impl ListResponse for ListWorkerPoolsResponse {
    type Item = WireWorkerPool;

    fn into_page(self) -> Page<WireWorkerPool> {
        Page::new(self.worker_pools, self.next_page_token)
    }
}

impl ListResponse for ListDomainMappingsResponse {
    type Item = WireDomainMapping;

    fn into_page(self) -> Page<WireDomainMapping> {
        let token = self.metadata.and_then(|m| m.continue_token);
        Page::new(self.items, token)
    }
}

impl ListResponse for SearchProjectsResponse {
    type Item = WireProject;

    fn into_page(self) -> Page<WireProject> {
        Page::new(self.projects, self.next_page_token)
    }
}

/// `google.rpc.Status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireStatus {
    pub code: i32,
    pub message: String,
    pub status: Option<String>,
}

/// Long-running operation resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operation {
    pub name: String,
    pub done: bool,
    pub error: Option<WireStatus>,
    pub response: Option<Value>,
    pub metadata: Option<Value>,
}

/// Body of a failed Google API call: `{"error": {...}}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorEnvelope {
    pub error: WireStatus,
}
