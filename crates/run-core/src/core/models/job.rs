use super::common::{
    Condition, Container, map_conditions, map_containers, non_empty, parse_timestamp,
};
use crate::api::models::WireJob;
use crate::api::resource::short_name;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub name: String,
    pub short_name: String,
    pub region: String,
    pub generation: i64,
    pub labels: BTreeMap<String, String>,
    pub creator: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub task_count: i32,
    pub parallelism: i32,
    pub max_retries: Option<i32>,
    pub task_timeout: Option<String>,
    pub containers: Vec<Container>,
    pub execution_count: i32,
    pub latest_execution: Option<String>,
    pub latest_execution_time: Option<DateTime<Utc>>,
    pub terminal_condition: Option<Condition>,
    pub conditions: Vec<Condition>,
    pub reconciling: bool,
}

impl Job {
    pub fn from_wire(wire: &WireJob, region: &str) -> Self {
        let template = wire.template.as_ref();
        let task = template.and_then(|t| t.template.as_ref());
        let latest = wire.latest_created_execution.as_ref();

        Self {
            name: wire.name.clone(),
            short_name: short_name(&wire.name).to_string(),
            region: region.to_string(),
            generation: wire.generation,
            labels: wire.labels.clone().into_iter().collect(),
            creator: non_empty(&wire.creator),
            create_time: parse_timestamp(wire.create_time.as_deref()),
            update_time: parse_timestamp(wire.update_time.as_deref()),
            task_count: template.and_then(|t| t.task_count).unwrap_or(1),
            parallelism: template.and_then(|t| t.parallelism).unwrap_or(0),
            max_retries: task.and_then(|t| t.max_retries),
            task_timeout: task.and_then(|t| non_empty(&t.timeout)),
            containers: task.map(|t| map_containers(&t.containers)).unwrap_or_default(),
            execution_count: wire.execution_count,
            latest_execution: latest.and_then(|e| non_empty(short_name(&e.name))),
            latest_execution_time: latest.and_then(|e| parse_timestamp(e.create_time.as_deref())),
            terminal_condition: wire.terminal_condition.as_ref().map(Condition::from_wire),
            conditions: map_conditions(&wire.conditions),
            reconciling: wire.reconciling,
        }
    }

    pub fn status(&self) -> &'static str {
        self.terminal_condition
            .as_ref()
            .map(Condition::summary)
            .unwrap_or("Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire() {
        let wire: WireJob = serde_json::from_str(
            r#"{
                "name": "projects/p/locations/us-east1/jobs/nightly",
                "executionCount": 12,
                "template": {
                    "taskCount": 3,
                    "parallelism": 2,
                    "template": {"containers": [{"image": "img"}], "maxRetries": 1, "timeout": "600s"}
                },
                "latestCreatedExecution": {
                    "name": "projects/p/locations/us-east1/jobs/nightly/executions/nightly-abc",
                    "createTime": "2024-03-01T00:00:00Z"
                },
                "terminalCondition": {"type": "Ready", "state": "CONDITION_SUCCEEDED"}
            }"#,
        )
        .expect("wire job");

        let job = Job::from_wire(&wire, "us-east1");
        assert_eq!(job.short_name, "nightly");
        assert_eq!(job.task_count, 3);
        assert_eq!(job.parallelism, 2);
        assert_eq!(job.max_retries, Some(1));
        assert_eq!(job.task_timeout.as_deref(), Some("600s"));
        assert_eq!(job.latest_execution.as_deref(), Some("nightly-abc"));
        assert!(job.latest_execution_time.is_some());
        assert_eq!(job.status(), "Ready");
    }

    #[test]
    fn test_sparse_job() {
        let job = Job::from_wire(&WireJob::default(), "r");
        assert_eq!(job.task_count, 1);
        assert!(job.containers.is_empty());
        assert!(job.latest_execution.is_none());
        assert!(job.terminal_condition.is_none());
    }
}
