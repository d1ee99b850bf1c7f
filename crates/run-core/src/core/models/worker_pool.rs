use super::common::{
    Condition, Container, map_conditions, map_containers, non_empty, parse_timestamp,
};
use crate::api::models::WireWorkerPool;
use crate::api::resource::short_name;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPool {
    pub name: String,
    pub short_name: String,
    pub region: String,
    pub description: Option<String>,
    pub generation: i64,
    pub labels: BTreeMap<String, String>,
    pub creator: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub instance_count: Option<i32>,
    pub containers: Vec<Container>,
    pub latest_ready_revision: Option<String>,
    pub terminal_condition: Option<Condition>,
    pub conditions: Vec<Condition>,
    pub reconciling: bool,
}

impl WorkerPool {
    pub fn from_wire(wire: &WireWorkerPool, region: &str) -> Self {
        Self {
            name: wire.name.clone(),
            short_name: short_name(&wire.name).to_string(),
            region: region.to_string(),
            description: non_empty(&wire.description),
            generation: wire.generation,
            labels: wire.labels.clone().into_iter().collect(),
            creator: non_empty(&wire.creator),
            create_time: parse_timestamp(wire.create_time.as_deref()),
            update_time: parse_timestamp(wire.update_time.as_deref()),
            instance_count: wire.scaling.as_ref().and_then(|s| s.manual_instance_count),
            containers: wire
                .template
                .as_ref()
                .map(|t| map_containers(&t.containers))
                .unwrap_or_default(),
            latest_ready_revision: non_empty(short_name(&wire.latest_ready_revision)),
            terminal_condition: wire.terminal_condition.as_ref().map(Condition::from_wire),
            conditions: map_conditions(&wire.conditions),
            reconciling: wire.reconciling,
        }
    }

    pub fn status(&self) -> &'static str {
        if self.reconciling {
            return "Deploying";
        }
        self.terminal_condition
            .as_ref()
            .map(Condition::summary)
            .unwrap_or("Unknown")
    }
}
