//! Pieces shared by several entities.

use crate::api::models::{
    WireCondition, WireContainer, WireResourceRecord, WireRevisionScaling, WireServiceScaling,
    WireTrafficStatus, WireV1Condition,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// RFC3339 timestamp, or `None` when missing or malformed.
pub fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub state: String,
    pub message: Option<String>,
    pub reason: Option<String>,
    pub severity: Option<String>,
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl Condition {
    pub fn from_wire(wire: &WireCondition) -> Self {
        Self {
            condition_type: wire.condition_type.clone(),
            state: wire.state.clone(),
            message: non_empty(&wire.message),
            reason: non_empty(&wire.reason),
            severity: non_empty(&wire.severity),
            last_transition_time: parse_timestamp(wire.last_transition_time.as_deref()),
        }
    }

    /// Knative-style conditions carry "True"/"False"/"Unknown" instead of
    /// a state enum.
    pub fn from_v1(wire: &WireV1Condition) -> Self {
        let state = match wire.status.as_str() {
            "True" => "CONDITION_SUCCEEDED",
            "False" => "CONDITION_FAILED",
            "Unknown" => "CONDITION_RECONCILING",
            _ => "STATE_UNSPECIFIED",
        };
        Self {
            condition_type: wire.condition_type.clone(),
            state: state.to_string(),
            message: non_empty(&wire.message),
            reason: non_empty(&wire.reason),
            severity: None,
            last_transition_time: parse_timestamp(wire.last_transition_time.as_deref()),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.state == "CONDITION_SUCCEEDED"
    }

    pub fn is_failed(&self) -> bool {
        self.state == "CONDITION_FAILED"
    }

    /// Short status word for tables.
    pub fn summary(&self) -> &'static str {
        match self.state.as_str() {
            "CONDITION_SUCCEEDED" => "Ready",
            "CONDITION_FAILED" => "Failed",
            "CONDITION_RECONCILING" | "CONDITION_PENDING" => "Pending",
            _ => "Unknown",
        }
    }
}

pub fn map_conditions(wire: &[WireCondition]) -> Vec<Condition> {
    wire.iter().map(Condition::from_wire).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: Option<String>,
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub ports: Vec<i32>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
}

impl Container {
    pub fn from_wire(wire: &WireContainer) -> Self {
        let limits = wire.resources.as_ref().map(|r| &r.limits);
        Self {
            name: non_empty(&wire.name),
            image: wire.image.clone(),
            command: wire.command.clone(),
            args: wire.args.clone(),
            env: wire
                .env
                .iter()
                .map(|e| (e.name.clone(), e.value.clone().unwrap_or_default()))
                .collect(),
            ports: wire.ports.iter().map(|p| p.container_port).collect(),
            cpu: limits.and_then(|l| l.get("cpu").cloned()),
            memory: limits.and_then(|l| l.get("memory").cloned()),
        }
    }
}

pub fn map_containers(wire: &[WireContainer]) -> Vec<Container> {
    wire.iter().map(Container::from_wire).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalingMode {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scaling {
    pub mode: ScalingMode,
    pub min_instances: Option<i32>,
    pub max_instances: Option<i32>,
    pub manual_instances: Option<i32>,
}

impl Scaling {
    pub fn from_service(wire: &WireServiceScaling) -> Self {
        let mode = match wire.scaling_mode.as_deref() {
            Some("MANUAL") => ScalingMode::Manual,
            _ => ScalingMode::Automatic,
        };
        Self {
            mode,
            min_instances: wire.min_instance_count,
            max_instances: wire.max_instance_count,
            manual_instances: wire.manual_instance_count,
        }
    }

    pub fn from_revision(wire: &WireRevisionScaling) -> Self {
        Self {
            mode: ScalingMode::Automatic,
            min_instances: wire.min_instance_count,
            max_instances: wire.max_instance_count,
            manual_instances: None,
        }
    }

    pub fn manual(count: Option<i32>) -> Self {
        Self {
            mode: ScalingMode::Manual,
            min_instances: None,
            max_instances: None,
            manual_instances: count,
        }
    }

    /// `manual: 3`, `auto: 0-10`, `auto: 1-` and so on.
    pub fn summary(&self) -> String {
        match self.mode {
            ScalingMode::Manual => format!(
                "manual: {}",
                self.manual_instances
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ),
            ScalingMode::Automatic => format!(
                "auto: {}-{}",
                self.min_instances.unwrap_or(0),
                self.max_instances
                    .map(|n| n.to_string())
                    .unwrap_or_default()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficStatus {
    pub target_type: String,
    pub revision: Option<String>,
    pub percent: i32,
    pub tag: Option<String>,
    pub uri: Option<String>,
}

impl TrafficStatus {
    pub fn from_wire(wire: &WireTrafficStatus) -> Self {
        Self {
            target_type: wire.target_type.clone(),
            revision: non_empty(&wire.revision),
            percent: wire.percent,
            tag: non_empty(&wire.tag),
            uri: non_empty(&wire.uri),
        }
    }

    pub fn is_latest(&self) -> bool {
        self.target_type == "TRAFFIC_TARGET_ALLOCATION_TYPE_LATEST"
    }
}

/// DNS record a domain mapping asks the owner to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub name: String,
    pub record_type: String,
    pub rrdata: String,
}

impl ResourceRecord {
    pub fn from_wire(wire: &WireResourceRecord) -> Self {
        Self {
            name: wire.name.clone(),
            record_type: wire.record_type.clone(),
            rrdata: wire.rrdata.clone(),
        }
    }
}
