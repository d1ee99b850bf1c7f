use super::common::{
    Condition, Container, Scaling, TrafficStatus, map_conditions, map_containers, non_empty,
    parse_timestamp,
};
use crate::api::models::WireService;
use crate::api::resource::short_name;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Fully-qualified resource name.
    pub name: String,
    pub short_name: String,
    pub region: String,
    pub uid: String,
    pub description: Option<String>,
    pub generation: i64,
    pub labels: BTreeMap<String, String>,
    pub uri: Option<String>,
    pub urls: Vec<String>,
    pub ingress: Option<String>,
    pub creator: Option<String>,
    pub last_modifier: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub latest_ready_revision: Option<String>,
    pub latest_created_revision: Option<String>,
    pub containers: Vec<Container>,
    pub service_account: Option<String>,
    pub scaling: Scaling,
    pub traffic: Vec<TrafficStatus>,
    pub terminal_condition: Option<Condition>,
    pub conditions: Vec<Condition>,
    pub reconciling: bool,
}

impl Service {
    pub fn from_wire(wire: &WireService, region: &str) -> Self {
        let template = wire.template.as_ref();

        // Service-level scaling wins; older services only set it on the
        // revision template.
        let scaling = match (&wire.scaling, template.and_then(|t| t.scaling.as_ref())) {
            (Some(service), _) => Scaling::from_service(service),
            (None, Some(revision)) => Scaling::from_revision(revision),
            (None, None) => Scaling::from_service(&Default::default()),
        };

        Self {
            name: wire.name.clone(),
            short_name: short_name(&wire.name).to_string(),
            region: region.to_string(),
            uid: wire.uid.clone(),
            description: non_empty(&wire.description),
            generation: wire.generation,
            labels: wire.labels.clone().into_iter().collect(),
            uri: non_empty(&wire.uri),
            urls: wire.urls.clone(),
            ingress: non_empty(&wire.ingress),
            creator: non_empty(&wire.creator),
            last_modifier: non_empty(&wire.last_modifier),
            create_time: parse_timestamp(wire.create_time.as_deref()),
            update_time: parse_timestamp(wire.update_time.as_deref()),
            latest_ready_revision: non_empty(short_name(&wire.latest_ready_revision)),
            latest_created_revision: non_empty(short_name(&wire.latest_created_revision)),
            containers: template
                .map(|t| map_containers(&t.containers))
                .unwrap_or_default(),
            service_account: template.and_then(|t| non_empty(&t.service_account)),
            scaling,
            traffic: wire.traffic_statuses.iter().map(TrafficStatus::from_wire).collect(),
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

    pub fn image(&self) -> Option<&str> {
        self.containers.first().map(|c| c.image.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{WireCondition, WireRevisionScaling, WireRevisionTemplate};
    use crate::core::models::common::ScalingMode;

    fn wire() -> WireService {
        serde_json::from_str(
            r#"{
                "name": "projects/p/locations/europe-west1/services/api",
                "uid": "u-1",
                "generation": "4",
                "uri": "https://api-xyz.a.run.app",
                "createTime": "2024-01-02T03:04:05Z",
                "updateTime": "not a time",
                "latestReadyRevision": "projects/p/locations/europe-west1/services/api/revisions/api-00004-abc",
                "template": {
                    "containers": [{"image": "gcr.io/p/api:4"}],
                    "scaling": {"minInstanceCount": 1, "maxInstanceCount": 5}
                },
                "trafficStatuses": [{"type": "TRAFFIC_TARGET_ALLOCATION_TYPE_LATEST", "percent": 100}],
                "terminalCondition": {"type": "Ready", "state": "CONDITION_SUCCEEDED"},
                "extraField": {"ignored": true}
            }"#,
        )
        .expect("wire service")
    }

    #[test]
    fn test_from_wire() {
        let service = Service::from_wire(&wire(), "europe-west1");

        assert_eq!(service.short_name, "api");
        assert_eq!(service.region, "europe-west1");
        assert_eq!(service.generation, 4);
        assert!(service.create_time.is_some());
        assert!(service.update_time.is_none());
        assert_eq!(service.latest_ready_revision.as_deref(), Some("api-00004-abc"));
        assert_eq!(service.image(), Some("gcr.io/p/api:4"));
        assert_eq!(service.scaling.summary(), "auto: 1-5");
        assert!(service.traffic[0].is_latest());
        assert_eq!(service.status(), "Ready");
        assert!(service.conditions.is_empty());
    }

    #[test]
    fn test_region_is_stamped_from_caller() {
        let service = Service::from_wire(&WireService::default(), "asia-east1");
        assert_eq!(service.region, "asia-east1");
        assert_eq!(service.status(), "Unknown");
        assert!(service.containers.is_empty());
    }

    #[test]
    fn test_service_scaling_wins_over_template() {
        let mut wire = wire();
        wire.scaling = Some(crate::api::models::WireServiceScaling {
            scaling_mode: Some("MANUAL".to_string()),
            manual_instance_count: Some(2),
            ..Default::default()
        });
        wire.template = Some(WireRevisionTemplate {
            scaling: Some(WireRevisionScaling {
                min_instance_count: Some(9),
                max_instance_count: None,
            }),
            ..Default::default()
        });
        let service = Service::from_wire(&wire, "r");
        assert_eq!(service.scaling.mode, ScalingMode::Manual);
        assert_eq!(service.scaling.manual_instances, Some(2));
    }

    #[test]
    fn test_terminal_condition_maps_directly() {
        let mut wire = wire();
        wire.terminal_condition = Some(WireCondition {
            condition_type: "Ready".to_string(),
            state: "CONDITION_FAILED".to_string(),
            message: "container failed to start".to_string(),
            ..Default::default()
        });
        let service = Service::from_wire(&wire, "r");
        let condition = service.terminal_condition.expect("terminal condition");
        assert!(condition.is_failed());
        assert_eq!(condition.message.as_deref(), Some("container failed to start"));
    }
}
