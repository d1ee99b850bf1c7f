use super::common::{
    Condition, Container, Scaling, map_conditions, map_containers, non_empty, parse_timestamp,
};
use crate::api::models::WireRevision;
use crate::api::resource::short_name;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub name: String,
    pub short_name: String,
    pub service: String,
    pub region: String,
    pub generation: i64,
    pub create_time: Option<DateTime<Utc>>,
    pub containers: Vec<Container>,
    pub scaling: Option<Scaling>,
    pub concurrency: Option<i32>,
    pub service_account: Option<String>,
    pub timeout: Option<String>,
    pub log_uri: Option<String>,
    pub ready_condition: Option<Condition>,
    pub conditions: Vec<Condition>,
}

impl Revision {
    pub fn from_wire(wire: &WireRevision, region: &str) -> Self {
        let conditions = map_conditions(&wire.conditions);
        let ready_condition = conditions
            .iter()
            .find(|c| c.condition_type == "Ready")
            .cloned();

        Self {
            name: wire.name.clone(),
            short_name: short_name(&wire.name).to_string(),
            service: short_name(&wire.service).to_string(),
            region: region.to_string(),
            generation: wire.generation,
            create_time: parse_timestamp(wire.create_time.as_deref()),
            containers: map_containers(&wire.containers),
            scaling: wire.scaling.as_ref().map(Scaling::from_revision),
            concurrency: wire.max_instance_request_concurrency,
            service_account: non_empty(&wire.service_account),
            timeout: non_empty(&wire.timeout),
            log_uri: non_empty(&wire.log_uri),
            ready_condition,
            conditions,
        }
    }

    pub fn status(&self) -> &'static str {
        self.ready_condition
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
        let wire: WireRevision = serde_json::from_str(
            r#"{
                "name": "projects/p/locations/r/services/api/revisions/api-00002-xyz",
                "service": "projects/p/locations/r/services/api",
                "containers": [{"image": "img:2"}],
                "maxInstanceRequestConcurrency": 80,
                "conditions": [
                    {"type": "ResourcesAvailable", "state": "CONDITION_SUCCEEDED"},
                    {"type": "Ready", "state": "CONDITION_SUCCEEDED"}
                ]
            }"#,
        )
        .expect("wire revision");

        let revision = Revision::from_wire(&wire, "r");
        assert_eq!(revision.short_name, "api-00002-xyz");
        assert_eq!(revision.service, "api");
        assert_eq!(revision.concurrency, Some(80));
        assert_eq!(revision.status(), "Ready");
        assert_eq!(revision.conditions.len(), 2);
        assert!(revision.scaling.is_none());
    }
}
