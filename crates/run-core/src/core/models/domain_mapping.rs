use super::common::{Condition, ResourceRecord, non_empty, parse_timestamp};
use crate::api::models::WireDomainMapping;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainMapping {
    /// The mapped domain.
    pub name: String,
    pub region: String,
    pub route_name: Option<String>,
    pub certificate_mode: Option<String>,
    pub url: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub records: Vec<ResourceRecord>,
    pub ready_condition: Option<Condition>,
    pub conditions: Vec<Condition>,
}

impl DomainMapping {
    pub fn from_wire(wire: &WireDomainMapping, region: &str) -> Self {
        let metadata = wire.metadata.as_ref();
        let spec = wire.spec.as_ref();
        let status = wire.status.as_ref();

        let conditions: Vec<Condition> = status
            .map(|s| s.conditions.iter().map(Condition::from_v1).collect())
            .unwrap_or_default();
        let ready_condition = conditions
            .iter()
            .find(|c| c.condition_type == "Ready")
            .cloned();

        Self {
            name: metadata.map(|m| m.name.clone()).unwrap_or_default(),
            region: region.to_string(),
            route_name: spec.and_then(|s| non_empty(&s.route_name)),
            certificate_mode: spec.and_then(|s| non_empty(&s.certificate_mode)),
            url: status.and_then(|s| non_empty(&s.url)),
            create_time: metadata.and_then(|m| parse_timestamp(m.creation_timestamp.as_deref())),
            records: status
                .map(|s| s.resource_records.iter().map(ResourceRecord::from_wire).collect())
                .unwrap_or_default(),
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
        let wire: WireDomainMapping = serde_json::from_str(
            r#"{
                "metadata": {"name": "www.example.com", "creationTimestamp": "2023-11-05T12:00:00Z"},
                "spec": {"routeName": "frontend", "certificateMode": "AUTOMATIC"},
                "status": {
                    "conditions": [{"type": "Ready", "status": "True"}],
                    "url": "https://www.example.com",
                    "resourceRecords": [{"name": "www", "type": "CNAME", "rrdata": "ghs.googlehosted.com."}]
                }
            }"#,
        )
        .expect("wire domain mapping");

        let mapping = DomainMapping::from_wire(&wire, "europe-west1");
        assert_eq!(mapping.name, "www.example.com");
        assert_eq!(mapping.route_name.as_deref(), Some("frontend"));
        assert_eq!(mapping.records.len(), 1);
        assert_eq!(mapping.records[0].record_type, "CNAME");
        assert_eq!(mapping.status(), "Ready");
        assert!(mapping.create_time.is_some());
    }

    #[test]
    fn test_empty_mapping() {
        let mapping = DomainMapping::from_wire(&WireDomainMapping::default(), "r");
        assert_eq!(mapping.name, "");
        assert!(mapping.records.is_empty());
        assert!(mapping.conditions.is_empty());
    }
}
