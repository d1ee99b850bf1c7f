use super::common::{non_empty, parse_timestamp};
use crate::api::models::WireProject;
use crate::api::resource::short_name;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: String,
    /// Zero when the server name carries no number.
    pub number: u64,
    pub display_name: Option<String>,
    pub state: String,
    pub create_time: Option<DateTime<Utc>>,
}

impl Project {
    /// Projects are global, so there is no region to stamp.
    pub fn from_wire(wire: &WireProject) -> Self {
        Self {
            project_id: wire.project_id.clone(),
            number: short_name(&wire.name).parse().unwrap_or_default(),
            display_name: non_empty(&wire.display_name),
            state: wire.state.clone(),
            create_time: parse_timestamp(wire.create_time.as_deref()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == "ACTIVE"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_from_name() {
        let wire = WireProject {
            name: "projects/123456789".to_string(),
            project_id: "my-project".to_string(),
            state: "ACTIVE".to_string(),
            ..Default::default()
        };
        let project = Project::from_wire(&wire);
        assert_eq!(project.number, 123_456_789);
        assert_eq!(project.project_id, "my-project");
        assert!(project.is_active());
    }

    #[test]
    fn test_unparseable_number() {
        let wire = WireProject {
            name: "projects/abc".to_string(),
            ..Default::default()
        };
        assert_eq!(Project::from_wire(&wire).number, 0);
    }
}
