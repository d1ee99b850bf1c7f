use super::common::{Condition, map_conditions, non_empty, parse_timestamp};
use crate::api::models::WireExecution;
use crate::api::resource::short_name;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Condition type that carries an execution's overall outcome.
pub const COMPLETED_CONDITION: &str = "Completed";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub name: String,
    pub short_name: String,
    pub job: String,
    pub region: String,
    pub create_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub completion_time: Option<DateTime<Utc>>,
    pub task_count: i32,
    pub succeeded_count: i32,
    pub failed_count: i32,
    pub running_count: i32,
    pub cancelled_count: i32,
    pub retried_count: i32,
    pub log_uri: Option<String>,
    pub terminal_condition: Option<Condition>,
    pub conditions: Vec<Condition>,
}

impl Execution {
    /// Executions have no terminal condition on the wire; it is the first
    /// condition of type [`COMPLETED_CONDITION`].
    pub fn from_wire(wire: &WireExecution, region: &str) -> Self {
        let conditions = map_conditions(&wire.conditions);
        let terminal_condition = conditions
            .iter()
            .find(|c| c.condition_type == COMPLETED_CONDITION)
            .cloned();

        Self {
            name: wire.name.clone(),
            short_name: short_name(&wire.name).to_string(),
            job: short_name(&wire.job).to_string(),
            region: region.to_string(),
            create_time: parse_timestamp(wire.create_time.as_deref()),
            start_time: parse_timestamp(wire.start_time.as_deref()),
            completion_time: parse_timestamp(wire.completion_time.as_deref()),
            task_count: wire.task_count,
            succeeded_count: wire.succeeded_count,
            failed_count: wire.failed_count,
            running_count: wire.running_count,
            cancelled_count: wire.cancelled_count,
            retried_count: wire.retried_count,
            log_uri: non_empty(&wire.log_uri),
            terminal_condition,
            conditions,
        }
    }

    pub fn status(&self) -> &'static str {
        match &self.terminal_condition {
            Some(c) if c.is_succeeded() => "Succeeded",
            Some(c) if c.is_failed() => "Failed",
            _ if self.running_count > 0 => "Running",
            _ if self.cancelled_count > 0 => "Cancelled",
            _ => "Pending",
        }
    }

    /// `succeeded/total`
    pub fn progress(&self) -> String {
        format!("{}/{}", self.succeeded_count, self.task_count)
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.completion_time) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::WireCondition;

    fn condition(condition_type: &str, state: &str, message: &str) -> WireCondition {
        WireCondition {
            condition_type: condition_type.to_string(),
            state: state.to_string(),
            message: message.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_completed_condition_becomes_terminal() {
        let wire = WireExecution {
            name: "projects/p/locations/r/jobs/j/executions/j-1".to_string(),
            task_count: 3,
            succeeded_count: 3,
            conditions: vec![condition("Completed", "CONDITION_SUCCEEDED", "done")],
            ..Default::default()
        };

        let execution = Execution::from_wire(&wire, "r");
        let expected = Condition::from_wire(&wire.conditions[0]);
        assert_eq!(execution.terminal_condition, Some(expected));
        assert_eq!(execution.status(), "Succeeded");
        assert_eq!(execution.progress(), "3/3");
    }

    #[test]
    fn test_no_completed_condition() {
        let wire = WireExecution {
            task_count: 3,
            running_count: 1,
            conditions: vec![condition("ResourcesAvailable", "CONDITION_SUCCEEDED", "")],
            ..Default::default()
        };
        let execution = Execution::from_wire(&wire, "r");
        assert_eq!(execution.terminal_condition, None);
        assert_eq!(execution.status(), "Running");
    }

    #[test]
    fn test_first_completed_condition_wins() {
        let wire = WireExecution {
            conditions: vec![
                condition("Completed", "CONDITION_FAILED", "first"),
                condition("Completed", "CONDITION_SUCCEEDED", "second"),
            ],
            ..Default::default()
        };
        let execution = Execution::from_wire(&wire, "r");
        let terminal = execution.terminal_condition.as_ref().expect("terminal");
        assert_eq!(terminal.message.as_deref(), Some("first"));
        assert_eq!(execution.status(), "Failed");
    }

    #[test]
    fn test_duration() {
        let wire = WireExecution {
            start_time: Some("2024-01-01T00:00:00Z".to_string()),
            completion_time: Some("2024-01-01T00:01:30Z".to_string()),
            ..Default::default()
        };
        let execution = Execution::from_wire(&wire, "r");
        assert_eq!(execution.duration(), Some(chrono::Duration::seconds(90)));
    }
}
