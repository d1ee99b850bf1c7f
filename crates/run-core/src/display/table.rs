use crate::core::models::{
    DomainMapping, Execution, Job, Project, Revision, Service, WorkerPool,
};
use chrono::{DateTime, Utc};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets};
use crossterm::terminal;

const MIN_WIDTH: u16 = 40;
const MAX_WIDTH: u16 = 200;
const DEFAULT_WIDTH: u16 = 80;

/// An entity that renders as one table row.
pub trait TableRow {
    fn headers() -> Vec<&'static str>;

    fn row(&self) -> Vec<String>;
}

/// Renders entity lists and key/value detail views with comfy-table.
#[derive(Debug, Clone)]
pub struct TableDisplay {
    max_width: u16,
    use_colors: bool,
}

impl Default for TableDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TableDisplay {
    pub fn new() -> Self {
        Self {
            max_width: Self::detect_terminal_width(),
            use_colors: true,
        }
    }

    fn detect_terminal_width() -> u16 {
        match terminal::size() {
            Ok((cols, _rows)) => cols.clamp(MIN_WIDTH, MAX_WIDTH),
            Err(_) => DEFAULT_WIDTH,
        }
    }

    pub fn with_max_width(mut self, width: u16) -> Self {
        self.max_width = width;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_width(self.max_width);
        if !self.use_colors {
            table.force_no_tty();
        }
        table
    }

    fn header_cell(&self, title: &str) -> Cell {
        let cell = Cell::new(title).add_attribute(Attribute::Bold);
        if self.use_colors {
            cell.fg(Color::Cyan)
        } else {
            cell
        }
    }

    /// One row per item. An empty list renders as `empty_message`.
    pub fn render<T: TableRow>(&self, items: &[T], empty_message: &str) -> String {
        if items.is_empty() {
            return empty_message.to_string();
        }

        let mut table = self.new_table();
        table.set_header(T::headers().into_iter().map(|h| self.header_cell(h)));
        for item in items {
            table.add_row(item.row());
        }
        table.to_string()
    }

    /// Two-column field/value view used by `describe`.
    pub fn render_details(&self, fields: &[(&str, String)]) -> String {
        let mut table = self.new_table();
        table.set_header(vec![self.header_cell("Field"), self.header_cell("Value")]);
        for (field, value) in fields {
            table.add_row(vec![Cell::new(field), Cell::new(value)]);
        }
        table.to_string()
    }
}

pub fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

impl TableRow for Service {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Region", "Status", "URL", "Scaling", "Last Deployed"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.short_name.clone(),
            self.region.clone(),
            self.status().to_string(),
            or_dash(self.uri.as_deref()),
            self.scaling.summary(),
            format_time(self.update_time),
        ]
    }
}

impl TableRow for Revision {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Service", "Region", "Status", "Image", "Created"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.short_name.clone(),
            self.service.clone(),
            self.region.clone(),
            self.status().to_string(),
            or_dash(self.containers.first().map(|c| c.image.as_str())),
            format_time(self.create_time),
        ]
    }
}

impl TableRow for Job {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Region", "Status", "Executions", "Last Execution", "Last Run"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.short_name.clone(),
            self.region.clone(),
            self.status().to_string(),
            self.execution_count.to_string(),
            or_dash(self.latest_execution.as_deref()),
            format_time(self.latest_execution_time),
        ]
    }
}

impl TableRow for Execution {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Job", "Region", "Status", "Tasks", "Started", "Completed"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.short_name.clone(),
            self.job.clone(),
            self.region.clone(),
            self.status().to_string(),
            self.progress(),
            format_time(self.start_time),
            format_time(self.completion_time),
        ]
    }
}

impl TableRow for WorkerPool {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Region", "Status", "Instances", "Updated"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.short_name.clone(),
            self.region.clone(),
            self.status().to_string(),
            self.instance_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format_time(self.update_time),
        ]
    }
}

impl TableRow for DomainMapping {
    fn headers() -> Vec<&'static str> {
        vec!["Domain", "Service", "Region", "Status", "Records"]
    }

    fn row(&self) -> Vec<String> {
        let records = self
            .records
            .iter()
            .map(|r| format!("{} {}", r.record_type, r.rrdata))
            .collect::<Vec<_>>()
            .join("\n");
        vec![
            self.name.clone(),
            or_dash(self.route_name.as_deref()),
            self.region.clone(),
            self.status().to_string(),
            if records.is_empty() { "-".to_string() } else { records },
        ]
    }
}

impl TableRow for Project {
    fn headers() -> Vec<&'static str> {
        vec!["Project ID", "Name", "Number", "State"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.project_id.clone(),
            or_dash(self.display_name.as_deref()),
            self.number.to_string(),
            self.state.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{WireExecution, WireService};

    fn display() -> TableDisplay {
        TableDisplay::new().with_max_width(120).with_colors(false)
    }

    #[test]
    fn test_empty_list_message() {
        let services: Vec<Service> = Vec::new();
        assert_eq!(display().render(&services, "No services found"), "No services found");
    }

    #[test]
    fn test_service_table_contains_row() {
        let wire: WireService = serde_json::from_str(
            r#"{"name": "projects/p/locations/us-east1/services/frontend", "uri": "https://frontend.run.app"}"#,
        )
        .expect("wire");
        let service = Service::from_wire(&wire, "us-east1");

        let rendered = display().render(&[service], "");
        assert!(rendered.contains("frontend"));
        assert!(rendered.contains("us-east1"));
        assert!(rendered.contains("Last Deployed"));
    }

    #[test]
    fn test_execution_row() {
        let wire = WireExecution {
            name: "projects/p/locations/r/jobs/j/executions/j-abc".to_string(),
            job: "projects/p/locations/r/jobs/j".to_string(),
            task_count: 3,
            succeeded_count: 1,
            ..Default::default()
        };
        let row = Execution::from_wire(&wire, "r").row();
        assert_eq!(row[0], "j-abc");
        assert_eq!(row[1], "j");
        assert_eq!(row[4], "1/3");
        assert_eq!(row[5], "-");
    }

    #[test]
    fn test_details() {
        let rendered = display().render_details(&[("Name", "api".to_string())]);
        assert!(rendered.contains("Field"));
        assert!(rendered.contains("api"));
    }
}
