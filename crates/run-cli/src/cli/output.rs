use run_core::display::{OutputFormat, ProgressSpinner, TableDisplay, TableRow};
use run_core::error::AppError;
use serde::Serialize;

/// Writes command results to stdout in the selected format.
pub struct Output {
    format: OutputFormat,
    table: TableDisplay,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            table: TableDisplay::new(),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn list<T: TableRow + Serialize>(&self, items: &[T], empty_message: &str) -> Result<(), AppError> {
        if self.format.is_structured() {
            self.structured(&items)
        } else {
            println!("{}", self.table.render(items, empty_message));
            Ok(())
        }
    }

    /// `fields` is the table view; structured formats serialize `item`.
    pub fn details<T: Serialize>(&self, item: &T, fields: &[(&str, String)]) -> Result<(), AppError> {
        if self.format.is_structured() {
            self.structured(item)
        } else {
            println!("{}", self.table.render_details(fields));
            Ok(())
        }
    }

    /// Plain message in table mode; nothing in structured mode.
    pub fn message(&self, text: &str) {
        if !self.format.is_structured() {
            println!("{}", text);
        }
    }

    /// Started spinner; silent for JSON and YAML.
    pub fn spinner(&self, message: &str) -> ProgressSpinner {
        let mut spinner = ProgressSpinner::new(message);
        if self.format.is_structured() {
            spinner = spinner.disabled();
        }
        spinner.start();
        spinner
    }

    fn structured<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), AppError> {
        let rendered = self.format.serialize(value)?;
        println!("{}", rendered.trim_end());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_output_disables_spinner() {
        for format in [OutputFormat::Json, OutputFormat::Yaml] {
            let spinner = Output::new(format).spinner("Listing services");
            assert!(!spinner.is_enabled(), "{} spinner should be off", format);
        }
    }
}
