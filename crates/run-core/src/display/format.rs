use crate::error::{DisplayError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn is_structured(&self) -> bool {
        !matches!(self, OutputFormat::Table)
    }

    /// Serialize `value` as JSON (pretty) or YAML. Tables are rendered by
    /// [`TableDisplay`](super::table::TableDisplay) instead.
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, DisplayError> {
        match self {
            OutputFormat::Json | OutputFormat::Table => {
                serde_json::to_string_pretty(value).map_err(|e| DisplayError::Serialize {
                    format: "json".to_string(),
                    message: e.to_string(),
                })
            }
            OutputFormat::Yaml => serde_yaml::to_string(value).map_err(|e| DisplayError::Serialize {
                format: "yaml".to_string(),
                message: e.to_string(),
            }),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(ValidationError::InvalidFormat {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Item {
        short_name: String,
        task_count: i32,
    }

    fn items() -> Vec<Item> {
        vec![Item {
            short_name: "api".to_string(),
            task_count: 2,
        }]
    }

    #[test]
    fn test_parse() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("yml".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_json_output() {
        let out = OutputFormat::Json.serialize(&items()).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(parsed[0]["shortName"], "api");
        assert_eq!(parsed[0]["taskCount"], 2);
    }

    #[test]
    fn test_yaml_output() {
        let out = OutputFormat::Yaml.serialize(&items()).expect("yaml");
        assert!(out.contains("shortName: api"));
        assert!(out.contains("taskCount: 2"));
    }
}
