//! Read-only view of the active gcloud CLI configuration.

use crate::api::region::DEFAULT_REGION;
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CLOUDSDK_CONFIG_ENV: &str = "CLOUDSDK_CONFIG";
const DEFAULT_CONFIGURATION: &str = "default";

/// Account, project and region from the active gcloud configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcloudInfo {
    pub configuration: String,
    pub account: Option<String>,
    pub project: Option<String>,
    /// `[run] region`, or the default region when unset.
    pub region: String,
    /// Whether `region` came from the gcloud configuration.
    pub region_configured: bool,
}

impl GcloudInfo {
    /// Load from `$CLOUDSDK_CONFIG` or `~/.config/gcloud`. A missing
    /// directory or file yields an empty configuration.
    pub fn load() -> Self {
        match Self::config_dir() {
            Some(dir) => Self::load_from(&dir),
            None => Self::from_properties(DEFAULT_CONFIGURATION, &HashMap::new()),
        }
    }

    pub fn config_dir() -> Option<PathBuf> {
        if let Ok(dir) = env::var(CLOUDSDK_CONFIG_ENV) {
            if !dir.trim().is_empty() {
                return Some(PathBuf::from(dir));
            }
        }
        dirs::home_dir().map(|home| home.join(".config").join("gcloud"))
    }

    pub fn load_from(dir: &Path) -> Self {
        let name = fs::read_to_string(dir.join("active_config"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string());

        let path = dir.join("configurations").join(format!("config_{}", name));
        let properties = match fs::read_to_string(&path) {
            Ok(content) => parse_properties(&content),
            Err(e) => {
                log::debug!("No gcloud configuration at {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        Self::from_properties(&name, &properties)
    }

    fn from_properties(name: &str, properties: &HashMap<String, String>) -> Self {
        let get = |key: &str| properties.get(key).filter(|v| !v.is_empty()).cloned();
        let region = get("run/region");
        Self {
            configuration: name.to_string(),
            account: get("core/account"),
            project: get("core/project"),
            region_configured: region.is_some(),
            region: region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }
}

/// Parse gcloud's INI format into `section/key` entries.
fn parse_properties(content: &str) -> HashMap<String, String> {
    let mut properties = HashMap::new();
    let mut section = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = name.trim().to_string();
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            properties.insert(
                format!("{}/{}", section, key.trim()),
                value.trim().to_string(),
            );
        }
    }

    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CONFIG: &str = "[core]\naccount = dev@example.com\nproject = my-project\n\n[run]\nregion = europe-west1\n";

    fn write_config(dir: &Path, name: &str, content: &str) {
        let configs = dir.join("configurations");
        fs::create_dir_all(&configs).expect("create dir");
        fs::write(configs.join(format!("config_{}", name)), content).expect("write config");
    }

    #[test]
    fn test_parse_properties() {
        let props = parse_properties("; comment\n[core]\nproject=p1\n[compute]\nzone = z\n");
        assert_eq!(props.get("core/project").map(String::as_str), Some("p1"));
        assert_eq!(props.get("compute/zone").map(String::as_str), Some("z"));
    }

    #[test]
    fn test_load_active_configuration() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("active_config"), "work\n").expect("write");
        write_config(temp.path(), "work", CONFIG);

        let info = GcloudInfo::load_from(temp.path());
        assert_eq!(info.configuration, "work");
        assert_eq!(info.account.as_deref(), Some("dev@example.com"));
        assert_eq!(info.project.as_deref(), Some("my-project"));
        assert_eq!(info.region, "europe-west1");
        assert!(info.region_configured);
    }

    #[test]
    fn test_missing_active_config_uses_default() {
        let temp = tempdir().expect("tempdir");
        write_config(temp.path(), "default", "[core]\nproject = fallback\n");

        let info = GcloudInfo::load_from(temp.path());
        assert_eq!(info.configuration, "default");
        assert_eq!(info.project.as_deref(), Some("fallback"));
        assert_eq!(info.region, DEFAULT_REGION);
        assert!(!info.region_configured);
    }

    #[test]
    fn test_empty_directory() {
        let temp = tempdir().expect("tempdir");
        let info = GcloudInfo::load_from(temp.path());
        assert_eq!(info.account, None);
        assert_eq!(info.project, None);
    }
}
