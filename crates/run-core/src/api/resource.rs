//! Resource identities and their fully-qualified paths.

use crate::error::ValidationError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Service,
    Revision,
    Job,
    Execution,
    WorkerPool,
    DomainMapping,
    Project,
}

impl ResourceKind {
    /// Path segment of the collection holding this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Service => "services",
            ResourceKind::Revision => "revisions",
            ResourceKind::Job => "jobs",
            ResourceKind::Execution => "executions",
            ResourceKind::WorkerPool => "workerPools",
            ResourceKind::DomainMapping => "domainmappings",
            ResourceKind::Project => "projects",
        }
    }

    /// Kind that owns this one in the resource hierarchy, if any.
    pub fn parent_kind(&self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Revision => Some(ResourceKind::Service),
            ResourceKind::Execution => Some(ResourceKind::Job),
            _ => None,
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            ResourceKind::Service => "service",
            ResourceKind::Revision => "revision",
            ResourceKind::Job => "job",
            ResourceKind::Execution => "execution",
            ResourceKind::WorkerPool => "worker pool",
            ResourceKind::DomainMapping => "domain mapping",
            ResourceKind::Project => "project",
        }
    }

    fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Service => "services",
            ResourceKind::Revision => "revisions",
            ResourceKind::Job => "jobs",
            ResourceKind::Execution => "executions",
            ResourceKind::WorkerPool => "worker pools",
            ResourceKind::DomainMapping => "domain mappings",
            ResourceKind::Project => "projects",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// Identifies one remote resource by project, region, kind and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    project: String,
    region: String,
    kind: ResourceKind,
    parent: Option<String>,
    short_name: String,
}

impl ResourceRef {
    pub fn new(
        project: impl Into<String>,
        region: impl Into<String>,
        kind: ResourceKind,
        short_name: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            region: region.into(),
            kind,
            parent: None,
            short_name: short_name.into(),
        }
    }

    /// A resource nested under a parent, e.g. a revision of a service.
    pub fn nested(
        project: impl Into<String>,
        region: impl Into<String>,
        kind: ResourceKind,
        parent: impl Into<String>,
        short_name: impl Into<String>,
    ) -> Self {
        let mut reference = Self::new(project, region, kind, short_name);
        reference.parent = Some(parent.into());
        reference
    }

    /// Parse `projects/{p}/locations/{r}/{collection}/{name}`, optionally
    /// with one level of nesting.
    pub fn parse(path: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidResourceName {
            name: path.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        if parts.len() < 6 || parts[0] != "projects" || parts[2] != "locations" {
            return Err(invalid(
                "expected projects/{project}/locations/{region}/{collection}/{name}",
            ));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("empty path segment"));
        }

        let project = parts[1];
        let region = parts[3];
        match parts.len() {
            6 => {
                let kind = kind_for_collection(parts[4]).ok_or_else(|| invalid("unknown collection"))?;
                Ok(Self::new(project, region, kind, parts[5]))
            }
            8 => {
                let parent_kind =
                    kind_for_collection(parts[4]).ok_or_else(|| invalid("unknown collection"))?;
                let kind = kind_for_collection(parts[6]).ok_or_else(|| invalid("unknown collection"))?;
                if kind.parent_kind() != Some(parent_kind) {
                    return Err(invalid("collection cannot be nested here"));
                }
                Ok(Self::nested(project, region, kind, parts[5], parts[7]))
            }
            _ => Err(invalid("unexpected number of path segments")),
        }
    }

    /// Accept either a fully-qualified path or a short name resolved
    /// against `project` and `region`.
    pub fn resolve(
        name: &str,
        project: &str,
        region: &str,
        kind: ResourceKind,
    ) -> Result<Self, ValidationError> {
        if name.starts_with("projects/") {
            let reference = Self::parse(name)?;
            if reference.kind != kind {
                return Err(ValidationError::InvalidResourceName {
                    name: name.to_string(),
                    reason: format!("expected a path to {}", kind),
                });
            }
            return Ok(reference);
        }
        if name.is_empty() || name.contains('/') {
            return Err(ValidationError::InvalidResourceName {
                name: name.to_string(),
                reason: "expected a short name or a full resource path".to_string(),
            });
        }
        Ok(Self::new(project, region, kind, name))
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Kind and short name, for messages: `service 'api'`.
    pub fn describe(&self) -> String {
        format!("{} '{}'", self.kind.singular(), self.short_name)
    }

    /// `projects/{p}/locations/{r}`
    pub fn location(&self) -> String {
        location_path(&self.project, &self.region)
    }

    /// Path of the collection this resource lives in.
    pub fn parent(&self) -> String {
        match (&self.parent, self.kind.parent_kind()) {
            (Some(parent), Some(parent_kind)) => format!(
                "{}/{}/{}/{}",
                self.location(),
                parent_kind.collection(),
                parent,
                self.kind.collection()
            ),
            _ => format!("{}/{}", self.location(), self.kind.collection()),
        }
    }

    /// Fully-qualified resource name.
    pub fn name(&self) -> String {
        format!("{}/{}", self.parent(), self.short_name)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

pub fn location_path(project: &str, region: &str) -> String {
    format!("projects/{}/locations/{}", project, region)
}

/// Last segment of a resource path; the input itself when it has none.
pub fn short_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn kind_for_collection(segment: &str) -> Option<ResourceKind> {
    match segment {
        "services" => Some(ResourceKind::Service),
        "revisions" => Some(ResourceKind::Revision),
        "jobs" => Some(ResourceKind::Job),
        "executions" => Some(ResourceKind::Execution),
        "workerPools" => Some(ResourceKind::WorkerPool),
        "domainmappings" => Some(ResourceKind::DomainMapping),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_fully_qualified() {
        let r = ResourceRef::new("p", "us-central1", ResourceKind::Service, "api");
        assert_eq!(r.name(), "projects/p/locations/us-central1/services/api");
        assert_eq!(r.parent(), "projects/p/locations/us-central1/services");
    }

    #[test]
    fn test_nested_name() {
        let r = ResourceRef::nested(
            "p",
            "europe-west1",
            ResourceKind::Execution,
            "nightly",
            "nightly-abc12",
        );
        assert_eq!(
            r.name(),
            "projects/p/locations/europe-west1/jobs/nightly/executions/nightly-abc12"
        );
    }

    #[test]
    fn test_parse_round_trips_worker_pool_path() {
        let path = "projects/p/locations/us-east1/workerPools/pool";
        let r = ResourceRef::parse(path).expect("valid path");
        assert_eq!(r.kind(), ResourceKind::WorkerPool);
        assert_eq!(r.region(), "us-east1");
        assert_eq!(r.short_name(), "pool");
        assert_eq!(r.name(), path);
    }

    #[test]
    fn test_parse_rejects_bad_paths() {
        assert!(ResourceRef::parse("services/api").is_err());
        assert!(ResourceRef::parse("projects/p/locations/r/widgets/w").is_err());
        assert!(ResourceRef::parse("projects/p/locations/r/services/s/executions/e").is_err());
        assert!(ResourceRef::parse("projects//locations/r/services/s").is_err());
    }

    #[test]
    fn test_resolve_short_and_full_names() {
        let short = ResourceRef::resolve("api", "p", "asia-east1", ResourceKind::Service)
            .expect("short name");
        assert_eq!(short.name(), "projects/p/locations/asia-east1/services/api");

        let full = ResourceRef::resolve(
            "projects/other/locations/us-west1/services/api",
            "p",
            "asia-east1",
            ResourceKind::Service,
        )
        .expect("full path");
        assert_eq!(full.project(), "other");
        assert_eq!(full.region(), "us-west1");

        assert!(
            ResourceRef::resolve(
                "projects/p/locations/r/jobs/j",
                "p",
                "r",
                ResourceKind::Service
            )
            .is_err()
        );
    }

    #[test]
    fn test_kind_display_used_in_error_context() {
        assert_eq!(ResourceKind::WorkerPool.to_string(), "worker pools");
        assert_eq!(ResourceKind::DomainMapping.to_string(), "domain mappings");
        let r = ResourceRef::new("p", "r", ResourceKind::WorkerPool, "pool");
        assert_eq!(r.describe(), "worker pool 'pool'");
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("projects/p/locations/r/services/api"), "api");
        assert_eq!(short_name("api"), "api");
    }
}
