//! Cloud Console links for regional resources.

use crate::api::resource::{ResourceKind, ResourceRef};
use crate::error::ValidationError;

pub const CONSOLE_BASE_URL: &str = "https://console.cloud.google.com";

/// Console page of a service, job or worker pool.
pub fn console_url(reference: &ResourceRef) -> Result<String, ValidationError> {
    let page = match reference.kind() {
        ResourceKind::Service => "run/detail",
        ResourceKind::Job => "run/jobs/details",
        ResourceKind::WorkerPool => "run/worker-pools/details",
        other => {
            return Err(ValidationError::InvalidResourceName {
                name: reference.short_name().to_string(),
                reason: format!("{} have no console page", other),
            });
        }
    };

    Ok(format!(
        "{}/{}/{}/{}?project={}",
        CONSOLE_BASE_URL,
        page,
        reference.region(),
        reference.short_name(),
        reference.project()
    ))
}
