//! Input validation for values typed by the user.
//!
//! Everything here runs before any request is sent.

use crate::error::ValidationError;

/// A validated scaling change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleRequest {
    /// Fixed number of instances.
    Manual { instances: u32 },
    /// Autoscale between `min` and `max`; no `max` means unbounded.
    Automatic { min: u32, max: Option<u32> },
}

/// Parse an instance count. Surrounding whitespace is ignored.
pub fn parse_instance_count(field: &str, value: &str) -> Result<u32, ValidationError> {
    let trimmed = value.trim();
    match trimmed.parse::<i64>() {
        Ok(n) if n < 0 => Err(ValidationError::Negative {
            field: field.to_string(),
            value: value.to_string(),
        }),
        Ok(n) => u32::try_from(n).map_err(|_| ValidationError::NotANumber {
            field: field.to_string(),
            value: value.to_string(),
        }),
        Err(_) => Err(ValidationError::NotANumber {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Build a [`ScaleRequest`] from raw flag values.
///
/// `manual` takes precedence. An empty or zero `max` means "no upper
/// bound"; otherwise `min` must not exceed it.
pub fn scale_request(
    manual: Option<&str>,
    min: Option<&str>,
    max: Option<&str>,
) -> Result<ScaleRequest, ValidationError> {
    if let Some(manual) = manual {
        let instances = parse_instance_count("manual instances", manual)?;
        return Ok(ScaleRequest::Manual { instances });
    }

    let Some(min) = min else {
        return Err(ValidationError::MissingScaling);
    };
    let min = parse_instance_count("min instances", min)?;

    let max = match max.map(str::trim) {
        None | Some("") => None,
        Some(raw) => match parse_instance_count("max instances", raw)? {
            0 => None,
            n => Some(n),
        },
    };

    if let Some(max) = max {
        if min > max {
            return Err(ValidationError::MinGreaterThanMax { min, max });
        }
    }

    Ok(ScaleRequest::Automatic { min, max })
}

/// Project IDs: 6 to 30 lowercase letters, digits or hyphens, starting
/// with a letter.
pub fn validate_project_id(project: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidResourceName {
        name: project.to_string(),
        reason: reason.to_string(),
    };

    if project.is_empty() {
        return Err(invalid("project ID cannot be empty"));
    }
    if !project.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(invalid("project ID must start with a lowercase letter"));
    }
    // Legacy domain-scoped IDs look like `example.com:project`.
    let id = project.rsplit(':').next().unwrap_or(project);
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            "project ID may only contain lowercase letters, digits and hyphens",
        ));
    }
    Ok(())
}
