//! Sorts remote failures into authentication problems and everything else.

use crate::error::{ApiError, ClassifiedError};

/// Google status names that mean the caller is not (sufficiently)
/// authenticated.
const AUTH_STATUSES: &[&str] = &["UNAUTHENTICATED", "PERMISSION_DENIED"];

/// Text markers used when nothing structured is available.
const AUTH_MARKERS: &[&str] = &["Unauthenticated", "PermissionDenied"];

/// Classify a remote failure.
///
/// Structured signals are checked first: an [`ApiError::Unauthorized`]
/// (HTTP 401/403) or a Google status name of `UNAUTHENTICATED` /
/// `PERMISSION_DENIED`. As a last resort the error text is searched,
/// case-sensitively, for `Unauthenticated` or `PermissionDenied`.
/// Anything else comes back as [`ClassifiedError::Other`] holding the
/// input unchanged.
pub fn classify(err: ApiError) -> ClassifiedError {
    if is_auth_failure(&err) {
        log::debug!("Classified as authentication failure: {}", err);
        ClassifiedError::Auth { source: err }
    } else {
        ClassifiedError::Other(err)
    }
}

fn is_auth_failure(err: &ApiError) -> bool {
    match err {
        ApiError::Unauthorized { .. } => true,
        ApiError::Operation { code, .. } if *code == 7 || *code == 16 => true,
        _ => {
            let text = err.to_string();
            AUTH_STATUSES.iter().any(|s| text.contains(s))
                || AUTH_MARKERS.iter().any(|m| text.contains(m))
        }
    }
}
