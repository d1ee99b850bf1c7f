//! Shared helpers used across layers.

/// Retry policy for remote calls
pub mod retry;

/// Validation of user-supplied values
pub mod validation;
