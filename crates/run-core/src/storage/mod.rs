//! Storage layer for run-cli
//!
//! Reads and writes the TOML configuration, finds access tokens and reads
//! the active gcloud configuration.

use crate::error::StorageError;

pub mod config;
pub mod credentials;
pub mod gcloud;

type Result<T> = std::result::Result<T, StorageError>;
