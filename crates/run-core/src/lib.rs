//! # run-core
//!
//! Core library for the Cloud Run control plane.
//!
//! This crate provides everything `run-cli` needs apart from argument
//! parsing: the HTTP transport, the list/fan-out/classify/map combinators
//! shared by every resource kind, domain models, configuration and output
//! formatting.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use run_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> run_core::Result<()> {
//!     let client = RunClient::new(default_provider())?;
//!     let resources = ResourceService::new(client);
//!
//!     // Every service in every known region
//!     let services = resources
//!         .list_services("my-project", &RegionSelector::AllRegions)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │           API Layer                 │  HTTP client, wire models, pagination,
//! │                                     │  region fan-out, error classification
//! ├─────────────────────────────────────┤
//! │          Core Layer                 │  Domain models, services, console links
//! ├─────────────────────────────────────┤
//! │        Storage Layer                │  Config file, credentials, gcloud info
//! ├─────────────────────────────────────┤
//! │         Utils Layer                 │  Validation, retry policy
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`]: Cloud Run REST client and the combinator stack
//! - [`core`]: Domain models and the service layer
//! - [`storage`]: Configuration, access tokens and gcloud configuration
//! - [`utils`]: Input validation and retry
//! - [`display`]: Tables, JSON/YAML output and the progress spinner
//! - [`error`]: Hierarchical error system with troubleshooting hints

pub use error::AppError;

/// Commonly used types.
///
/// ```rust,ignore
/// use run_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::Result;
    pub use crate::error::AppError;

    pub use crate::api::client::{Endpoints, RunClient};
    pub use crate::api::fanout::{Fanout, RegionErrorPolicy, RegionSelector};
    pub use crate::api::resource::{ResourceKind, ResourceRef};

    pub use crate::core::models::{
        DomainMapping, Execution, Job, Project, Revision, Service, WorkerPool,
    };
    pub use crate::core::services::config_service::ConfigService;
    pub use crate::core::services::resource_service::ResourceService;
    pub use crate::core::services::settings::{Overrides, Settings};

    pub use crate::storage::config::Config;
    pub use crate::storage::credentials::{default_provider, provider_for};
    pub use crate::storage::gcloud::GcloudInfo;

    pub use crate::display::{OutputFormat, TableDisplay};
}

/// Wire transport and the shared combinators.
///
/// - [`api::client`]: authenticated reqwest client and per-kind calls
/// - [`api::pagination`]: page-token driven listing
/// - [`api::fanout`]: concurrent per-region listing
/// - [`api::classify`]: auth vs. other failure classification
/// - [`api::operation`]: long-running operation polling
pub mod api;

/// Domain models, services and console links.
pub mod core;

/// Configuration file, credential discovery and gcloud configuration.
pub mod storage;

/// Validation and retry helpers.
pub mod utils;

/// Output formatting for the terminal.
pub mod display;

/// Error hierarchy with severity levels and troubleshooting hints.
pub mod error;

/// `Result` with [`AppError`] as the error type.
pub type Result<T> = std::result::Result<T, AppError>;
