//! Domain entities, built from wire structures by pure `from_wire`
//! mappers. Every regional entity carries the region it was listed from.

pub mod common;
pub mod domain_mapping;
pub mod execution;
pub mod job;
pub mod project;
pub mod revision;
pub mod service;
pub mod worker_pool;

pub use common::{Condition, Container, ResourceRecord, Scaling, ScalingMode, TrafficStatus};
pub use domain_mapping::DomainMapping;
pub use execution::Execution;
pub use job::Job;
pub use project::Project;
pub use revision::Revision;
pub use service::Service;
pub use worker_pool::WorkerPool;
