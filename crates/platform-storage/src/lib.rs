//! Postgres persistence for the deployment platform's own resources
//! (projects, deployments).
//!
//! Deliberately thin (spec §1: out of scope): the rate limiter's own
//! state lives entirely in `ratelimit_core::store` and never touches
//! this crate. This exists so the admission middleware has real
//! endpoints to sit in front of.

pub mod error;
pub mod models;
pub mod relational;

pub use error::{StorageError, StorageResult};
pub use models::{Deployment, DeploymentStatus, NewDeployment, NewProject, PlanName, Project};
pub use relational::RelationalStore;
