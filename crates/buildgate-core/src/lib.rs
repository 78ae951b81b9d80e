//! buildgate core library
//!
//! Shared functionality for the buildgate command layer:
//! - Error taxonomy for rejected commands
//! - Resource kinds and lifecycle states
//! - Capability evaluation over repository ownership
//! - Configuration resolution and hierarchy
//! - Database and tracing helpers

pub mod config;
pub mod db;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod permissions;
pub mod resource;
pub mod tracing_init;

pub use config::Config;
pub use error::{CommandError, Error, Result};
pub use permissions::{
    AccessGrant, BuildPermissions, Capability, CronPermissions, FeatureFlags, JobPermissions,
    RepositoryAccess, RepositoryPermissions, ResourcePermissions,
};
pub use resource::{CronInterval, ResourceKind, State};
