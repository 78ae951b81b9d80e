//! buildgate API library
//!
//! Authorization-gated command layer:
//! - SQLite storage for repositories, grants, builds, jobs, branches, crons
//! - Token authentication into an [`auth::Actor`]
//! - Resource lookup that hides what the actor may not see
//! - State-gated commands handing work to a queue [`dispatch::Dispatcher`]
//! - axum routes under `/v3`

pub mod auth;
pub mod commands;
pub mod dispatch;
pub mod features;
pub mod http;
pub mod locator;
pub mod storage;
