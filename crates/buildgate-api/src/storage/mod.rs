//! SQLite storage for buildgate.
//!
//! Holds the records the command layer reads (users, repositories, grants,
//! builds, jobs, branches) and the ones it writes (crons, queue messages).

mod db;
mod models;
mod queries;
mod queries_cron;
mod queries_queue;

#[cfg(test)]
mod tests;

pub use buildgate_core::db::DatabaseError;
pub use db::Database;
pub use models::*;
pub use queries_cron::NewCron;
