//! Hand-off of accepted commands to the external worker queue.
//!
//! A [`Dispatcher`] accepts a message or fails; it never waits for the work
//! itself. Delivery downstream is at-least-once, so payloads carry only the
//! resolved resource id and the acting user, which makes duplicate
//! deliveries describe the same work.

mod recording;
mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use buildgate_core::CommandError;

pub use recording::RecordingDispatcher;
pub use sqlite::SqliteQueue;

/// Fixed `source` tag for commands arriving through the API.
pub const SOURCE_API: &str = "api";

/// Dispatch failures. Never retried by the command layer.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("queue transport unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode queue message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<DispatchError> for CommandError {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e.to_string())
    }
}

/// Worker kinds the command layer hands work to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Worker {
    BuildCancellation,
    BuildRestart,
    JobRestart,
}

impl Worker {
    pub const fn queue(self) -> &'static str {
        match self {
            Self::BuildCancellation => "build_cancellations",
            Self::BuildRestart => "build_restarts",
            Self::JobRestart => "job_restarts",
        }
    }

    /// First element of `args`, naming the job for the worker.
    pub const fn job_name(self) -> &'static str {
        match self {
            Self::BuildCancellation => "build_cancellation",
            Self::BuildRestart => "build_restart",
            Self::JobRestart => "job_restart",
        }
    }

    pub const fn class_name(self) -> &'static str {
        match self {
            Self::BuildCancellation => "BuildCancellation",
            Self::BuildRestart => "BuildRestart",
            Self::JobRestart => "JobRestart",
        }
    }

    /// Fully qualified worker class, e.g. `Travis::Sidekiq::BuildCancellation`.
    pub fn qualified_class(self, namespace: &str) -> String {
        if namespace.is_empty() {
            self.class_name().to_string()
        } else {
            format!("{namespace}::{}", self.class_name())
        }
    }
}

/// Normalized payload of a state-changing command.
///
/// `id` is rendered as a string, `user_id` as a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub id: String,
    pub user_id: i64,
    pub source: String,
}

impl CommandPayload {
    pub fn from_api(resource_id: i64, user_id: i64) -> Self {
        Self {
            id: resource_id.to_string(),
            user_id,
            source: SOURCE_API.to_string(),
        }
    }
}

/// A message as written to a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub queue: String,
    #[serde(rename = "class")]
    pub worker_class: String,
    pub args: Vec<Value>,
}

impl QueueMessage {
    /// `args` is `[job name, payload]`.
    pub fn new(
        worker: Worker,
        namespace: &str,
        payload: &CommandPayload,
    ) -> Result<Self, DispatchError> {
        Ok(Self {
            queue: worker.queue().to_string(),
            worker_class: worker.qualified_class(namespace),
            args: vec![
                Value::String(worker.job_name().to_string()),
                serde_json::to_value(payload)?,
            ],
        })
    }

    /// The payload, i.e. the last argument.
    pub fn payload(&self) -> Option<CommandPayload> {
        self.args
            .last()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Accepts messages for asynchronous processing.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Accept `message` for processing. Returns once the transport has taken
    /// it, not once the work has run.
    async fn enqueue(&self, message: QueueMessage) -> Result<(), DispatchError>;
}
