//! State-gated commands.
//!
//! Every command runs the same pipeline: require a login, locate the target,
//! check the capability, validate the target's state, then act. The first
//! failing step decides the error, and nothing is dispatched or written
//! unless every step before it passed.

mod build;
mod cron;
mod job;


use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use buildgate_core::{CommandError, FeatureFlags, ResourceKind, State};
#[cfg(feature = "metrics")]
use buildgate_core::metrics::CommandMetrics;

use crate::dispatch::{CommandPayload, Dispatcher, QueueMessage, Worker};
use crate::locator::ResourceLocator;
use crate::storage::Database;

pub use cron::{CronCreated, CronParams};

/// Transition a command asks the workers to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateChange {
    Cancel,
    Restart,
}

impl StateChange {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Restart => "restart",
        }
    }
}

/// Acknowledgement of an accepted command. The work itself is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub resource_type: ResourceKind,
    pub id: i64,
    /// State observed when the command was accepted.
    pub state: State,
    pub state_change: StateChange,
    /// What was handed to the queue.
    pub payload: CommandPayload,
}

/// The command layer. Cheap to share behind an `Arc`.
pub struct Commands {
    db: Database,
    locator: ResourceLocator,
    flags: Arc<dyn FeatureFlags>,
    dispatcher: Arc<dyn Dispatcher>,
    worker_namespace: String,
    #[cfg(feature = "metrics")]
    metrics: CommandMetrics,
}

impl Commands {
    pub fn new(
        db: Database,
        flags: Arc<dyn FeatureFlags>,
        dispatcher: Arc<dyn Dispatcher>,
        worker_namespace: impl Into<String>,
    ) -> Self {
        Self {
            locator: ResourceLocator::new(db.clone()),
            db,
            flags,
            dispatcher,
            worker_namespace: worker_namespace.into(),
            #[cfg(feature = "metrics")]
            metrics: CommandMetrics::new(),
        }
    }

    /// Build the payload for `resource_id` and hand it to `worker`'s queue.
    async fn dispatch(
        &self,
        worker: Worker,
        resource_id: i64,
        user_id: i64,
    ) -> Result<CommandPayload, CommandError> {
        let payload = CommandPayload::from_api(resource_id, user_id);
        let message = QueueMessage::new(worker, &self.worker_namespace, &payload)?;
        self.dispatcher.enqueue(message).await.map_err(|e| {
            error!(queue = worker.queue(), error = %e, "Failed to enqueue command");
            CommandError::from(e)
        })?;
        Ok(payload)
    }

    /// Log and count the outcome of `command`.
    fn observe<T>(
        &self,
        command: &'static str,
        result: Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        match &result {
            Ok(_) => {
                info!(command, "Command accepted");
                #[cfg(feature = "metrics")]
                self.metrics.accepted(command);
            }
            Err(e) => {
                warn!(
                    command,
                    error_type = e.error_type(),
                    status = e.status(),
                    "Command rejected"
                );
                #[cfg(feature = "metrics")]
                self.metrics.rejected(command, e.error_type());
            }
        }
        result
    }
}
