//! Durable queue backed by the `queue_messages` table.

use async_trait::async_trait;
use tracing::debug;

use crate::storage::Database;

use super::{DispatchError, Dispatcher, QueueMessage};

/// Writes messages to the local database, where the worker fleet picks
/// them up.
#[derive(Clone)]
pub struct SqliteQueue {
    db: Database,
}

impl SqliteQueue {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Dispatcher for SqliteQueue {
    async fn enqueue(&self, message: QueueMessage) -> Result<(), DispatchError> {
        let args = serde_json::to_string(&message.args)?;
        let id = self
            .db
            .push_queue_message(&message.queue, &message.worker_class, &args)
            .await
            .map_err(|e| DispatchError::Unavailable(e.to_string()))?;

        debug!(id, queue = %message.queue, class = %message.worker_class, "Message enqueued");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dispatch::{CommandPayload, Worker};

    #[tokio::test]
    async fn enqueue_persists_args_as_json() {
        let db = Database::open_in_memory().await.unwrap();
        let queue = SqliteQueue::new(db.clone());

        let msg = QueueMessage::new(Worker::JobRestart, "W", &CommandPayload::from_api(3, 1)).unwrap();
        queue.enqueue(msg).await.unwrap();

        let rows = db.queue_messages("job_restarts").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].worker_class, "W::JobRestart");
        assert_eq!(
            rows[0].args,
            r#"["job_restart",{"id":"3","source":"api","user_id":1}]"#
        );
    }

    #[tokio::test]
    async fn closed_pool_is_unavailable() {
        let db = Database::open_in_memory().await.unwrap();
        db.pool().close().await;
        let queue = SqliteQueue::new(db);

        let msg = QueueMessage::new(Worker::JobRestart, "W", &CommandPayload::from_api(3, 1)).unwrap();
        let err = queue.enqueue(msg).await.unwrap_err();
        assert!(matches!(err, DispatchError::Unavailable(_)));
    }
}
