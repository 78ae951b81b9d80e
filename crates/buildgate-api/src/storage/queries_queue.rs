//! Outbound queue queries.
//!
//! Messages are appended here and consumed by an external worker fleet; this
//! crate never removes them on the command path.

use buildgate_core::db::{DatabaseError, unix_timestamp};

use super::db::Database;
use super::models::QueueMessageRow;

impl Database {
    /// Append a message to a queue, returning its id.
    pub async fn push_queue_message(
        &self,
        queue: &str,
        worker_class: &str,
        args_json: &str,
    ) -> Result<i64, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO queue_messages (queue, worker_class, args, enqueued_at) VALUES (?, ?, ?, ?)",
        )
        .bind(queue)
        .bind(worker_class)
        .bind(args_json)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Messages waiting on a queue, oldest first.
    pub async fn queue_messages(&self, queue: &str) -> Result<Vec<QueueMessageRow>, DatabaseError> {
        let messages = sqlx::query_as::<_, QueueMessageRow>(
            "SELECT * FROM queue_messages WHERE queue = ? ORDER BY id ASC",
        )
        .bind(queue)
        .fetch_all(self.pool())
        .await?;

        Ok(messages)
    }

    /// Remove a message once a consumer has taken it.
    pub async fn ack_queue_message(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM queue_messages WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_queue_messages(&self, queue: &str) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM queue_messages WHERE queue = ?")
            .bind(queue)
            .fetch_one(self.pool())
            .await?;

        Ok(row.0)
    }
}
