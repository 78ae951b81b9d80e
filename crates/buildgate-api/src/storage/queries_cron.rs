//! Cron queries.

use buildgate_core::CronInterval;
use buildgate_core::db::{DatabaseError, unix_timestamp};

use super::db::Database;
use super::models::Cron;

/// Parameters for creating a cron.
pub struct NewCron {
    pub branch_id: i64,
    pub interval: CronInterval,
    pub disable_by_build: bool,
    pub created_by: i64,
}

impl Database {
    /// Insert a cron. Fails if the branch already has one (unique index);
    /// callers remove the existing cron first.
    pub async fn create_cron(&self, params: &NewCron) -> Result<Cron, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO crons (branch_id, interval, disable_by_build, created_by, created_at, next_run_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(params.branch_id)
        .bind(params.interval.as_str())
        .bind(params.disable_by_build)
        .bind(params.created_by)
        .bind(now)
        .bind(now + params.interval.period_secs())
        .execute(self.pool())
        .await?;

        self.get_cron(result.last_insert_rowid()).await
    }

    /// Replace whatever cron the branch has with a new one, in one
    /// transaction. The delete comes first so the transaction takes the write
    /// lock up front; concurrent replacements serialize and the last one wins.
    pub async fn replace_branch_cron(&self, params: &NewCron) -> Result<Cron, DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM crons WHERE branch_id = ?")
            .bind(params.branch_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "INSERT INTO crons (branch_id, interval, disable_by_build, created_by, created_at, next_run_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(params.branch_id)
        .bind(params.interval.as_str())
        .bind(params.disable_by_build)
        .bind(params.created_by)
        .bind(now)
        .bind(now + params.interval.period_secs())
        .execute(&mut *tx)
        .await?;

        let cron = sqlx::query_as::<_, Cron>("SELECT * FROM crons WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(cron)
    }

    pub async fn get_cron(&self, id: i64) -> Result<Cron, DatabaseError> {
        sqlx::query_as::<_, Cron>("SELECT * FROM crons WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Cron {id}")))
    }

    pub async fn get_branch_cron(&self, branch_id: i64) -> Result<Option<Cron>, DatabaseError> {
        let cron = sqlx::query_as::<_, Cron>("SELECT * FROM crons WHERE branch_id = ?")
            .bind(branch_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(cron)
    }

    pub async fn delete_cron(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM crons WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_branch_crons(&self, branch_id: i64) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM crons WHERE branch_id = ?")
            .bind(branch_id)
            .fetch_one(self.pool())
            .await?;

        Ok(row.0)
    }
}
