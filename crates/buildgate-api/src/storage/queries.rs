//! Database queries for users, repositories, grants, builds, jobs and
//! branches.
//!
//! Build and job states are owned by the workers; the `set_*_state` queries
//! exist for fixtures and operational tooling, not for the command path.

use buildgate_core::db::{DatabaseError, unix_timestamp};
use buildgate_core::{AccessGrant, State};

use super::db::Database;
use super::models::{Branch, Build, Job, Permission, Repository, User};

impl Database {
    // =========================================================================
    // User queries
    // =========================================================================

    pub async fn create_user(
        &self,
        id: i64,
        login: &str,
        name: Option<&str>,
    ) -> Result<User, DatabaseError> {
        sqlx::query("INSERT INTO users (id, login, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(login)
            .bind(name)
            .bind(unix_timestamp())
            .execute(self.pool())
            .await?;

        self.get_user(id).await
    }

    pub async fn get_user(&self, id: i64) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    // =========================================================================
    // Repository queries
    // =========================================================================

    pub async fn create_repository(
        &self,
        id: i64,
        owner: &User,
        name: &str,
        private: bool,
    ) -> Result<Repository, DatabaseError> {
        sqlx::query(
            "INSERT INTO repositories (id, owner_id, owner_name, name, private, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(owner.id)
        .bind(&owner.login)
        .bind(name)
        .bind(private)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_repository(id).await
    }

    pub async fn get_repository(&self, id: i64) -> Result<Repository, DatabaseError> {
        sqlx::query_as::<_, Repository>("SELECT * FROM repositories WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Repository {id}")))
    }

    pub async fn set_repository_private(&self, id: i64, private: bool) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE repositories SET private = ? WHERE id = ?")
            .bind(private)
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Permission queries
    // =========================================================================

    /// Create or replace the grant for a user on a repository.
    pub async fn grant_access(
        &self,
        user_id: i64,
        repository_id: i64,
        grant: AccessGrant,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO permissions (user_id, repository_id, pull, push, admin) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (user_id, repository_id) DO UPDATE SET pull = excluded.pull, push = excluded.push, admin = excluded.admin",
        )
        .bind(user_id)
        .bind(repository_id)
        .bind(grant.pull)
        .bind(grant.push)
        .bind(grant.admin)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn revoke_access(&self, user_id: i64, repository_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM permissions WHERE user_id = ? AND repository_id = ?")
            .bind(user_id)
            .bind(repository_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The user's grant on a repository, if any.
    pub async fn get_grant(
        &self,
        user_id: i64,
        repository_id: i64,
    ) -> Result<Option<AccessGrant>, DatabaseError> {
        let row = sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions WHERE user_id = ? AND repository_id = ?",
        )
        .bind(user_id)
        .bind(repository_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(AccessGrant::from))
    }

    // =========================================================================
    // Build and job queries
    // =========================================================================

    pub async fn create_build(
        &self,
        id: i64,
        repository_id: i64,
        number: &str,
        state: State,
    ) -> Result<Build, DatabaseError> {
        sqlx::query(
            "INSERT INTO builds (id, repository_id, number, state, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(repository_id)
        .bind(number)
        .bind(state.as_str())
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_build(id).await
    }

    pub async fn get_build(&self, id: i64) -> Result<Build, DatabaseError> {
        sqlx::query_as::<_, Build>("SELECT * FROM builds WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Build {id}")))
    }

    pub async fn set_build_state(&self, id: i64, state: State) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE builds SET state = ? WHERE id = ?")
            .bind(state.as_str())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn create_job(
        &self,
        id: i64,
        build: &Build,
        number: &str,
        state: State,
    ) -> Result<Job, DatabaseError> {
        sqlx::query(
            "INSERT INTO jobs (id, build_id, repository_id, number, state, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(build.id)
        .bind(build.repository_id)
        .bind(number)
        .bind(state.as_str())
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_job(id).await
    }

    pub async fn get_job(&self, id: i64) -> Result<Job, DatabaseError> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Job {id}")))
    }

    pub async fn set_job_state(&self, id: i64, state: State) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE jobs SET state = ? WHERE id = ?")
            .bind(state.as_str())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Branch queries
    // =========================================================================

    pub async fn create_branch(
        &self,
        id: i64,
        repository_id: i64,
        name: &str,
        exists_on_host: bool,
    ) -> Result<Branch, DatabaseError> {
        sqlx::query(
            "INSERT INTO branches (id, repository_id, name, exists_on_host) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(repository_id)
        .bind(name)
        .bind(exists_on_host)
        .execute(self.pool())
        .await?;

        self.get_branch(repository_id, name).await
    }

    pub async fn get_branch(&self, repository_id: i64, name: &str) -> Result<Branch, DatabaseError> {
        sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE repository_id = ? AND name = ?")
            .bind(repository_id)
            .bind(name)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Branch {name} of repository {repository_id}")))
    }
}
