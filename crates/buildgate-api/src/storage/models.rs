//! Data models for buildgate storage.

use serde::{Deserialize, Serialize};

use buildgate_core::db::DatabaseError;
use buildgate_core::{AccessGrant, CronInterval, State};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Repository {
    pub id: i64,
    pub owner_id: i64,
    pub owner_name: String,
    pub name: String,
    pub private: bool,
    pub created_at: i64,
}

impl Repository {
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner_name, self.name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub user_id: i64,
    pub repository_id: i64,
    pub pull: bool,
    pub push: bool,
    pub admin: bool,
}

impl From<Permission> for AccessGrant {
    fn from(p: Permission) -> Self {
        Self {
            pull: p.pull,
            push: p.push,
            admin: p.admin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Build {
    pub id: i64,
    pub repository_id: i64,
    pub number: String,
    pub state: String,
    pub branch: Option<String>,
    pub created_at: i64,
}

impl Build {
    pub fn state(&self) -> Result<State, DatabaseError> {
        parse_state(&self.state, "build", self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: i64,
    pub build_id: i64,
    pub repository_id: i64,
    pub number: String,
    pub state: String,
    pub created_at: i64,
}

impl Job {
    pub fn state(&self) -> Result<State, DatabaseError> {
        parse_state(&self.state, "job", self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Branch {
    pub id: i64,
    pub repository_id: i64,
    pub name: String,
    pub exists_on_host: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cron {
    pub id: i64,
    pub branch_id: i64,
    pub interval: String,
    pub disable_by_build: bool,
    pub created_by: i64,
    pub created_at: i64,
    pub next_run_at: i64,
}

impl Cron {
    pub fn interval(&self) -> Result<CronInterval, DatabaseError> {
        CronInterval::parse(&self.interval).ok_or_else(|| {
            DatabaseError::Corrupt(format!("cron {} has interval {:?}", self.id, self.interval))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueueMessageRow {
    pub id: i64,
    pub queue: String,
    pub worker_class: String,
    pub args: String,
    pub enqueued_at: i64,
}

fn parse_state(raw: &str, kind: &str, id: i64) -> Result<State, DatabaseError> {
    raw.parse()
        .map_err(|e| DatabaseError::Corrupt(format!("{kind} {id}: {e}")))
}
