//! Create a cron for a branch.
//!
//! Unlike the other commands this writes synchronously and dispatches
//! nothing. A branch holds at most one cron: an existing one is deleted
//! and the new one inserted in a single transaction.

use serde::Deserialize;
use tracing::{debug, instrument};

use buildgate_core::{
    Capability, CommandError, CronInterval, CronPermissions, RepositoryPermissions,
    ResourcePermissions,
};

use super::Commands;
use crate::auth::Actor;
use crate::storage::{Branch, Cron, NewCron, Repository};

const BRANCH_NOT_ON_HOST: &str =
    "Crons can only be set up for branches existing on the source host!";
const INVALID_INTERVAL: &str =
    r#"Invalid value for interval. Interval must be "daily", "weekly" or "monthly"!"#;

/// Caller-supplied cron settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CronParams {
    pub interval: Option<String>,
    pub disable_by_build: Option<bool>,
}

/// A newly created cron with the records it hangs off.
#[derive(Debug, Clone)]
pub struct CronCreated {
    pub cron: Cron,
    pub repository: Repository,
    pub branch: Branch,
}

impl Commands {
    #[instrument(skip(self, actor, params), fields(user_id = actor.user_id()))]
    pub async fn create_cron(
        &self,
        actor: &Actor,
        repository_id: Option<&str>,
        branch: Option<&str>,
        params: &CronParams,
    ) -> Result<CronCreated, CommandError> {
        let result = self
            .try_create_cron(actor, repository_id, branch, params)
            .await;
        self.observe("cron.create", result)
    }

    async fn try_create_cron(
        &self,
        actor: &Actor,
        repository_id: Option<&str>,
        branch: Option<&str>,
        params: &CronParams,
    ) -> Result<CronCreated, CommandError> {
        let user = actor.require_login()?;
        let repository = self.locator.find_repository(actor, repository_id).await?;
        let branch = self.locator.find_branch(&repository, branch).await?;
        RepositoryPermissions::new(repository.access, self.flags.clone())
            .check(Capability::CreateCron)
            .await?;

        if !branch.resource.exists_on_host {
            return Err(CommandError::unprocessable(BRANCH_NOT_ON_HOST));
        }
        let interval = params
            .interval
            .as_deref()
            .and_then(CronInterval::parse)
            .ok_or_else(|| CommandError::unprocessable(INVALID_INTERVAL))?;

        if let Some(existing) = self.db.get_branch_cron(branch.resource.id).await? {
            CronPermissions::new(branch.access)
                .check(Capability::Delete)
                .await?;
            debug!(cron_id = existing.id, "Replacing existing cron");
        }

        let cron = self
            .db
            .replace_branch_cron(&NewCron {
                branch_id: branch.resource.id,
                interval,
                disable_by_build: params.disable_by_build.unwrap_or(false),
                created_by: user.id,
            })
            .await?;

        Ok(CronCreated {
            cron,
            repository: repository.resource,
            branch: branch.resource,
        })
    }
}
