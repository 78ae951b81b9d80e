//! Restart a job.

use tracing::instrument;

use buildgate_core::{Capability, CommandError, JobPermissions, ResourceKind, ResourcePermissions};

use super::{Commands, Receipt, StateChange};
use crate::auth::Actor;
use crate::dispatch::Worker;

impl Commands {
    /// Ask the workers to restart a job that has finished.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id()))]
    pub async fn restart_job(
        &self,
        actor: &Actor,
        id: Option<&str>,
    ) -> Result<Receipt, CommandError> {
        let result = self.try_restart_job(actor, id).await;
        self.observe("job.restart", result)
    }

    async fn try_restart_job(
        &self,
        actor: &Actor,
        id: Option<&str>,
    ) -> Result<Receipt, CommandError> {
        let user = actor.require_login()?;
        let job = self.locator.find_job(actor, id).await?;
        JobPermissions::new(job.access)
            .check(Capability::Restart)
            .await?;

        let state = job.resource.state()?;
        if state.is_running() {
            return Err(CommandError::JobAlreadyRunning);
        }

        let payload = self
            .dispatch(Worker::JobRestart, job.resource.id, user.id)
            .await?;
        Ok(Receipt {
            resource_type: ResourceKind::Job,
            id: job.resource.id,
            state,
            state_change: StateChange::Restart,
            payload,
        })
    }
}
