//! Cancel and restart a build.

use tracing::instrument;

use buildgate_core::{BuildPermissions, Capability, CommandError, ResourceKind, ResourcePermissions};

use super::{Commands, Receipt, StateChange};
use crate::auth::Actor;
use crate::dispatch::Worker;

impl Commands {
    /// Ask the workers to cancel a build that is still running.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id()))]
    pub async fn cancel_build(
        &self,
        actor: &Actor,
        id: Option<&str>,
    ) -> Result<Receipt, CommandError> {
        let result = self.try_cancel_build(actor, id).await;
        self.observe("build.cancel", result)
    }

    /// Ask the workers to restart a build that has finished.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id()))]
    pub async fn restart_build(
        &self,
        actor: &Actor,
        id: Option<&str>,
    ) -> Result<Receipt, CommandError> {
        let result = self.try_restart_build(actor, id).await;
        self.observe("build.restart", result)
    }

    async fn try_cancel_build(
        &self,
        actor: &Actor,
        id: Option<&str>,
    ) -> Result<Receipt, CommandError> {
        let user = actor.require_login()?;
        let build = self.locator.find_build(actor, id).await?;
        BuildPermissions::new(build.access)
            .check(Capability::Cancel)
            .await?;

        let state = build.resource.state()?;
        if state.is_finished() {
            return Err(CommandError::BuildNotCancelable);
        }

        let payload = self
            .dispatch(Worker::BuildCancellation, build.resource.id, user.id)
            .await?;
        Ok(Receipt {
            resource_type: ResourceKind::Build,
            id: build.resource.id,
            state,
            state_change: StateChange::Cancel,
            payload,
        })
    }

    async fn try_restart_build(
        &self,
        actor: &Actor,
        id: Option<&str>,
    ) -> Result<Receipt, CommandError> {
        let user = actor.require_login()?;
        let build = self.locator.find_build(actor, id).await?;
        BuildPermissions::new(build.access)
            .check(Capability::Restart)
            .await?;

        let state = build.resource.state()?;
        if state.is_running() {
            return Err(CommandError::BuildAlreadyRunning);
        }

        let payload = self
            .dispatch(Worker::BuildRestart, build.resource.id, user.id)
            .await?;
        Ok(Receipt {
            resource_type: ResourceKind::Build,
            id: build.resource.id,
            state,
            state_change: StateChange::Restart,
            payload,
        })
    }
}
