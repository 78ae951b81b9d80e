//! Resolves request identifiers to resources visible to the actor.
//!
//! A resource that does not exist and one the actor may not see produce the
//! same `NotFound`, so callers cannot discover private repositories.

use tracing::error;

use buildgate_core::db::DatabaseError;
use buildgate_core::{CommandError, RepositoryAccess, ResourceKind};

use crate::auth::Actor;
use crate::storage::{Branch, Build, Database, Job, Repository};

/// A resource together with what the permission evaluator needs to know
/// about its owning repository.
#[derive(Debug, Clone)]
pub struct Located<T> {
    pub resource: T,
    pub access: RepositoryAccess,
}

#[derive(Clone)]
pub struct ResourceLocator {
    db: Database,
}

impl ResourceLocator {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn find_repository(
        &self,
        actor: &Actor,
        id: Option<&str>,
    ) -> Result<Located<Repository>, CommandError> {
        let id = parse_id(ResourceKind::Repository, id)?;
        let repository = self
            .db
            .get_repository(id)
            .await
            .map_err(|e| lookup_error(ResourceKind::Repository, e))?;
        self.visible(actor, ResourceKind::Repository, repository.id, repository)
            .await
    }

    pub async fn find_build(
        &self,
        actor: &Actor,
        id: Option<&str>,
    ) -> Result<Located<Build>, CommandError> {
        let id = parse_id(ResourceKind::Build, id)?;
        let build = self
            .db
            .get_build(id)
            .await
            .map_err(|e| lookup_error(ResourceKind::Build, e))?;
        let repository_id = build.repository_id;
        self.visible(actor, ResourceKind::Build, repository_id, build)
            .await
    }

    pub async fn find_job(
        &self,
        actor: &Actor,
        id: Option<&str>,
    ) -> Result<Located<Job>, CommandError> {
        let id = parse_id(ResourceKind::Job, id)?;
        let job = self
            .db
            .get_job(id)
            .await
            .map_err(|e| lookup_error(ResourceKind::Job, e))?;
        let repository_id = job.repository_id;
        self.visible(actor, ResourceKind::Job, repository_id, job)
            .await
    }

    /// Branch by name within an already located repository.
    pub async fn find_branch(
        &self,
        repository: &Located<Repository>,
        name: Option<&str>,
    ) -> Result<Located<Branch>, CommandError> {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| missing(ResourceKind::Branch, "name"))?;
        let branch = self
            .db
            .get_branch(repository.resource.id, name)
            .await
            .map_err(|e| lookup_error(ResourceKind::Branch, e))?;
        Ok(Located {
            resource: branch,
            access: repository.access,
        })
    }

    async fn visible<T>(
        &self,
        actor: &Actor,
        kind: ResourceKind,
        repository_id: i64,
        resource: T,
    ) -> Result<Located<T>, CommandError> {
        let access = self.access(actor, kind, repository_id).await?;
        if !access.read() {
            return Err(CommandError::NotFound {
                resource_type: kind,
            });
        }
        Ok(Located { resource, access })
    }

    async fn access(
        &self,
        actor: &Actor,
        kind: ResourceKind,
        repository_id: i64,
    ) -> Result<RepositoryAccess, CommandError> {
        let repository = self
            .db
            .get_repository(repository_id)
            .await
            .map_err(|e| lookup_error(kind, e))?;
        let grant = match actor.user_id() {
            Some(user_id) => self.db.get_grant(user_id, repository_id).await?,
            None => None,
        };
        Ok(RepositoryAccess {
            owner_id: repository.owner_id,
            private: repository.private,
            grant,
        })
    }
}

fn missing(kind: ResourceKind, field: &str) -> CommandError {
    CommandError::WrongParams(format!("missing {kind}.{field}"))
}

/// Blank ids are a parameter error; anything else that is not a number
/// cannot name a record and is reported as not found.
fn parse_id(kind: ResourceKind, id: Option<&str>) -> Result<i64, CommandError> {
    let id = id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing(kind, "id"))?;
    id.parse().map_err(|_| CommandError::NotFound {
        resource_type: kind,
    })
}

fn lookup_error(kind: ResourceKind, e: DatabaseError) -> CommandError {
    match e {
        DatabaseError::NotFound(_) => CommandError::NotFound {
            resource_type: kind,
        },
        other => {
            error!(resource_type = %kind, error = %other, "Resource lookup failed");
            CommandError::Internal(other.to_string())
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use buildgate_core::{AccessGrant, State};

    use super::*;

    async fn setup() -> (Database, ResourceLocator) {
        let db = Database::open_in_memory().await.unwrap();
        let owner = db.create_user(1, "svenfuchs", None).await.unwrap();
        db.create_user(2, "carla", None).await.unwrap();
        db.create_repository(10, &owner, "minimal", false)
            .await
            .unwrap();
        db.create_repository(20, &owner, "secret", true)
            .await
            .unwrap();
        db.create_build(7, 10, "1", State::Started).await.unwrap();
        db.create_build(8, 20, "1", State::Started).await.unwrap();
        db.grant_access(1, 10, AccessGrant::push()).await.unwrap();
        db.grant_access(1, 20, AccessGrant::push()).await.unwrap();
        let locator = ResourceLocator::new(db.clone());
        (db, locator)
    }

    #[tokio::test]
    async fn missing_id_is_wrong_params() {
        let (_, locator) = setup().await;
        for id in [None, Some(""), Some("  ")] {
            let err = locator.find_build(&Actor::Anonymous, id).await.unwrap_err();
            match err {
                CommandError::WrongParams(msg) => assert_eq!(msg, "missing build.id"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn non_numeric_id_is_not_found() {
        let (_, locator) = setup().await;
        let err = locator
            .find_job(&Actor::Anonymous, Some("abc"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::NotFound {
                resource_type: ResourceKind::Job
            }
        ));
    }

    #[tokio::test]
    async fn public_build_is_visible_to_anonymous() {
        let (_, locator) = setup().await;
        let located = locator
            .find_build(&Actor::Anonymous, Some("7"))
            .await
            .unwrap();
        assert_eq!(located.resource.id, 7);
        assert_eq!(located.access.owner_id, 1);
        assert_eq!(located.access.grant, None);
        assert!(!located.access.write());
    }

    #[tokio::test]
    async fn private_build_without_grant_looks_absent() {
        let (_, locator) = setup().await;
        let hidden = locator
            .find_build(&Actor::user(2, "carla"), Some("8"))
            .await
            .unwrap_err();
        let absent = locator
            .find_build(&Actor::user(2, "carla"), Some("999"))
            .await
            .unwrap_err();
        assert_eq!(hidden.to_string(), absent.to_string());
        assert_eq!(hidden.status(), absent.status());

        let visible = locator
            .find_build(&Actor::user(1, "svenfuchs"), Some("8"))
            .await
            .unwrap();
        assert!(visible.access.write());
    }

    #[tokio::test]
    async fn branch_inherits_repository_access() {
        let (db, locator) = setup().await;
        db.create_branch(1, 10, "master", true).await.unwrap();
        let repository = locator
            .find_repository(&Actor::user(1, "svenfuchs"), Some("10"))
            .await
            .unwrap();

        let branch = locator
            .find_branch(&repository, Some("master"))
            .await
            .unwrap();
        assert_eq!(branch.resource.name, "master");
        assert_eq!(branch.access, repository.access);

        let err = locator
            .find_branch(&repository, Some("feature"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "branch not found (or insufficient access)");
    }
}
