//! Capability evaluation over repository ownership.
//!
//! Every resource is owned, directly or through a build, by a repository.
//! The actor's grant on that repository decides the base `write` predicate;
//! each resource kind then maps its capabilities onto it. Repository-level
//! `create_cron` additionally asks the feature flag lookup on every call.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::resource::ResourceKind;

/// Feature name gating cron creation.
pub const CRON_FEATURE: &str = "cron";

/// A named capability an actor may hold on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Read,
    Write,
    Enable,
    Disable,
    Star,
    Unstar,
    CreateRequest,
    CreateCron,
    Cancel,
    Restart,
    Debug,
    Delete,
}

impl Capability {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Star => "star",
            Self::Unstar => "unstar",
            Self::CreateRequest => "create_request",
            Self::CreateCron => "create_cron",
            Self::Cancel => "cancel",
            Self::Restart => "restart",
            Self::Debug => "debug",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags stored for an (actor, repository) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub pull: bool,
    pub push: bool,
    pub admin: bool,
}

impl AccessGrant {
    pub const fn read_only() -> Self {
        Self {
            pull: true,
            push: false,
            admin: false,
        }
    }

    pub const fn push() -> Self {
        Self {
            pull: true,
            push: true,
            admin: false,
        }
    }
}

/// What the evaluator needs to know about the owning repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryAccess {
    pub owner_id: i64,
    pub private: bool,
    /// `None` when the actor is anonymous or holds no grant.
    pub grant: Option<AccessGrant>,
}

impl RepositoryAccess {
    /// Shared write predicate: push or admin on the owning repository.
    pub fn write(&self) -> bool {
        self.grant.is_some_and(|g| g.push || g.admin)
    }

    /// Public repositories are readable by anyone; private ones need a grant.
    pub const fn read(&self) -> bool {
        !self.private || self.grant.is_some()
    }
}

/// Feature flag lookup, queried per call.
#[async_trait]
pub trait FeatureFlags: Send + Sync {
    /// Whether `feature` is active for the account that owns a repository.
    async fn owner_active(&self, feature: &str, owner_id: i64) -> bool;
}

/// Capability checks for one resource.
#[async_trait]
pub trait ResourcePermissions: Send + Sync {
    fn resource_type(&self) -> ResourceKind;

    fn access(&self) -> &RepositoryAccess;

    async fn allows(&self, capability: Capability) -> bool;

    /// Fail with `InsufficientAccess` when the capability is not held.
    async fn check(&self, capability: Capability) -> Result<(), CommandError> {
        if self.allows(capability).await {
            Ok(())
        } else {
            Err(CommandError::InsufficientAccess {
                resource_type: self.resource_type(),
                permission: capability,
            })
        }
    }
}

/// Repository capabilities. The only kind that consults feature flags.
pub struct RepositoryPermissions {
    access: RepositoryAccess,
    flags: Arc<dyn FeatureFlags>,
}

impl RepositoryPermissions {
    pub fn new(access: RepositoryAccess, flags: Arc<dyn FeatureFlags>) -> Self {
        Self { access, flags }
    }
}

#[async_trait]
impl ResourcePermissions for RepositoryPermissions {
    fn resource_type(&self) -> ResourceKind {
        ResourceKind::Repository
    }

    fn access(&self) -> &RepositoryAccess {
        &self.access
    }

    async fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => self.access.read(),
            Capability::Write
            | Capability::Enable
            | Capability::Disable
            | Capability::Star
            | Capability::Unstar
            | Capability::CreateRequest => self.access.write(),
            // Cheap predicate first; the flag lookup may leave the process.
            Capability::CreateCron => {
                self.access.write()
                    && self
                        .flags
                        .owner_active(CRON_FEATURE, self.access.owner_id)
                        .await
            }
            Capability::Cancel | Capability::Restart | Capability::Debug | Capability::Delete => {
                false
            }
        }
    }
}

/// Build capabilities: `cancel` and `restart` require write.
#[derive(Debug, Clone, Copy)]
pub struct BuildPermissions {
    access: RepositoryAccess,
}

impl BuildPermissions {
    pub const fn new(access: RepositoryAccess) -> Self {
        Self { access }
    }
}

#[async_trait]
impl ResourcePermissions for BuildPermissions {
    fn resource_type(&self) -> ResourceKind {
        ResourceKind::Build
    }

    fn access(&self) -> &RepositoryAccess {
        &self.access
    }

    async fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => self.access.read(),
            Capability::Write | Capability::Cancel | Capability::Restart => self.access.write(),
            _ => false,
        }
    }
}

/// Job capabilities: `cancel`, `restart` and `debug` require write.
#[derive(Debug, Clone, Copy)]
pub struct JobPermissions {
    access: RepositoryAccess,
}

impl JobPermissions {
    pub const fn new(access: RepositoryAccess) -> Self {
        Self { access }
    }
}

#[async_trait]
impl ResourcePermissions for JobPermissions {
    fn resource_type(&self) -> ResourceKind {
        ResourceKind::Job
    }

    fn access(&self) -> &RepositoryAccess {
        &self.access
    }

    async fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => self.access.read(),
            Capability::Write | Capability::Cancel | Capability::Restart | Capability::Debug => {
                self.access.write()
            }
            _ => false,
        }
    }
}

/// Cron capabilities: `delete` requires write on the branch's repository.
#[derive(Debug, Clone, Copy)]
pub struct CronPermissions {
    access: RepositoryAccess,
}

impl CronPermissions {
    pub const fn new(access: RepositoryAccess) -> Self {
        Self { access }
    }
}

#[async_trait]
impl ResourcePermissions for CronPermissions {
    fn resource_type(&self) -> ResourceKind {
        ResourceKind::Cron
    }

    fn access(&self) -> &RepositoryAccess {
        &self.access
    }

    async fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => self.access.read(),
            Capability::Write | Capability::Delete => self.access.write(),
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Flags {
        active: bool,
        calls: AtomicUsize,
    }

    impl Flags {
        fn new(active: bool) -> Arc<Self> {
            Arc::new(Self {
                active,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl FeatureFlags for Flags {
        async fn owner_active(&self, feature: &str, _owner_id: i64) -> bool {
            assert_eq!(feature, CRON_FEATURE);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.active
        }
    }

    fn access(grant: Option<AccessGrant>) -> RepositoryAccess {
        RepositoryAccess {
            owner_id: 1,
            private: false,
            grant,
        }
    }

    #[tokio::test]
    async fn repository_capabilities_follow_write() {
        let perms = RepositoryPermissions::new(access(Some(AccessGrant::push())), Flags::new(true));
        for cap in [
            Capability::Enable,
            Capability::Disable,
            Capability::Star,
            Capability::Unstar,
            Capability::CreateRequest,
        ] {
            assert!(perms.allows(cap).await, "{cap} should be allowed");
        }

        let read_only =
            RepositoryPermissions::new(access(Some(AccessGrant::read_only())), Flags::new(true));
        assert!(read_only.allows(Capability::Read).await);
        assert!(!read_only.allows(Capability::Star).await);
    }

    #[tokio::test]
    async fn admin_implies_write() {
        let grant = AccessGrant {
            pull: false,
            push: false,
            admin: true,
        };
        assert!(access(Some(grant)).write());
    }

    #[tokio::test]
    async fn create_cron_needs_feature_flag() {
        let flags = Flags::new(false);
        let perms = RepositoryPermissions::new(access(Some(AccessGrant::push())), flags.clone());
        assert!(!perms.allows(Capability::CreateCron).await);

        let perms = RepositoryPermissions::new(access(Some(AccessGrant::push())), Flags::new(true));
        assert!(perms.allows(Capability::CreateCron).await);
    }

    #[tokio::test]
    async fn feature_flag_is_queried_on_every_call() {
        let flags = Flags::new(true);
        let perms = RepositoryPermissions::new(access(Some(AccessGrant::push())), flags.clone());
        perms.allows(Capability::CreateCron).await;
        perms.allows(Capability::CreateCron).await;
        assert_eq!(flags.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn check_reports_denied_capability() {
        let perms = BuildPermissions::new(access(Some(AccessGrant::read_only())));
        let err = perms.check(Capability::Cancel).await.unwrap_err();
        assert!(matches!(
            err,
            CommandError::InsufficientAccess {
                resource_type: ResourceKind::Build,
                permission: Capability::Cancel,
            }
        ));
    }

    #[tokio::test]
    async fn private_repository_needs_grant_to_read() {
        let hidden = RepositoryAccess {
            owner_id: 1,
            private: true,
            grant: None,
        };
        assert!(!JobPermissions::new(hidden).allows(Capability::Read).await);
        assert!(!hidden.write());
    }
}
