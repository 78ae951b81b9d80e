//! Feature flag lookup backed by configuration.
//!
//! The flag store itself lives elsewhere; this reads the rollout table
//! loaded at startup. Lookups are cheap but still happen on every
//! permission check, so a hot-reloading store can replace it without
//! touching the evaluator.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::trace;

use buildgate_core::FeatureFlags;
use buildgate_core::config::FeatureRollout;

#[derive(Debug, Clone, Default)]
pub struct StaticFeatureFlags {
    rollouts: HashMap<String, FeatureRollout>,
}

impl StaticFeatureFlags {
    pub const fn new(rollouts: HashMap<String, FeatureRollout>) -> Self {
        Self { rollouts }
    }

    /// Every feature active for every owner.
    pub fn all_active(features: &[&str]) -> Self {
        let rollouts = features
            .iter()
            .map(|f| {
                (
                    (*f).to_string(),
                    FeatureRollout {
                        everyone: true,
                        owners: Vec::new(),
                    },
                )
            })
            .collect();
        Self { rollouts }
    }
}

#[async_trait]
impl FeatureFlags for StaticFeatureFlags {
    async fn owner_active(&self, feature: &str, owner_id: i64) -> bool {
        let active = self
            .rollouts
            .get(feature)
            .is_some_and(|r| r.is_active_for(owner_id));
        trace!(feature, owner_id, active, "Feature flag lookup");
        active
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_feature_is_inactive() {
        let flags = StaticFeatureFlags::default();
        assert!(!flags.owner_active("cron", 1).await);
    }

    #[tokio::test]
    async fn rollout_is_per_owner() {
        let flags = StaticFeatureFlags::new(HashMap::from([(
            "cron".to_string(),
            FeatureRollout {
                everyone: false,
                owners: vec![1],
            },
        )]));
        assert!(flags.owner_active("cron", 1).await);
        assert!(!flags.owner_active("cron", 2).await);
        assert!(StaticFeatureFlags::all_active(&["cron"]).owner_active("cron", 2).await);
    }
}
