//! Collapse a run of canonical migrations into one upgrade at height 1

use crate::{
    canonical::CanonicalSchedule,
    error::MigrationCancelled,
    migration::{Migration, MigrationContext, MigrationEnv, Upgrade},
    schedule::{UpgradeEntry, UpgradeSchedule},
    state::{StateRoot, TipSet},
    version::{ChainEpoch, NetworkVersion},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Replays every canonical migration up to a target version in a single step.
#[derive(Debug, Clone)]
pub struct ComposedMigration {
    canonical: CanonicalSchedule,
    target: NetworkVersion,
}

impl ComposedMigration {
    pub fn new(canonical: CanonicalSchedule, target: NetworkVersion) -> Self {
        Self { canonical, target }
    }

    pub fn target(&self) -> NetworkVersion {
        self.target
    }
}

#[async_trait]
impl Migration for ComposedMigration {
    async fn migrate(
        &self,
        ctx: &MigrationContext,
        env: &MigrationEnv<'_>,
        old_state: StateRoot,
        height: ChainEpoch,
        tipset: &TipSet,
    ) -> anyhow::Result<StateRoot> {
        let mut state = old_state;
        let mut completed = 0;

        for upgrade in self.canonical.up_to(self.target) {
            let Upgrade::Migrate(migration) = &upgrade.migration else {
                continue;
            };

            if ctx.is_cancelled() {
                error!(
                    "Composed migration to version {} cancelled before version {}",
                    self.target, upgrade.network
                );
                return Err(MigrationCancelled {
                    next: upgrade.network,
                    completed,
                }
                .into());
            }

            debug!(
                "Migrating state {} to version {} at height {}",
                state, upgrade.network, height
            );
            state = migration
                .migrate(ctx, env, state, height, tipset)
                .await
                .inspect_err(|e| {
                    error!(
                        "Migration to version {} failed at height {}: {}",
                        upgrade.network, height, e
                    )
                })?;
            completed += 1;
        }

        info!(
            "Composed migration to version {} applied {} migrations, new state {}",
            self.target, completed, state
        );
        Ok(state)
    }
}

/// Start the network at `version` from height 1.
///
/// The schedule holds a single upgrade whose migration replays every canonical
/// migration up to `version`, so the chain begins already migrated.
pub fn instantaneous_network_version(
    canonical: &CanonicalSchedule,
    version: NetworkVersion,
) -> UpgradeSchedule {
    let migration = ComposedMigration::new(canonical.clone(), version);
    UpgradeSchedule::from_ordered(vec![UpgradeEntry::new(
        version,
        1,
        Upgrade::Migrate(Arc::new(migration)),
    )])
}
