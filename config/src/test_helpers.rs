use async_trait::async_trait;
use std::sync::Arc;
use upgrade_schedule::{
    ChainEpoch, Migration, MigrationContext, MigrationEnv, StateRoot, TipSet, UpgradeMigrations,
};

pub struct Noop;

#[async_trait]
impl Migration for Noop {
    async fn migrate(
        &self,
        _ctx: &MigrationContext,
        _env: &MigrationEnv<'_>,
        old_state: StateRoot,
        _height: ChainEpoch,
        _tipset: &TipSet,
    ) -> anyhow::Result<StateRoot> {
        Ok(old_state)
    }
}

pub struct NoopMigrations;

impl UpgradeMigrations for NoopMigrations {
    fn upgrade_actors_v2(&self) -> Arc<dyn Migration> {
        Arc::new(Noop)
    }
    fn upgrade_actors_v3(&self) -> Arc<dyn Migration> {
        Arc::new(Noop)
    }
    fn upgrade_actors_v4(&self) -> Arc<dyn Migration> {
        Arc::new(Noop)
    }
    fn upgrade_actors_v5(&self) -> Arc<dyn Migration> {
        Arc::new(Noop)
    }
    fn upgrade_calico(&self) -> Arc<dyn Migration> {
        Arc::new(Noop)
    }
}
