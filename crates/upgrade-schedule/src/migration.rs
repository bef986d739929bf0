//! Migration capability and the per-upgrade migration variant

use crate::{
    state::{ExecMonitor, MigrationCache, StateManager, StateRoot, TipSet},
    version::ChainEpoch,
};
use async_trait::async_trait;
use std::{fmt, sync::Arc};
use tokio_util::sync::CancellationToken;

/// Execution context threaded through every migration call
#[derive(Debug, Clone, Default)]
pub struct MigrationContext {
    cancel: CancellationToken,
}

impl MigrationContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Executor-side handles a migration may use.
#[derive(Clone, Copy)]
pub struct MigrationEnv<'a> {
    pub state_manager: &'a dyn StateManager,
    pub cache: &'a MigrationCache,
    pub monitor: Option<&'a dyn ExecMonitor>,
}

impl<'a> MigrationEnv<'a> {
    pub fn new(state_manager: &'a dyn StateManager, cache: &'a MigrationCache) -> Self {
        Self {
            state_manager,
            cache,
            monitor: None,
        }
    }

    pub fn with_monitor(mut self, monitor: &'a dyn ExecMonitor) -> Self {
        self.monitor = Some(monitor);
        self
    }
}

/// A deterministic rewrite of chain state from one network version to the next.
///
/// Invoked exactly once per activation. A migration observing a cancelled
/// context should fail promptly.
#[async_trait]
pub trait Migration: Send + Sync {
    async fn migrate(
        &self,
        ctx: &MigrationContext,
        env: &MigrationEnv<'_>,
        old_state: StateRoot,
        height: ChainEpoch,
        tipset: &TipSet,
    ) -> anyhow::Result<StateRoot>;
}

/// What happens to chain state when an upgrade activates
#[derive(Clone, Default)]
pub enum Upgrade {
    /// Version bump only, state is left untouched
    #[default]
    VersionBump,

    /// State is rewritten by the migration
    Migrate(Arc<dyn Migration>),
}

impl Upgrade {
    pub fn migrate(migration: impl Migration + 'static) -> Self {
        Upgrade::Migrate(Arc::new(migration))
    }

    pub fn migration(&self) -> Option<&Arc<dyn Migration>> {
        match self {
            Upgrade::VersionBump => None,
            Upgrade::Migrate(migration) => Some(migration),
        }
    }

    pub fn is_version_bump(&self) -> bool {
        matches!(self, Upgrade::VersionBump)
    }
}

impl fmt::Debug for Upgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upgrade::VersionBump => write!(f, "VersionBump"),
            Upgrade::Migrate(migration) => {
                write!(f, "Migrate({:p})", Arc::as_ptr(migration) as *const ())
            }
        }
    }
}
