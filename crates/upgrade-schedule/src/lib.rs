//! Upgrade Schedule - network upgrade schedules for test and dev nodes
//!
//! Derives the upgrade schedules a node is started with from one canonical,
//! ascending list of network upgrades: truncated to a target version,
//! re-targeted to a new activation height, hand-built, or collapsed into a
//! single upgrade at height 1 that replays every migration up to a version.

pub mod builder;
pub mod canonical;
pub mod composer;
pub mod error;
pub mod migration;
pub mod schedule;
pub mod state;
pub mod validate;
pub mod version;

pub use builder::{latest_actors_at, network_upgrade_at, sdr_upgrade_at};
pub use canonical::{CanonicalSchedule, UpgradeMigrations};
pub use composer::{instantaneous_network_version, ComposedMigration};
pub use error::{ConfigError, MigrationCancelled, Result};
pub use migration::{Migration, MigrationContext, MigrationEnv, Upgrade};
pub use schedule::{UpgradeEntry, UpgradeSchedule};
pub use state::{ExecMonitor, MigrationCache, StateManager, StateRoot, TipSet};
pub use version::{ChainEpoch, NetworkVersion};
