//! The canonical upgrade schedule every derived schedule is cut from

use crate::{
    error::Result,
    migration::{Migration, Upgrade},
    schedule::{UpgradeEntry, UpgradeSchedule},
    validate,
    version::NetworkVersion,
};
use std::sync::Arc;
use tracing::debug;

/// Concrete state migrations for the historical upgrades, supplied by the
/// state-transition executor.
pub trait UpgradeMigrations {
    fn upgrade_actors_v2(&self) -> Arc<dyn Migration>;
    fn upgrade_actors_v3(&self) -> Arc<dyn Migration>;
    fn upgrade_actors_v4(&self) -> Arc<dyn Migration>;
    fn upgrade_actors_v5(&self) -> Arc<dyn Migration>;
    fn upgrade_calico(&self) -> Arc<dyn Migration>;
}

/// Immutable, ascending reference list of upgrades.
///
/// Cloning shares the underlying entries; there is no mutable access.
#[derive(Debug, Clone)]
pub struct CanonicalSchedule {
    entries: Arc<[UpgradeEntry]>,
}

impl CanonicalSchedule {
    /// Build a canonical schedule, checking it is non-empty and ordered on
    /// both versions and heights.
    pub fn new(entries: Vec<UpgradeEntry>) -> Result<Self> {
        validate::non_empty(&entries)?;
        validate::versions_ascending(&entries)?;
        validate::heights_non_decreasing(&entries)?;

        debug!(
            "Canonical upgrade schedule with {} upgrades, newest version {}",
            entries.len(),
            entries[entries.len() - 1].network
        );

        Ok(Self {
            entries: entries.into(),
        })
    }

    /// Default test schedule: actors v2 through v5, one upgrade per height
    /// starting at 1.
    pub fn default_test(migrations: &dyn UpgradeMigrations) -> Result<Self> {
        Self::new(vec![
            UpgradeEntry::new(
                NetworkVersion::V9,
                1,
                Upgrade::Migrate(migrations.upgrade_actors_v2()),
            ),
            UpgradeEntry::new(
                NetworkVersion::V10,
                2,
                Upgrade::Migrate(migrations.upgrade_actors_v3()),
            ),
            UpgradeEntry::new(
                NetworkVersion::V12,
                3,
                Upgrade::Migrate(migrations.upgrade_actors_v4()),
            ),
            UpgradeEntry::new(
                NetworkVersion::V13,
                4,
                Upgrade::Migrate(migrations.upgrade_actors_v5()),
            ),
        ])
    }

    pub fn entries(&self) -> &[UpgradeEntry] {
        &self.entries
    }

    /// Entries up to and including `version`, in ascending order
    pub fn up_to(&self, version: NetworkVersion) -> impl Iterator<Item = &UpgradeEntry> {
        // Ascending order makes the first newer entry an exact cutoff
        self.entries.iter().take_while(move |u| u.network <= version)
    }

    pub fn newest_version(&self) -> NetworkVersion {
        self.entries[self.entries.len() - 1].network
    }

    pub fn contains(&self, version: NetworkVersion) -> bool {
        self.entries.iter().any(|u| u.network == version)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fresh copy of the whole canonical schedule
    pub fn to_schedule(&self) -> UpgradeSchedule {
        UpgradeSchedule::from_ordered(self.entries.to_vec())
    }
}
