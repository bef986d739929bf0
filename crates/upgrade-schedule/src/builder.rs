//! Schedules derived from the canonical upgrade list

use crate::{
    canonical::{CanonicalSchedule, UpgradeMigrations},
    error::{ConfigError, Result},
    migration::Upgrade,
    schedule::{UpgradeEntry, UpgradeSchedule},
    validate,
    version::{ChainEpoch, NetworkVersion},
};
use tracing::{info, warn};

/// Run every canonical upgrade up to and including `version`.
///
/// With `upgrade_height` set (and non-zero), `version` activates at that
/// height instead of its canonical one. The height may only be raised: the
/// upgrades before it are sequential and already assume the canonical height.
pub fn network_upgrade_at(
    canonical: &CanonicalSchedule,
    version: NetworkVersion,
    upgrade_height: Option<ChainEpoch>,
) -> Result<UpgradeSchedule> {
    let mut entries: Vec<UpgradeEntry> = canonical.up_to(version).cloned().collect();

    validate::non_empty(&entries)?;
    validate::target_present(&entries, version)?;

    if let Some(height) = upgrade_height.filter(|h| *h > 0) {
        // Only the freshly copied entry is touched, never the canonical one
        let target = entries.last_mut().ok_or(ConfigError::EmptySchedule)?;
        validate::height_floor(version, height, target.height)?;
        target.height = height;
    }

    let schedule = UpgradeSchedule::from_ordered(entries);
    info!(
        "Built upgrade schedule to version {} at height {} ({} upgrades)",
        version,
        schedule.last().height,
        schedule.len()
    );
    Ok(schedule)
}

/// Run every canonical upgrade, with the newest one activating at `upgrade_height`.
pub fn latest_actors_at(
    canonical: &CanonicalSchedule,
    upgrade_height: ChainEpoch,
) -> Result<UpgradeSchedule> {
    network_upgrade_at(canonical, canonical.newest_version(), Some(upgrade_height))
}

/// Hand-built schedule around the calico and persian upgrades.
///
/// Actors v2 runs at height 1, the calico migration (version 7) at `calico`,
/// and version 8 is a plain version bump at `persian`. Heights are taken as
/// given.
pub fn sdr_upgrade_at(
    migrations: &dyn UpgradeMigrations,
    calico: ChainEpoch,
    persian: ChainEpoch,
) -> UpgradeSchedule {
    if persian < calico {
        warn!(
            "Persian upgrade height {} is below calico upgrade height {}",
            persian, calico
        );
    }

    UpgradeSchedule::from_ordered(vec![
        UpgradeEntry::new(
            NetworkVersion::V6,
            1,
            Upgrade::Migrate(migrations.upgrade_actors_v2()),
        ),
        UpgradeEntry::new(
            NetworkVersion::V7,
            calico,
            Upgrade::Migrate(migrations.upgrade_calico()),
        ),
        UpgradeEntry::version_bump(NetworkVersion::V8, persian),
    ])
}
