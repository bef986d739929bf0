//! Predicates over candidate upgrade schedules

use crate::{
    error::{ConfigError, Result},
    schedule::UpgradeEntry,
    version::{ChainEpoch, NetworkVersion},
};

/// Fails with `EmptySchedule` when there are no entries.
pub fn non_empty(entries: &[UpgradeEntry]) -> Result<()> {
    if entries.is_empty() {
        return Err(ConfigError::EmptySchedule);
    }
    Ok(())
}

/// Fails with `VersionNotFound` unless the last entry activates `target`.
pub fn target_present(entries: &[UpgradeEntry], target: NetworkVersion) -> Result<()> {
    let last = entries.last().ok_or(ConfigError::EmptySchedule)?;
    if last.network != target {
        return Err(ConfigError::VersionNotFound {
            target,
            last: last.network,
        });
    }
    Ok(())
}

/// Fails with `HeightBelowFloor` when an override would activate `version`
/// earlier than its canonical height.
pub fn height_floor(version: NetworkVersion, height: ChainEpoch, floor: ChainEpoch) -> Result<()> {
    // Earlier entries already assume the canonical ordering
    if height < floor {
        return Err(ConfigError::HeightBelowFloor {
            version,
            height,
            minimum: floor,
        });
    }
    Ok(())
}

/// Fails with `UnorderedVersions` unless versions strictly ascend.
pub fn versions_ascending(entries: &[UpgradeEntry]) -> Result<()> {
    for pair in entries.windows(2) {
        if pair[1].network <= pair[0].network {
            return Err(ConfigError::UnorderedVersions {
                previous: pair[0].network,
                next: pair[1].network,
            });
        }
    }
    Ok(())
}

/// Fails with `UnorderedHeights` if a later version activates before an earlier one.
pub fn heights_non_decreasing(entries: &[UpgradeEntry]) -> Result<()> {
    for pair in entries.windows(2) {
        if pair[1].height < pair[0].height {
            return Err(ConfigError::UnorderedHeights {
                version: pair[1].network,
                height: pair[1].height,
                previous_height: pair[0].height,
            });
        }
    }
    Ok(())
}
