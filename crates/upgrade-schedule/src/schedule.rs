//! Upgrade entries and schedules

use crate::{
    error::Result,
    migration::Upgrade,
    validate,
    version::{ChainEpoch, NetworkVersion},
};
use std::ops::Deref;

/// A network version activating at a height, with its state migration
#[derive(Debug, Clone)]
pub struct UpgradeEntry {
    pub network: NetworkVersion,
    pub height: ChainEpoch,
    pub migration: Upgrade,
}

impl UpgradeEntry {
    pub fn new(network: NetworkVersion, height: ChainEpoch, migration: Upgrade) -> Self {
        Self {
            network,
            height,
            migration,
        }
    }

    /// Version bump with no state migration
    pub fn version_bump(network: NetworkVersion, height: ChainEpoch) -> Self {
        Self::new(network, height, Upgrade::VersionBump)
    }
}

/// Ordered upgrade activations governing a node's protocol transitions.
///
/// Never empty, versions strictly ascending.
#[derive(Debug, Clone)]
pub struct UpgradeSchedule(Vec<UpgradeEntry>);

impl UpgradeSchedule {
    /// Build a schedule from hand-specified entries.
    ///
    /// Only checks that the schedule is non-empty with strictly ascending
    /// versions; activation heights are the caller's responsibility.
    pub fn new(entries: Vec<UpgradeEntry>) -> Result<Self> {
        validate::non_empty(&entries)?;
        validate::versions_ascending(&entries)?;
        Ok(Self(entries))
    }

    /// Wrap entries already known to satisfy the schedule invariants.
    pub(crate) fn from_ordered(entries: Vec<UpgradeEntry>) -> Self {
        debug_assert!(validate::non_empty(&entries).is_ok());
        debug_assert!(validate::versions_ascending(&entries).is_ok());
        Self(entries)
    }

    pub fn entries(&self) -> &[UpgradeEntry] {
        &self.0
    }

    pub fn into_entries(self) -> Vec<UpgradeEntry> {
        self.0
    }

    /// The final upgrade, the version the node ends up running
    pub fn last(&self) -> &UpgradeEntry {
        // Non-empty by construction
        &self.0[self.0.len() - 1]
    }

    pub fn versions(&self) -> Vec<NetworkVersion> {
        self.0.iter().map(|u| u.network).collect()
    }

    /// Network version in force at `height`, `None` before the first activation.
    ///
    /// Upgrades activate in schedule order: an entry whose height is not yet
    /// reached holds back every later entry, even one with a lower height.
    pub fn network_version_at(&self, height: ChainEpoch) -> Option<NetworkVersion> {
        self.0
            .iter()
            .take_while(|u| u.height <= height)
            .last()
            .map(|u| u.network)
    }

    /// The upgrade activating exactly at `height`, if any.
    ///
    /// When several versions share a height the newest one is returned.
    pub fn upgrade_at(&self, height: ChainEpoch) -> Option<&UpgradeEntry> {
        self.0.iter().rev().find(|u| u.height == height)
    }
}

impl Deref for UpgradeSchedule {
    type Target = [UpgradeEntry];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a UpgradeSchedule {
    type Item = &'a UpgradeEntry;
    type IntoIter = std::slice::Iter<'a, UpgradeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
