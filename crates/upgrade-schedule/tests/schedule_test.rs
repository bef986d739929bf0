use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use upgrade_schedule::{
    instantaneous_network_version, latest_actors_at, network_upgrade_at, sdr_upgrade_at,
    CanonicalSchedule, ChainEpoch, ConfigError, ExecMonitor, Migration, MigrationCache,
    MigrationCancelled, MigrationContext, MigrationEnv, NetworkVersion, StateManager, StateRoot,
    TipSet, Upgrade, UpgradeEntry, UpgradeMigrations,
};

#[derive(Debug, thiserror::Error)]
#[error("actors migration {0} failed")]
struct ActorsMigrationError(u8);

/// Stores states in memory, keyed by a root derived from the content.
#[derive(Default)]
struct MemoryStateManager {
    states: Mutex<Vec<(StateRoot, Vec<u8>)>>,
}

impl StateManager for MemoryStateManager {
    fn get_state(&self, root: &StateRoot) -> anyhow::Result<Option<Vec<u8>>> {
        let states = self.states.lock().unwrap();
        Ok(states
            .iter()
            .find(|(r, _)| r == root)
            .map(|(_, data)| data.clone()))
    }

    fn put_state(&self, data: &[u8]) -> anyhow::Result<StateRoot> {
        // Keep the trailing 32 bytes so the migration trail stays visible
        let mut root = [0u8; 32];
        let tail = &data[data.len().saturating_sub(32)..];
        root[32 - tail.len()..].copy_from_slice(tail);
        let root = StateRoot::new(root);
        self.states.lock().unwrap().push((root, data.to_vec()));
        Ok(root)
    }
}

/// Appends its tag to the state and records the call.
struct TagMigration {
    tag: u8,
    calls: Arc<Mutex<Vec<(u8, StateRoot, ChainEpoch)>>>,
    fail: bool,
}

#[async_trait]
impl Migration for TagMigration {
    async fn migrate(
        &self,
        _ctx: &MigrationContext,
        env: &MigrationEnv<'_>,
        old_state: StateRoot,
        height: ChainEpoch,
        _tipset: &TipSet,
    ) -> anyhow::Result<StateRoot> {
        self.calls.lock().unwrap().push((self.tag, old_state, height));
        if self.fail {
            return Err(ActorsMigrationError(self.tag).into());
        }
        let mut data = old_state.as_bytes().to_vec();
        data.push(self.tag);
        let root = env.state_manager.put_state(&data)?;
        env.cache.write(format!("migration-{}", self.tag), root);
        if let Some(monitor) = env.monitor {
            monitor.message_applied(height, &[self.tag], &root)?;
        }
        Ok(root)
    }
}

/// Records every applied message with the state it produced.
#[derive(Default)]
struct RecordingMonitor {
    applied: Mutex<Vec<(ChainEpoch, Vec<u8>, StateRoot)>>,
}

impl ExecMonitor for RecordingMonitor {
    fn message_applied(
        &self,
        height: ChainEpoch,
        message: &[u8],
        state: &StateRoot,
    ) -> anyhow::Result<()> {
        self.applied
            .lock()
            .unwrap()
            .push((height, message.to_vec(), *state));
        Ok(())
    }
}

/// Cancels the shared token once it has run.
struct CancellingMigration {
    token: CancellationToken,
    inner: TagMigration,
}

#[async_trait]
impl Migration for CancellingMigration {
    async fn migrate(
        &self,
        ctx: &MigrationContext,
        env: &MigrationEnv<'_>,
        old_state: StateRoot,
        height: ChainEpoch,
        tipset: &TipSet,
    ) -> anyhow::Result<StateRoot> {
        let state = self.inner.migrate(ctx, env, old_state, height, tipset).await?;
        self.token.cancel();
        Ok(state)
    }
}

struct Fixture {
    calls: Arc<Mutex<Vec<(u8, StateRoot, ChainEpoch)>>>,
    failing: Option<u8>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failing: None,
        }
    }

    fn failing_at(tag: u8) -> Self {
        Self {
            failing: Some(tag),
            ..Self::new()
        }
    }

    fn migration(&self, tag: u8) -> Arc<dyn Migration> {
        Arc::new(TagMigration {
            tag,
            calls: self.calls.clone(),
            fail: self.failing == Some(tag),
        })
    }

    fn called(&self) -> Vec<u8> {
        self.calls.lock().unwrap().iter().map(|c| c.0).collect()
    }
}

impl UpgradeMigrations for Fixture {
    fn upgrade_actors_v2(&self) -> Arc<dyn Migration> {
        self.migration(2)
    }
    fn upgrade_actors_v3(&self) -> Arc<dyn Migration> {
        self.migration(3)
    }
    fn upgrade_actors_v4(&self) -> Arc<dyn Migration> {
        self.migration(4)
    }
    fn upgrade_actors_v5(&self) -> Arc<dyn Migration> {
        self.migration(5)
    }
    fn upgrade_calico(&self) -> Arc<dyn Migration> {
        self.migration(7)
    }
}

fn heights(entries: &[UpgradeEntry]) -> Vec<(NetworkVersion, ChainEpoch)> {
    entries.iter().map(|u| (u.network, u.height)).collect()
}

async fn run_schedule_at_height_one(
    schedule: &upgrade_schedule::UpgradeSchedule,
    ctx: &MigrationContext,
    old_state: StateRoot,
) -> anyhow::Result<StateRoot> {
    let state_manager = MemoryStateManager::default();
    let cache = MigrationCache::new();
    let env = MigrationEnv::new(&state_manager, &cache);
    let tipset = TipSet::new(0, old_state);

    let upgrade = schedule.upgrade_at(1).expect("upgrade at height 1");
    let migration = upgrade.migration.migration().expect("composed migration");
    migration.migrate(ctx, &env, old_state, 1, &tipset).await
}

#[test]
fn test_default_test_schedule() {
    let fixture = Fixture::new();
    let canonical = CanonicalSchedule::default_test(&fixture).unwrap();

    assert_eq!(
        heights(canonical.entries()),
        vec![
            (NetworkVersion::V9, 1),
            (NetworkVersion::V10, 2),
            (NetworkVersion::V12, 3),
            (NetworkVersion::V13, 4),
        ]
    );
    assert!(canonical
        .entries()
        .iter()
        .all(|u| !u.migration.is_version_bump()));
    assert_eq!(canonical.newest_version(), NetworkVersion::V13);
}

#[test]
fn test_truncate_length_matches_canonical_prefix() {
    let fixture = Fixture::new();
    let canonical = CanonicalSchedule::default_test(&fixture).unwrap();

    for upgrade in canonical.entries() {
        let schedule = network_upgrade_at(&canonical, upgrade.network, None).unwrap();
        let expected = canonical
            .entries()
            .iter()
            .filter(|u| u.network <= upgrade.network)
            .count();
        assert_eq!(schedule.len(), expected);
        assert_eq!(schedule.last().network, upgrade.network);
        assert_eq!(schedule.last().height, upgrade.height);
    }
}

#[test]
fn test_truncate_scenario() {
    let fixture = Fixture::new();
    let canonical = CanonicalSchedule::default_test(&fixture).unwrap();

    let schedule = network_upgrade_at(&canonical, NetworkVersion::V10, None).unwrap();
    assert_eq!(
        heights(&schedule),
        vec![(NetworkVersion::V9, 1), (NetworkVersion::V10, 2)]
    );

    let schedule = network_upgrade_at(&canonical, NetworkVersion::V10, Some(5)).unwrap();
    assert_eq!(
        heights(&schedule),
        vec![(NetworkVersion::V9, 1), (NetworkVersion::V10, 5)]
    );

    // Entries share the canonical migrations
    let derived = schedule.entries()[1].migration.migration().unwrap();
    let source = canonical.entries()[1].migration.migration().unwrap();
    assert!(Arc::ptr_eq(derived, source));

    assert_eq!(
        network_upgrade_at(&canonical, NetworkVersion::V10, Some(1)).unwrap_err(),
        ConfigError::HeightBelowFloor {
            version: NetworkVersion::V10,
            height: 1,
            minimum: 2,
        }
    );
}

#[test]
fn test_derivations_leave_canonical_untouched() {
    let fixture = Fixture::new();
    let canonical = CanonicalSchedule::default_test(&fixture).unwrap();
    let before = heights(canonical.entries());

    network_upgrade_at(&canonical, NetworkVersion::V12, Some(100)).unwrap();
    latest_actors_at(&canonical, 200).unwrap();
    assert!(network_upgrade_at(&canonical, NetworkVersion::V10, Some(1)).is_err());
    instantaneous_network_version(&canonical, NetworkVersion::V13);

    assert_eq!(heights(canonical.entries()), before);
}

#[test]
fn test_truncate_failures() {
    let fixture = Fixture::new();
    let canonical = CanonicalSchedule::default_test(&fixture).unwrap();

    assert!(matches!(
        network_upgrade_at(&canonical, NetworkVersion::V11, None),
        Err(ConfigError::VersionNotFound { .. })
    ));
    assert!(matches!(
        network_upgrade_at(&canonical, NetworkVersion::new(14), None),
        Err(ConfigError::VersionNotFound { .. })
    ));
    assert_eq!(
        network_upgrade_at(&canonical, NetworkVersion::V6, Some(10)).unwrap_err(),
        ConfigError::EmptySchedule
    );
}

#[test]
fn test_latest_actors_at() {
    let fixture = Fixture::new();
    let canonical = CanonicalSchedule::default_test(&fixture).unwrap();

    let schedule = latest_actors_at(&canonical, 20).unwrap();
    assert_eq!(schedule.len(), 4);
    assert_eq!(schedule.last().network, NetworkVersion::V13);
    assert_eq!(schedule.last().height, 20);
    assert_eq!(schedule.network_version_at(19), Some(NetworkVersion::V12));
    assert_eq!(schedule.network_version_at(20), Some(NetworkVersion::V13));
}

#[test]
fn test_sdr_upgrade_at() {
    let fixture = Fixture::new();
    let schedule = sdr_upgrade_at(&fixture, 10, 20);

    assert_eq!(
        heights(&schedule),
        vec![
            (NetworkVersion::V6, 1),
            (NetworkVersion::V7, 10),
            (NetworkVersion::V8, 20),
        ]
    );
    assert!(!schedule.entries()[0].migration.is_version_bump());
    assert!(!schedule.entries()[1].migration.is_version_bump());
    assert!(schedule.entries()[2].migration.is_version_bump());

    // Heights are the caller's responsibility
    let schedule = sdr_upgrade_at(&fixture, 30, 20);
    assert_eq!(schedule.len(), 3);
}

#[tokio::test]
async fn test_instantaneous_network_version_scenario() {
    let fixture = Fixture::new();
    let canonical = CanonicalSchedule::default_test(&fixture).unwrap();

    let schedule = instantaneous_network_version(&canonical, NetworkVersion::V12);
    assert_eq!(heights(&schedule), vec![(NetworkVersion::V12, 1)]);

    let old_state = StateRoot::new([0xaa; 32]);
    let new_state = run_schedule_at_height_one(&schedule, &MigrationContext::default(), old_state)
        .await
        .unwrap();

    // v2, v3 and v4 run in order, v5 never does
    assert_eq!(fixture.called(), vec![2, 3, 4]);
    assert_eq!(&new_state.as_bytes()[29..], &[2, 3, 4]);

    // Each step consumes the previous step's output at height 1
    let calls = fixture.calls.lock().unwrap().clone();
    assert_eq!(calls[0].1, old_state);
    assert_eq!(calls[1].1.as_bytes()[31], 2);
    assert_eq!(calls[2].1.as_bytes()[31], 3);
    assert!(calls.iter().all(|c| c.2 == 1));
}

#[tokio::test]
async fn test_instantaneous_network_version_shares_env_across_steps() {
    let fixture = Fixture::new();
    let canonical = CanonicalSchedule::default_test(&fixture).unwrap();
    let schedule = instantaneous_network_version(&canonical, NetworkVersion::V12);

    let state_manager = MemoryStateManager::default();
    let cache = MigrationCache::new();
    let monitor = RecordingMonitor::default();
    let env = MigrationEnv::new(&state_manager, &cache).with_monitor(&monitor);
    let old_state = StateRoot::new([0x11; 32]);
    let tipset = TipSet::new(0, old_state);

    let migration = schedule.last().migration.migration().unwrap();
    let new_state = migration
        .migrate(&MigrationContext::default(), &env, old_state, 1, &tipset)
        .await
        .unwrap();

    // Every step reported to the one monitor, in order, at height 1
    let applied = monitor.applied.lock().unwrap().clone();
    assert_eq!(
        applied
            .iter()
            .map(|(height, message, _)| (*height, message.clone()))
            .collect::<Vec<_>>(),
        vec![(1, vec![2]), (1, vec![3]), (1, vec![4])]
    );
    assert_eq!(applied[2].2, new_state);

    // And wrote to the one cache
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.read("migration-2"), Some(applied[0].2));
    assert_eq!(cache.read("migration-3"), Some(applied[1].2));
    assert_eq!(cache.read("migration-4"), Some(new_state));
    assert_eq!(cache.read("migration-5"), None);

    assert_eq!(
        state_manager.get_state(&new_state).unwrap().map(|data| data[32]),
        Some(4)
    );
}

#[tokio::test]
async fn test_instantaneous_network_version_skips_version_bumps() {
    let fixture = Fixture::new();
    let canonical = CanonicalSchedule::new(vec![
        UpgradeEntry::new(NetworkVersion::V9, 1, Upgrade::Migrate(fixture.migration(2))),
        UpgradeEntry::version_bump(NetworkVersion::V10, 2),
        UpgradeEntry::new(NetworkVersion::V12, 3, Upgrade::Migrate(fixture.migration(4))),
    ])
    .unwrap();

    let schedule = instantaneous_network_version(&canonical, NetworkVersion::V13);
    run_schedule_at_height_one(&schedule, &MigrationContext::default(), StateRoot::default())
        .await
        .unwrap();

    assert_eq!(fixture.called(), vec![2, 4]);
}

#[tokio::test]
async fn test_instantaneous_network_version_stops_at_first_failure() {
    let fixture = Fixture::failing_at(3);
    let canonical = CanonicalSchedule::default_test(&fixture).unwrap();

    let schedule = instantaneous_network_version(&canonical, NetworkVersion::V13);
    let err = run_schedule_at_height_one(&schedule, &MigrationContext::default(), StateRoot::default())
        .await
        .unwrap_err();

    // The migration's own error comes back unchanged
    let cause = err.downcast_ref::<ActorsMigrationError>().unwrap();
    assert_eq!(cause.0, 3);
    assert_eq!(err.to_string(), "actors migration 3 failed");
    assert_eq!(fixture.called(), vec![2, 3]);
}

#[tokio::test]
async fn test_instantaneous_network_version_cancelled() {
    let fixture = Fixture::new();
    let token = CancellationToken::new();
    let canonical = CanonicalSchedule::new(vec![
        UpgradeEntry::new(
            NetworkVersion::V9,
            1,
            Upgrade::migrate(CancellingMigration {
                token: token.clone(),
                inner: TagMigration {
                    tag: 2,
                    calls: fixture.calls.clone(),
                    fail: false,
                },
            }),
        ),
        UpgradeEntry::new(NetworkVersion::V10, 2, Upgrade::Migrate(fixture.migration(3))),
    ])
    .unwrap();

    let schedule = instantaneous_network_version(&canonical, NetworkVersion::V10);
    let ctx = MigrationContext::new(token);
    let err = run_schedule_at_height_one(&schedule, &ctx, StateRoot::default())
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<MigrationCancelled>(),
        Some(&MigrationCancelled {
            next: NetworkVersion::V10,
            completed: 1,
        })
    );
    assert_eq!(fixture.called(), vec![2]);
}
