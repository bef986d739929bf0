use mockall::automock;
use tracing::{error, info};
use upgrade_schedule::{CanonicalSchedule, UpgradeMigrations, UpgradeSchedule};

use crate::env::ScheduleProfile;

/// Node option that replaces the active upgrade schedule.
#[automock]
pub trait ScheduleOverride {
    fn override_upgrade_schedule(&mut self, schedule: UpgradeSchedule) -> eyre::Result<()>;
}

/// Build the schedule for `profile` and install it on the node.
///
/// Schedule errors are setup errors: callers abort on them.
pub fn install(
    profile: &ScheduleProfile,
    canonical: &CanonicalSchedule,
    migrations: &dyn UpgradeMigrations,
    node: &mut dyn ScheduleOverride,
) -> eyre::Result<()> {
    let schedule = profile.build(canonical, migrations).inspect_err(|e| {
        error!("Failed to build upgrade schedule {}: {:#}", profile, e);
    })?;

    info!(
        "Installing upgrade schedule {}: versions {:?}, final upgrade at height {}",
        profile,
        schedule
            .versions()
            .iter()
            .map(|v| v.as_u32())
            .collect::<Vec<_>>(),
        schedule.last().height
    );
    node.override_upgrade_schedule(schedule)
}
