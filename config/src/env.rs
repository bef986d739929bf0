use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use upgrade_schedule::{
    instantaneous_network_version, latest_actors_at, network_upgrade_at, sdr_upgrade_at,
    CanonicalSchedule, ChainEpoch, NetworkVersion, UpgradeMigrations, UpgradeSchedule,
};

use crate::constants::*;

/// Which upgrade schedule a node is started with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "profile", rename_all = "kebab-case")]
pub enum ScheduleProfile {
    /// The canonical schedule as is
    #[default]
    Default,
    /// Canonical upgrades up to `version`, optionally activating it later
    NetworkUpgradeAt {
        version: NetworkVersion,
        #[serde(default)]
        height: Option<ChainEpoch>,
    },
    /// Every canonical upgrade, the newest one activating at `height`
    LatestActorsAt { height: ChainEpoch },
    /// Start at `version` from height 1
    Instantaneous { version: NetworkVersion },
    /// Calico and persian upgrades at custom heights
    SdrUpgradeAt {
        calico: ChainEpoch,
        persian: ChainEpoch,
    },
}

impl fmt::Display for ScheduleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleProfile::Default => write!(f, "{PROFILE_DEFAULT_NAME}"),
            ScheduleProfile::NetworkUpgradeAt {
                version,
                height: Some(height),
            } => write!(
                f,
                "{PROFILE_NETWORK_UPGRADE_AT_NAME} (version {version}, height {height})"
            ),
            ScheduleProfile::NetworkUpgradeAt {
                version,
                height: None,
            } => write!(f, "{PROFILE_NETWORK_UPGRADE_AT_NAME} (version {version})"),
            ScheduleProfile::LatestActorsAt { height } => {
                write!(f, "{PROFILE_LATEST_ACTORS_AT_NAME} (height {height})")
            }
            ScheduleProfile::Instantaneous { version } => {
                write!(f, "{PROFILE_INSTANTANEOUS_NAME} (version {version})")
            }
            ScheduleProfile::SdrUpgradeAt { calico, persian } => write!(
                f,
                "{PROFILE_SDR_UPGRADE_AT_NAME} (calico {calico}, persian {persian})"
            ),
        }
    }
}

/// Profile name, without its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileKind {
    Default,
    NetworkUpgradeAt,
    LatestActorsAt,
    Instantaneous,
    SdrUpgradeAt,
}

impl FromStr for ProfileKind {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PROFILE_DEFAULT_NAME => Ok(ProfileKind::Default),
            PROFILE_NETWORK_UPGRADE_AT_NAME | PROFILE_NETWORK_UPGRADE_AT_SHORT_NAME => {
                Ok(ProfileKind::NetworkUpgradeAt)
            }
            PROFILE_LATEST_ACTORS_AT_NAME | PROFILE_LATEST_ACTORS_AT_SHORT_NAME => {
                Ok(ProfileKind::LatestActorsAt)
            }
            PROFILE_INSTANTANEOUS_NAME | PROFILE_INSTANTANEOUS_SHORT_NAME => {
                Ok(ProfileKind::Instantaneous)
            }
            PROFILE_SDR_UPGRADE_AT_NAME | PROFILE_SDR_UPGRADE_AT_SHORT_NAME => {
                Ok(ProfileKind::SdrUpgradeAt)
            }
            _ => Err(eyre::eyre!(
                "Invalid upgrade schedule profile {s}, must be one of: {PROFILE_DEFAULT_NAME}, {PROFILE_NETWORK_UPGRADE_AT_NAME}, {PROFILE_LATEST_ACTORS_AT_NAME}, {PROFILE_INSTANTANEOUS_NAME}, {PROFILE_SDR_UPGRADE_AT_NAME}",
            )),
        }
    }
}

impl FromStr for ScheduleProfile {
    type Err = eyre::Report;

    /// Parses `<profile>[:<parameters>]`, e.g. `default`, `nv:12`, `nv:12@5`,
    /// `latest:20`, `instant:13` or `sdr:10,20`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, params) = match s.split_once(':') {
            Some((name, params)) => (name.trim(), Some(params.trim())),
            None => (s.trim(), None),
        };

        match (name.parse::<ProfileKind>()?, params) {
            (ProfileKind::Default, None) => Ok(ScheduleProfile::Default),
            (ProfileKind::Default, Some(params)) => Err(eyre::eyre!(
                "Profile {name} takes no parameters, got {params}"
            )),
            (_, None) => Err(eyre::eyre!("Profile {name} requires parameters")),
            (ProfileKind::NetworkUpgradeAt, Some(params)) => {
                let (version, height) = match params.split_once('@') {
                    Some((version, height)) => (version, Some(height)),
                    None => (params, None),
                };
                Ok(ScheduleProfile::NetworkUpgradeAt {
                    version: param(version, "version")?,
                    height: height.map(|h| param(h, "height")).transpose()?,
                })
            }
            (ProfileKind::LatestActorsAt, Some(params)) => Ok(ScheduleProfile::LatestActorsAt {
                height: param(params, "height")?,
            }),
            (ProfileKind::Instantaneous, Some(params)) => Ok(ScheduleProfile::Instantaneous {
                version: param(params, "version")?,
            }),
            (ProfileKind::SdrUpgradeAt, Some(params)) => {
                let (calico, persian) = params.split_once(',').ok_or_else(|| {
                    eyre::eyre!("Profile {name} expects <calico>,<persian>, got {params}")
                })?;
                Ok(ScheduleProfile::SdrUpgradeAt {
                    calico: param(calico, "calico height")?,
                    persian: param(persian, "persian height")?,
                })
            }
        }
    }
}

impl ScheduleProfile {
    /// Read the profile from the environment.
    ///
    /// Without `UPGRADE_SCHEDULE_PROFILE` the canonical schedule is used. A
    /// profile given with its parameters (`nv:12@5`) is parsed as is, a bare
    /// name takes its parameters from the other `UPGRADE_*` variables.
    pub fn from_env() -> eyre::Result<ScheduleProfile> {
        let Some(value) = var(ENV_SCHEDULE_PROFILE) else {
            return Ok(ScheduleProfile::Default);
        };
        if value.contains(':') {
            return value.parse();
        }

        match value.trim().parse::<ProfileKind>()? {
            ProfileKind::Default => Ok(ScheduleProfile::Default),
            ProfileKind::NetworkUpgradeAt => Ok(ScheduleProfile::NetworkUpgradeAt {
                version: required(ENV_NETWORK_VERSION)?,
                height: optional(ENV_UPGRADE_HEIGHT)?,
            }),
            ProfileKind::LatestActorsAt => Ok(ScheduleProfile::LatestActorsAt {
                height: required(ENV_UPGRADE_HEIGHT)?,
            }),
            ProfileKind::Instantaneous => Ok(ScheduleProfile::Instantaneous {
                version: required(ENV_NETWORK_VERSION)?,
            }),
            ProfileKind::SdrUpgradeAt => Ok(ScheduleProfile::SdrUpgradeAt {
                calico: required(ENV_CALICO_HEIGHT)?,
                persian: required(ENV_PERSIAN_HEIGHT)?,
            }),
        }
    }

    /// Build the schedule this profile describes from the canonical one.
    pub fn build(
        &self,
        canonical: &CanonicalSchedule,
        migrations: &dyn UpgradeMigrations,
    ) -> eyre::Result<UpgradeSchedule> {
        let schedule = match *self {
            ScheduleProfile::Default => canonical.to_schedule(),
            ScheduleProfile::NetworkUpgradeAt { version, height } => {
                network_upgrade_at(canonical, version, height)
                    .wrap_err_with(|| format!("Invalid upgrade schedule {self}"))?
            }
            ScheduleProfile::LatestActorsAt { height } => latest_actors_at(canonical, height)
                .wrap_err_with(|| format!("Invalid upgrade schedule {self}"))?,
            ScheduleProfile::Instantaneous { version } => {
                instantaneous_network_version(canonical, version)
            }
            ScheduleProfile::SdrUpgradeAt { calico, persian } => {
                sdr_upgrade_at(migrations, calico, persian)
            }
        };
        Ok(schedule)
    }
}

fn param<T>(value: &str, what: &str) -> eyre::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .wrap_err_with(|| format!("Invalid {what} {value}"))
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required<T>(name: &str) -> eyre::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional(name)?.ok_or_else(|| eyre::eyre!("Missing required environment variable {name}"))
}

fn optional<T>(name: &str) -> eyre::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .wrap_err_with(|| format!("Invalid value {value} for {name}"))
        })
        .transpose()
}
