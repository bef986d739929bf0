// Environment variables selecting the upgrade schedule a node starts with
pub const ENV_SCHEDULE_PROFILE: &str = "UPGRADE_SCHEDULE_PROFILE";
pub const ENV_NETWORK_VERSION: &str = "UPGRADE_NETWORK_VERSION";
pub const ENV_UPGRADE_HEIGHT: &str = "UPGRADE_HEIGHT";
pub const ENV_CALICO_HEIGHT: &str = "UPGRADE_CALICO_HEIGHT";
pub const ENV_PERSIAN_HEIGHT: &str = "UPGRADE_PERSIAN_HEIGHT";

// Profile names
pub const PROFILE_DEFAULT_NAME: &str = "default";
pub const PROFILE_NETWORK_UPGRADE_AT_NAME: &str = "network-upgrade-at";
pub const PROFILE_NETWORK_UPGRADE_AT_SHORT_NAME: &str = "nv";
pub const PROFILE_LATEST_ACTORS_AT_NAME: &str = "latest-actors-at";
pub const PROFILE_LATEST_ACTORS_AT_SHORT_NAME: &str = "latest";
pub const PROFILE_INSTANTANEOUS_NAME: &str = "instantaneous";
pub const PROFILE_INSTANTANEOUS_SHORT_NAME: &str = "instant";
pub const PROFILE_SDR_UPGRADE_AT_NAME: &str = "sdr-upgrade-at";
pub const PROFILE_SDR_UPGRADE_AT_SHORT_NAME: &str = "sdr";
