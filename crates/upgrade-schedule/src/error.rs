//! Error types for schedule construction and composed migrations

use crate::version::{ChainEpoch, NetworkVersion};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Schedule misconfiguration, detected before any block is processed.
///
/// These are never retried: the process configuring the node is expected to
/// abort with the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("empty upgrade schedule")]
    EmptySchedule,

    #[error("failed to upgrade to target version {target}, last version is {last}")]
    VersionNotFound {
        target: NetworkVersion,
        last: NetworkVersion,
    },

    #[error("target upgrade height {height} for version {version} less than minimum {minimum}")]
    HeightBelowFloor {
        version: NetworkVersion,
        height: ChainEpoch,
        minimum: ChainEpoch,
    },

    #[error("upgrade versions out of order: {next} follows {previous}")]
    UnorderedVersions {
        previous: NetworkVersion,
        next: NetworkVersion,
    },

    #[error(
        "upgrade heights out of order: version {version} activates at {height}, before {previous_height}"
    )]
    UnorderedHeights {
        version: NetworkVersion,
        height: ChainEpoch,
        previous_height: ChainEpoch,
    },
}

/// Returned by a composed migration when its context is cancelled between steps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("migration to version {next} cancelled after {completed} completed steps")]
pub struct MigrationCancelled {
    pub next: NetworkVersion,
    pub completed: usize,
}
