//! Network version and chain epoch types

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Chain height at which an upgrade activates.
pub type ChainEpoch = u64;

/// Ruleset generation used to interpret chain state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NetworkVersion(u32);

impl NetworkVersion {
    pub const V0: Self = Self(0);
    pub const V1: Self = Self(1);
    pub const V2: Self = Self(2);
    pub const V3: Self = Self(3);
    pub const V4: Self = Self(4);
    pub const V5: Self = Self(5);
    pub const V6: Self = Self(6);
    pub const V7: Self = Self(7);
    pub const V8: Self = Self(8);
    pub const V9: Self = Self(9);
    pub const V10: Self = Self(10);
    pub const V11: Self = Self(11);
    pub const V12: Self = Self(12);
    pub const V13: Self = Self(13);

    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for NetworkVersion {
    fn from(version: u32) -> Self {
        Self(version)
    }
}

impl fmt::Display for NetworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NetworkVersion {
    type Err = std::num::ParseIntError;

    /// Accepts `13`, `v13` or `V13`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .unwrap_or(s);
        digits.trim().parse::<u32>().map(Self)
    }
}
