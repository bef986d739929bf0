//! Chain state handles shared with migrations

use crate::version::ChainEpoch;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Content address of a state tree root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StateRoot(pub [u8; 32]);

impl StateRoot {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for StateRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Chain head snapshot handed to migrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipSet {
    pub height: ChainEpoch,
    pub parent_state: StateRoot,
}

impl TipSet {
    pub fn new(height: ChainEpoch, parent_state: StateRoot) -> Self {
        Self {
            height,
            parent_state,
        }
    }
}

/// Access to the state store, provided by the executor.
pub trait StateManager: Send + Sync {
    /// Load the serialized state stored under `root`.
    fn get_state(&self, root: &StateRoot) -> anyhow::Result<Option<Vec<u8>>>;

    /// Store a serialized state and return its root.
    fn put_state(&self, data: &[u8]) -> anyhow::Result<StateRoot>;
}

/// Receives execution traces from migrations that run messages.
pub trait ExecMonitor: Send + Sync {
    fn message_applied(
        &self,
        height: ChainEpoch,
        message: &[u8],
        state: &StateRoot,
    ) -> anyhow::Result<()>;
}

/// Cache of intermediate migration results, shared across migrations of one run.
#[derive(Debug, Clone, Default)]
pub struct MigrationCache {
    entries: Arc<DashMap<String, StateRoot>>,
}

impl MigrationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, key: &str) -> Option<StateRoot> {
        self.entries.get(key).map(|root| *root)
    }

    pub fn write(&self, key: impl Into<String>, root: StateRoot) {
        self.entries.insert(key.into(), root);
    }

    /// Return the cached root for `key`, computing and caching it on a miss.
    pub fn load(
        &self,
        key: &str,
        loader: impl FnOnce() -> anyhow::Result<StateRoot>,
    ) -> anyhow::Result<StateRoot> {
        if let Some(root) = self.read(key) {
            return Ok(root);
        }
        let root = loader()?;
        self.write(key, root);
        Ok(root)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
