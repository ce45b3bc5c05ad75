//! Reconciliation of the local cache with the remote repository.
//!
//! [`SyncEngine`] is the narrow seam between the snippet store and the
//! version-control transport. [`GitSync`] drives the real `git` binary;
//! [`FakeSync`] keeps the remote in memory for tests.

mod fake;
mod git;

pub use fake::{FakeRemote, FakeSync};
pub use git::GitSync;

use crate::Result;
use std::ops::Add;
use std::path::Path;
use thiserror::Error as ThisError;

/// Why a pull or push could not complete.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SyncFailure {
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    #[error(
        "local cache has diverged from the remote ({ahead} local commit(s) not upstream, {behind} remote commit(s) not local)"
    )]
    Diverged { ahead: usize, behind: usize },

    /// The remote refused the push, usually because it advanced.
    #[error("push rejected: {0}")]
    Rejected(String),

    #[error("transport timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Counts reported by a sync step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Changes brought into the cache.
    pub pulled: usize,
    /// Changes published to the remote.
    pub pushed: usize,
}

impl Add for SyncStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            pulled: self.pulled + rhs.pulled,
            pushed: self.pushed + rhs.pushed,
        }
    }
}

/// Keeps a cache directory eventually consistent with one remote.
pub trait SyncEngine {
    /// Root of the cache directory this engine mirrors into.
    fn root(&self) -> &Path;

    /// Makes the cache root ready to receive local changes.
    ///
    /// Called before the first mutation of an operation, so the transport
    /// never finds files it did not put there.
    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    /// Fast-forwards the cache to the remote's current state.
    ///
    /// Calling it again with no remote change is a no-op. Fails with
    /// [`SyncFailure::Diverged`] instead of discarding local work.
    fn pull(&mut self) -> Result<SyncStats>;

    /// Records pending cache changes under `message` and publishes them.
    ///
    /// A no-op when nothing is pending. A rejected push must be followed by a
    /// `pull` before retrying.
    fn push(&mut self, message: &str) -> Result<SyncStats>;
}
