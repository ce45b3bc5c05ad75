use super::{SyncEngine, SyncFailure, SyncStats};
use crate::storage::{LocalCache, SnippetId};
use crate::{Error, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

#[derive(Debug, Default)]
struct RemoteState {
    files: BTreeMap<SnippetId, String>,
    revision: u64,
    unreachable: bool,
    reject_pushes: bool,
}

/// An in-memory stand-in for the remote repository.
///
/// Clones share state, so several [`FakeSync`] caches can talk to one
/// remote and a test can change it behind their backs.
#[derive(Debug, Clone, Default)]
pub struct FakeRemote {
    state: Rc<RefCell<RemoteState>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a snippet as if another client had pushed it.
    pub fn put(&self, id: &SnippetId, body: &str) {
        let mut state = self.state.borrow_mut();
        state.files.insert(id.clone(), body.to_string());
        state.revision += 1;
    }

    pub fn get(&self, id: &SnippetId) -> Option<String> {
        self.state.borrow().files.get(id).cloned()
    }

    /// Number of accepted pushes so far.
    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.borrow_mut().unreachable = unreachable;
    }

    pub fn reject_pushes(&self, reject: bool) {
        self.state.borrow_mut().reject_pushes = reject;
    }
}

/// Sync engine backed by a [`FakeRemote`].
///
/// Tracks the remote revision the cache last matched. Cache edits made since
/// then count as unpublished local commits, so a remote change on top of them
/// is reported as a divergence, the way `git` would.
#[derive(Debug)]
pub struct FakeSync {
    cache: LocalCache,
    remote: FakeRemote,
    base_revision: u64,
    base: BTreeMap<SnippetId, String>,
}

impl FakeSync {
    pub fn new(root: impl AsRef<Path>, remote: FakeRemote) -> Self {
        Self {
            cache: LocalCache::new(root.as_ref()),
            remote,
            base_revision: 0,
            base: BTreeMap::new(),
        }
    }

    pub const fn remote(&self) -> &FakeRemote {
        &self.remote
    }

    fn snapshot(&self) -> Result<BTreeMap<SnippetId, String>> {
        self.cache
            .list(None)
            .map(|id| {
                let path = self.cache.path(&id);
                let bytes = fs::read(&path).map_err(|e| Error::io(&path, e))?;
                Ok((id, String::from_utf8_lossy(&bytes).into_owned()))
            })
            .collect()
    }
}

impl SyncEngine for FakeSync {
    fn root(&self) -> &Path {
        self.cache.root()
    }

    fn pull(&mut self) -> Result<SyncStats> {
        let local = self.snapshot()?;
        let state = self.remote.state.borrow();
        if state.unreachable {
            return Err(SyncFailure::Unreachable("fake remote is offline".to_string()).into());
        }

        let behind = state.revision - self.base_revision;
        if behind == 0 {
            return Ok(SyncStats::default());
        }

        let ahead = local
            .iter()
            .filter(|(id, body)| self.base.get(*id) != Some(*body))
            .count();
        if ahead > 0 {
            return Err(SyncFailure::Diverged {
                ahead,
                behind: usize::try_from(behind).unwrap_or(usize::MAX),
            }
            .into());
        }

        let mut pulled = 0;
        for (id, body) in &state.files {
            if local.get(id) != Some(body) {
                self.cache.write(id, body)?;
                pulled += 1;
            }
        }
        self.base_revision = state.revision;
        self.base = state.files.clone();
        Ok(SyncStats { pulled, pushed: 0 })
    }

    fn push(&mut self, message: &str) -> Result<SyncStats> {
        let local = self.snapshot()?;
        let mut state = self.remote.state.borrow_mut();
        if state.unreachable {
            return Err(SyncFailure::Unreachable("fake remote is offline".to_string()).into());
        }

        let pending: Vec<(SnippetId, String)> = local
            .into_iter()
            .filter(|(id, body)| state.files.get(id) != Some(body))
            .collect();
        if pending.is_empty() {
            return Ok(SyncStats::default());
        }
        if state.reject_pushes {
            return Err(SyncFailure::Rejected("push rejected by remote".to_string()).into());
        }
        if state.revision != self.base_revision {
            return Err(SyncFailure::Rejected("remote has advanced; pull first".to_string()).into());
        }

        tracing::debug!(message, changes = pending.len(), "pushing to fake remote");
        let pushed = pending.len();
        state.files.extend(pending);
        state.revision += 1;
        self.base_revision = state.revision;
        self.base = state.files.clone();
        Ok(SyncStats { pulled: 0, pushed })
    }
}
