use crate::config::Context;
use crate::storage::{LocalCache, Snippet, SnippetId};
use crate::sync::{SyncEngine, SyncStats};
use crate::{Error, Result};
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::instrument;

/// Where the last store operation ended up.
///
/// Every operation starts at `Idle` and syncs first or last. Writes go
/// `Succeeded` (local file written) → `Publishing` → `Published` or
/// `PublishFailed`. `PublishFailed` leaves the local change on disk for the
/// next `sync` to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Syncing,
    Succeeded,
    Failed,
    Publishing,
    Published,
    PublishFailed,
}

/// Freshness of the local cache within one invocation.
#[derive(Debug, Clone)]
pub struct CacheState {
    pub root_dir: PathBuf,
    pub last_synced: Option<SystemTime>,
}

/// One line of a snippet matching a search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: SnippetId,
    /// 1-based.
    pub line_number: usize,
    pub line: String,
}

/// Snippet operations layered on the local cache and a sync engine.
///
/// Reads pull before touching the cache. Writes change the cache, then push.
/// Only the current user's namespace may be written.
pub struct SnippetStore<S: SyncEngine> {
    context: Context,
    cache: LocalCache,
    sync: S,
    state: CacheState,
    phase: Phase,
}

impl<S: SyncEngine> SnippetStore<S> {
    pub fn open(context: Context, sync: S) -> Self {
        let root = sync.root().to_path_buf();
        Self {
            context,
            cache: LocalCache::new(root.clone()),
            sync,
            state: CacheState {
                root_dir: root,
                last_synced: None,
            },
            phase: Phase::Idle,
        }
    }

    pub const fn context(&self) -> &Context {
        &self.context
    }

    pub fn current_user(&self) -> &str {
        self.context.current_user()
    }

    pub const fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub const fn cache_state(&self) -> &CacheState {
        &self.state
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn sync_engine(&self) -> &S {
        &self.sync
    }

    pub fn sync_engine_mut(&mut self) -> &mut S {
        &mut self.sync
    }

    /// Parses a reference, treating bare names as the current user's.
    pub fn resolve(&self, reference: &str) -> Result<SnippetId> {
        SnippetId::parse(reference, self.current_user())
    }

    /// Brings the cache up to date with the remote.
    #[instrument(skip(self), fields(root = %self.state.root_dir.display()))]
    pub fn pull(&mut self) -> Result<SyncStats> {
        self.phase = Phase::Syncing;
        match self.sync.pull() {
            Ok(stats) => {
                self.state.last_synced = Some(SystemTime::now());
                self.phase = Phase::Succeeded;
                tracing::info!(pulled = stats.pulled, "cache is up to date");
                Ok(stats)
            }
            Err(e) => {
                self.phase = Phase::Failed;
                tracing::warn!(error = %e, "pull failed");
                Err(e)
            }
        }
    }

    fn publish(&mut self, message: &str) -> Result<SyncStats> {
        self.phase = Phase::Publishing;
        match self.sync.push(message) {
            Ok(stats) => {
                self.phase = Phase::Published;
                tracing::info!(pushed = stats.pushed, "published local changes");
                Ok(stats)
            }
            Err(e) => {
                self.phase = Phase::PublishFailed;
                tracing::warn!(error = %e, "publish failed; local change kept for the next sync");
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(snippet = %id))]
    pub fn read(&mut self, id: &SnippetId) -> Result<Snippet> {
        self.pull()?;
        self.cache.read(id)
    }

    /// Writes `body` under `id`, replacing any existing snippet, then publishes.
    #[instrument(skip(self, body), fields(snippet = %id))]
    pub fn write(&mut self, id: &SnippetId, body: &str) -> Result<Snippet> {
        self.check_owner(id)?;
        self.store_and_publish(id, body, &format!("Update snippet: {id}"))
    }

    /// Creates an empty snippet under the current user. Backs `pd new`.
    pub fn create(&mut self, name: &str) -> Result<Snippet> {
        self.create_with_body(name, "")
    }

    #[instrument(skip(self, body))]
    pub fn create_with_body(&mut self, name: &str, body: &str) -> Result<Snippet> {
        let id = SnippetId::new(self.current_user(), name)?;
        self.pull()?;
        if self.cache.exists(&id) {
            self.phase = Phase::Failed;
            return Err(Error::AlreadyExists(id));
        }
        self.store_and_publish(&id, body, &format!("New snippet: {id}"))
    }

    /// Copies a snippet from any owner into the current user's namespace.
    #[instrument(skip(self), fields(source = %source))]
    pub fn fork(&mut self, source: &SnippetId) -> Result<Snippet> {
        let original = self.read(source)?;
        let target = source.with_owner(self.current_user())?;
        if self.cache.exists(&target) {
            self.phase = Phase::Failed;
            return Err(Error::AlreadyExists(target));
        }
        self.store_and_publish(
            &target,
            &original.body,
            &format!("Fork snippet: {source} -> {target}"),
        )
    }

    /// Lists snippet ids after syncing. The sequence is lazy and unordered.
    pub fn list(&mut self, owner: Option<&str>) -> Result<impl Iterator<Item = SnippetId> + 'static> {
        self.pull()?;
        Ok(self.cache.list(owner))
    }

    /// Case-sensitive substring search over every snippet line, in id order.
    ///
    /// Snippets that cannot be read as text are skipped.
    #[instrument(skip(self))]
    pub fn search(&mut self, query: &str) -> Result<Vec<SearchHit>> {
        let mut ids: Vec<SnippetId> = self.list(None)?.collect();
        ids.sort();

        let mut hits = Vec::new();
        for id in ids {
            let snippet = match self.cache.read(&id) {
                Ok(snippet) => snippet,
                Err(e) => {
                    tracing::warn!(snippet = %id, error = %e, "skipping unreadable snippet");
                    continue;
                }
            };
            for (index, line) in snippet.body.lines().enumerate() {
                if line.contains(query) {
                    hits.push(SearchHit {
                        id: id.clone(),
                        line_number: index + 1,
                        line: line.to_string(),
                    });
                }
            }
        }
        Ok(hits)
    }

    /// Pulls, then publishes anything left over from earlier failed pushes.
    #[instrument(skip(self))]
    pub fn sync(&mut self) -> Result<SyncStats> {
        let pulled = self.pull()?;
        let pushed = self.publish("Sync snippets")?;
        Ok(pulled + pushed)
    }

    fn check_owner(&mut self, id: &SnippetId) -> Result<()> {
        if id.owner() == self.current_user() {
            return Ok(());
        }
        self.phase = Phase::Failed;
        Err(Error::PermissionDenied {
            owner: id.owner().to_string(),
            current_user: self.current_user().to_string(),
        })
    }

    fn store_and_publish(&mut self, id: &SnippetId, body: &str, message: &str) -> Result<Snippet> {
        // The clone must exist before the first file lands in the cache root.
        let prepared = self.sync.prepare();
        let snippet = match prepared.and_then(|()| self.cache.write(id, body)) {
            Ok(snippet) => snippet,
            Err(e) => {
                self.phase = Phase::Failed;
                return Err(e);
            }
        };
        self.phase = Phase::Succeeded;
        self.publish(message)?;
        Ok(snippet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{FakeRemote, FakeSync, SyncFailure};
    use tempfile::TempDir;

    fn store(dir: &TempDir, remote: &FakeRemote) -> SnippetStore<FakeSync> {
        let context = Context::new("ada", "team/prompts", None).unwrap();
        SnippetStore::open(context, FakeSync::new(dir.path(), remote.clone()))
    }

    fn id(s: &str) -> SnippetId {
        s.parse().unwrap()
    }

    #[test]
    fn test_read_pulls_remote_snippet() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        remote.put(&id("bob/haiku"), "five seven five");

        let mut store = store(&dir, &remote);
        assert!(store.cache_state().last_synced.is_none());
        let snippet = store.read(&id("bob/haiku")).unwrap();
        assert_eq!(snippet.body, "five seven five");
        assert!(store.cache_state().last_synced.is_some());
        assert_eq!(store.phase(), Phase::Succeeded);
    }

    #[test]
    fn test_read_missing_after_sync() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, &FakeRemote::new());
        let err = store.read(&id("bob/nothing")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_write_publishes_own_snippet() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        let mut store = store(&dir, &remote);

        store.write(&id("ada/greet"), "Hello {{name}}!").unwrap();
        assert_eq!(store.phase(), Phase::Published);
        assert_eq!(remote.get(&id("ada/greet")).as_deref(), Some("Hello {{name}}!"));
    }

    #[test]
    fn test_write_foreign_owner_denied() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        let mut store = store(&dir, &remote);

        for body in ["", "anything", "Hello {{name}}"] {
            let err = store.write(&id("bob/greet"), body).unwrap_err();
            assert!(matches!(err, Error::PermissionDenied { .. }));
        }
        assert!(!store.cache().exists(&id("bob/greet")));
        assert_eq!(remote.revision(), 0);
    }

    #[test]
    fn test_failed_publish_keeps_local_change() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        let mut store = store(&dir, &remote);
        remote.reject_pushes(true);

        let err = store.write(&id("ada/draft"), "v1").unwrap_err();
        assert!(matches!(err, Error::SyncFailure(SyncFailure::Rejected(_))));
        assert_eq!(store.phase(), Phase::PublishFailed);
        assert_eq!(store.cache().read(&id("ada/draft")).unwrap().body, "v1");
        assert!(remote.get(&id("ada/draft")).is_none());

        remote.reject_pushes(false);
        let stats = store.sync().unwrap();
        assert_eq!(stats.pushed, 1);
        assert_eq!(remote.get(&id("ada/draft")).as_deref(), Some("v1"));
    }

    #[test]
    fn test_create_twice_already_exists() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, &FakeRemote::new());

        let snippet = store.create("foo").unwrap();
        assert_eq!(snippet.id, id("ada/foo"));
        assert_eq!(snippet.body, "");

        let err = store.create("foo").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn test_create_sees_remote_snippet() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        remote.put(&id("ada/foo"), "from another machine");
        let mut store = store(&dir, &remote);

        let err = store.create("foo").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn test_fork_copies_body_into_own_namespace() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        remote.put(&id("bob/review"), "Review {{code}}");
        let mut store = store(&dir, &remote);

        let forked = store.fork(&id("bob/review")).unwrap();
        assert_eq!(forked.id, id("ada/review"));
        assert_eq!(store.read(&id("ada/review")).unwrap().body, "Review {{code}}");

        let err = store.fork(&id("bob/review")).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn test_fork_missing_source() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir, &FakeRemote::new());
        let err = store.fork(&id("bob/missing")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_unreachable_remote_fails_read() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        remote.put(&id("bob/haiku"), "x");
        remote.set_unreachable(true);
        let mut store = store(&dir, &remote);

        let err = store.read(&id("bob/haiku")).unwrap_err();
        assert!(matches!(err, Error::SyncFailure(SyncFailure::Unreachable(_))));
        assert_eq!(store.phase(), Phase::Failed);
    }

    #[test]
    fn test_search_reports_lines() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        remote.put(&id("bob/a"), "first line\nneedle here");
        remote.put(&id("ada/b"), "needle first\nnothing");
        let mut store = store(&dir, &remote);

        let hits = store.search("needle").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, id("ada/b"));
        assert_eq!(hits[0].line_number, 1);
        assert_eq!(hits[1].id, id("bob/a"));
        assert_eq!(hits[1].line_number, 2);
        assert_eq!(hits[1].line, "needle here");
    }

    #[test]
    fn test_search_skips_non_utf8_snippet() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        remote.put(&id("bob/a"), "needle here");
        let mut store = store(&dir, &remote);
        store.pull().unwrap();

        let binary = store.cache().path(&id("ada/blob"));
        std::fs::create_dir_all(binary.parent().unwrap()).unwrap();
        std::fs::write(&binary, [0xff, 0xfe, b'n', b'e', b'e', b'd', b'l', b'e']).unwrap();

        let hits = store.search("needle").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id("bob/a"));
    }
}
