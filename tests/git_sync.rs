//! End-to-end sync against a local bare repository using the real `git`.
//!
//! Skipped when `git` is not installed.

use promptdir::{Context, Error, GitSync, Phase, SnippetId, SnippetStore, SyncEngine, SyncFailure};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn bare_remote(dir: &Path) -> PathBuf {
    let path = dir.join("remote.git");
    let status = Command::new("git")
        .args(["init", "--bare", "--quiet"])
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success());
    path
}

fn open(dir: &Path, user: &str, remote: &Path) -> SnippetStore<GitSync> {
    let context = Context::new(user, "team/prompts", None).unwrap();
    let sync = GitSync::new(
        dir.join(format!("cache-{user}")),
        remote.to_string_lossy(),
        user,
        Duration::from_secs(60),
    );
    SnippetStore::open(context, sync)
}

fn id(s: &str) -> SnippetId {
    s.parse().unwrap()
}

#[test]
fn test_write_read_fork_across_clones() {
    if !git_available() {
        eprintln!("git not installed; skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let remote = bare_remote(dir.path());
    let mut ada = open(dir.path(), "ada", &remote);
    let mut bob = open(dir.path(), "bob", &remote);

    // Empty remote: nothing to pull, nothing to push.
    assert_eq!(ada.pull().unwrap().pulled, 0);
    assert_eq!(ada.sync().unwrap().pushed, 0);

    ada.write(&id("ada/greet"), "Hello {{name}}!").unwrap();

    assert_eq!(bob.read(&id("ada/greet")).unwrap().body, "Hello {{name}}!");
    bob.fork(&id("ada/greet")).unwrap();

    let stats = ada.pull().unwrap();
    assert_eq!(stats.pulled, 1);
    assert_eq!(ada.pull().unwrap().pulled, 0);
    assert_eq!(ada.read(&id("bob/greet")).unwrap().body, "Hello {{name}}!");

    let stats = ada.sync().unwrap();
    assert_eq!(stats.pulled + stats.pushed, 0);

    let mut ids: Vec<SnippetId> = ada.list(None).unwrap().collect();
    ids.sort();
    assert_eq!(ids, vec![id("ada/greet"), id("bob/greet")]);
}

#[test]
fn test_concurrent_push_is_rejected_then_diverges() {
    if !git_available() {
        eprintln!("git not installed; skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let remote = bare_remote(dir.path());
    let mut ada = open(dir.path(), "ada", &remote);
    let mut bob = open(dir.path(), "bob", &remote);

    ada.write(&id("ada/base"), "base").unwrap();
    bob.pull().unwrap();
    bob.write(&id("bob/first"), "bob was here").unwrap();

    let err = ada.write(&id("ada/second"), "ada was here").unwrap_err();
    assert!(matches!(err, Error::SyncFailure(SyncFailure::Rejected(_))));
    assert_eq!(ada.cache().read(&id("ada/second")).unwrap().body, "ada was here");

    let err = ada.read(&id("bob/first")).unwrap_err();
    assert!(matches!(
        err,
        Error::SyncFailure(SyncFailure::Diverged { ahead: 1, behind: 1 })
    ));
    assert_eq!(ada.cache().read(&id("ada/second")).unwrap().body, "ada was here");
}

#[test]
fn test_first_operation_can_be_a_write() {
    if !git_available() {
        eprintln!("git not installed; skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let remote = bare_remote(dir.path());
    let mut ada = open(dir.path(), "ada", &remote);

    ada.write(&id("ada/x"), "hi").unwrap();
    assert_eq!(ada.phase(), Phase::Published);

    let stats = ada.sync().unwrap();
    assert_eq!(stats.pulled + stats.pushed, 0);

    let mut bob = open(dir.path(), "bob", &remote);
    assert_eq!(bob.read(&id("ada/x")).unwrap().body, "hi");
}

#[test]
fn test_write_to_unreachable_remote_leaves_cache_untouched() {
    if !git_available() {
        eprintln!("git not installed; skipping");
        return;
    }
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.git");
    let mut ada = open(dir.path(), "ada", &missing);

    let err = ada.write(&id("ada/x"), "hi").unwrap_err();
    assert!(matches!(err, Error::SyncFailure(SyncFailure::Unreachable(_))));
    assert_eq!(ada.phase(), Phase::Failed);
    assert!(!ada.cache().exists(&id("ada/x")));

    // Once the remote exists the same cache works without manual cleanup.
    let remote = bare_remote(dir.path());
    std::fs::rename(&remote, &missing).unwrap();
    ada.write(&id("ada/x"), "hi").unwrap();
    assert_eq!(ada.phase(), Phase::Published);
}

#[test]
fn test_stalled_transport_times_out() {
    if !git_available() {
        eprintln!("git not installed; skipping");
        return;
    }
    // Extra arguments from git land in $0.. of the inner shell.
    std::env::set_var("GIT_SSH_COMMAND", "sh -c 'sleep 30'");
    let dir = TempDir::new().unwrap();
    let mut sync = GitSync::new(
        dir.path().join("cache"),
        "ssh://example.invalid/team/prompts.git",
        "ada",
        Duration::from_secs(2),
    );

    let started = Instant::now();
    let err = sync.pull().unwrap_err();
    assert!(matches!(
        err,
        Error::SyncFailure(SyncFailure::Timeout { seconds: 2 })
    ));
    assert!(started.elapsed() < Duration::from_secs(15));
}
