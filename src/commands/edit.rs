use crate::storage::SnippetStore;
use crate::sync::SyncEngine;
use crate::Error;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::process::Command;

/// Opens a snippet in `$VISUAL`/`$EDITOR` and writes it back if it changed.
pub fn edit_snippet<S: SyncEngine>(store: &mut SnippetStore<S>, reference: &str) -> Result<()> {
    let editor = env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| "vi".to_string());
    edit_snippet_with(store, reference, &editor)
}

/// Like [`edit_snippet`], with an explicit editor command line.
pub fn edit_snippet_with<S: SyncEngine>(
    store: &mut SnippetStore<S>,
    reference: &str,
    editor: &str,
) -> Result<()> {
    let id = store.resolve(reference)?;
    if id.owner() != store.current_user() {
        return Err(Error::PermissionDenied {
            owner: id.owner().to_string(),
            current_user: store.current_user().to_string(),
        }
        .into());
    }

    let before = store.read(&id)?.body;

    let scratch = tempfile::Builder::new()
        .prefix(&format!("{}-", id.name()))
        .suffix(".md")
        .tempfile()
        .context("Failed to create temporary file")?;
    fs::write(scratch.path(), &before).context("Failed to write temporary file")?;

    let mut words = editor.split_whitespace();
    let program = words.next().unwrap_or("vi");
    let status = Command::new(program)
        .args(words)
        .arg(scratch.path())
        .status()
        .with_context(|| format!("Failed to launch editor: {editor}"))?;
    if !status.success() {
        anyhow::bail!("Editor exited with {status}; snippet left unchanged");
    }

    let after = fs::read_to_string(scratch.path()).context("Failed to read edited snippet")?;
    if after == before {
        eprintln!("No changes made.");
        return Ok(());
    }

    store.write(&id, &after)?;
    eprintln!("✓ Edited snippet: {id}");
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::Context;
    use crate::storage::SnippetId;
    use crate::sync::{FakeRemote, FakeSync};
    use tempfile::TempDir;

    fn id(s: &str) -> SnippetId {
        s.parse().unwrap()
    }

    fn store(dir: &TempDir, remote: &FakeRemote) -> SnippetStore<FakeSync> {
        let context = Context::new("ada", "team/prompts", None).unwrap();
        SnippetStore::open(context, FakeSync::new(dir.path().join("cache"), remote.clone()))
    }

    #[test]
    fn test_edit_writes_and_publishes_changes() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        remote.put(&id("ada/note"), "draft");
        let mut store = store(&dir, &remote);

        // The "editor" overwrites the scratch file with prepared content.
        let replacement = dir.path().join("replacement.md");
        fs::write(&replacement, "edited {{topic}}").unwrap();
        let editor = format!("cp {}", replacement.display());

        edit_snippet_with(&mut store, "note", &editor).unwrap();
        assert_eq!(store.cache().read(&id("ada/note")).unwrap().body, "edited {{topic}}");
        assert_eq!(remote.get(&id("ada/note")).as_deref(), Some("edited {{topic}}"));
    }

    #[test]
    fn test_unchanged_edit_publishes_nothing() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        remote.put(&id("ada/note"), "draft");
        let mut store = store(&dir, &remote);

        edit_snippet_with(&mut store, "note", "true").unwrap();
        assert_eq!(remote.revision(), 1);
        assert_eq!(remote.get(&id("ada/note")).as_deref(), Some("draft"));
    }

    #[test]
    fn test_failed_editor_leaves_snippet_alone() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        remote.put(&id("ada/note"), "draft");
        let mut store = store(&dir, &remote);

        assert!(edit_snippet_with(&mut store, "note", "false").is_err());
        assert_eq!(remote.revision(), 1);
    }

    #[test]
    fn test_edit_foreign_snippet_denied() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        remote.put(&id("bob/note"), "draft");
        let mut store = store(&dir, &remote);

        let err = edit_snippet_with(&mut store, "bob/note", "true").unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::PermissionDenied { .. })));
    }
}
