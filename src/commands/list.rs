use crate::output::Output;
use crate::storage::{SnippetId, SnippetStore};
use crate::sync::SyncEngine;
use anyhow::Result;

/// Ids with the current user's snippets first, each group sorted.
pub fn ordered_ids<S: SyncEngine>(
    store: &mut SnippetStore<S>,
    owner: Option<&str>,
) -> Result<Vec<SnippetId>> {
    let current_user = store.current_user().to_string();
    let mut ids: Vec<SnippetId> = store.list(owner)?.collect();
    ids.sort_by(|a, b| {
        (a.owner() != current_user, a)
            .cmp(&(b.owner() != current_user, b))
    });
    Ok(ids)
}

pub fn list_snippets<S: SyncEngine>(
    store: &mut SnippetStore<S>,
    owner: Option<&str>,
    output: &Output,
) -> Result<()> {
    let ids = ordered_ids(store, owner)?;

    if ids.is_empty() {
        eprintln!("No snippets found.");
        return Ok(());
    }

    let listing: Vec<String> = ids.iter().map(ToString::to_string).collect();
    output.emit(&listing.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Context;
    use crate::sync::{FakeRemote, FakeSync};
    use tempfile::TempDir;

    #[test]
    fn test_own_snippets_listed_first() {
        let dir = TempDir::new().unwrap();
        let remote = FakeRemote::new();
        for reference in ["bob/alpha", "ada/zeta", "carol/beta", "ada/alpha"] {
            remote.put(&reference.parse().unwrap(), "body");
        }
        let context = Context::new("ada", "team/prompts", None).unwrap();
        let mut store = SnippetStore::open(context, FakeSync::new(dir.path().join("cache"), remote));

        let ids: Vec<String> = ordered_ids(&mut store, None)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, ["ada/alpha", "ada/zeta", "bob/alpha", "carol/beta"]);

        let out = dir.path().join("list.txt");
        list_snippets(&mut store, Some("bob"), &Output::File(out.clone())).unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "bob/alpha");
    }
}
