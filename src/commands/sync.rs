use crate::storage::SnippetStore;
use crate::sync::SyncEngine;
use anyhow::Result;

pub fn sync_snippets<S: SyncEngine>(store: &mut SnippetStore<S>) -> Result<()> {
    let stats = store.sync()?;
    eprintln!(
        "✓ Synced {}: {} pulled, {} pushed",
        store.context().remote_repo(),
        stats.pulled,
        stats.pushed
    );
    Ok(())
}
