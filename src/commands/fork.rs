use crate::storage::{Reference, SnippetStore};
use crate::sync::SyncEngine;
use anyhow::Result;

/// Forks `owner/name`; a bare name is rejected.
pub fn fork_snippet<S: SyncEngine>(store: &mut SnippetStore<S>, reference: &str) -> Result<()> {
    let source = Reference::parse(reference)?.require_owner()?;
    let forked = store.fork(&source)?;
    eprintln!("✓ Forked snippet: {source} → {}", forked.id);
    Ok(())
}
