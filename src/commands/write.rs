use super::content_or_stdin;
use crate::storage::SnippetStore;
use crate::sync::SyncEngine;
use anyhow::Result;

/// Writes `--content`, or stdin when no content is given.
pub fn write_snippet<S: SyncEngine>(
    store: &mut SnippetStore<S>,
    reference: &str,
    content: Option<String>,
) -> Result<()> {
    let id = store.resolve(reference)?;
    let body = content_or_stdin(content)?;
    store.write(&id, &body)?;
    eprintln!("✓ Wrote snippet: {id}");
    Ok(())
}
