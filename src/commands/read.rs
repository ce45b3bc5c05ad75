use crate::output::Output;
use crate::storage::SnippetStore;
use crate::sync::SyncEngine;
use anyhow::Result;

pub fn read_snippet<S: SyncEngine>(
    store: &mut SnippetStore<S>,
    reference: &str,
    output: &Output,
) -> Result<()> {
    let id = store.resolve(reference)?;
    let snippet = store.read(&id)?;
    output.emit(&snippet.body)
}
