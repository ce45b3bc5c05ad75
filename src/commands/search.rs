use crate::output::Output;
use crate::storage::SnippetStore;
use crate::sync::SyncEngine;
use anyhow::Result;

pub fn search_snippets<S: SyncEngine>(
    store: &mut SnippetStore<S>,
    query: &str,
    output: &Output,
) -> Result<()> {
    let hits = store.search(query)?;
    if hits.is_empty() {
        eprintln!("No results found for '{query}'");
        return Ok(());
    }

    let lines: Vec<String> = hits
        .iter()
        .map(|hit| format!("{}:{}: {}", hit.id, hit.line_number, hit.line.trim()))
        .collect();
    output.emit(&lines.join("\n"))
}
