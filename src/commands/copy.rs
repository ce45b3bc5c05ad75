use super::list::ordered_ids;
use crate::output::Output;
use crate::search::fuzzy;
use crate::storage::SnippetStore;
use crate::sync::SyncEngine;
use crate::template::{self, Mode};
use crate::Error;
use anyhow::Result;

/// Sends a snippet to `output`, hydrating it strictly with `--hydrate`.
///
/// Without a reference, the snippet is picked interactively.
pub fn copy_snippet<S: SyncEngine>(
    store: &mut SnippetStore<S>,
    reference: Option<String>,
    hydrate: bool,
    args: &[String],
    output: &Output,
) -> Result<()> {
    if !hydrate && !args.is_empty() {
        return Err(Error::InvalidInput(
            "parameters and trailing text require --hydrate".to_string(),
        )
        .into());
    }

    let reference = match reference {
        Some(reference) => reference,
        None => {
            let options: Vec<String> = ordered_ids(store, None)?
                .iter()
                .map(ToString::to_string)
                .collect();
            fuzzy::pick(&options)?
        }
    };

    let id = store.resolve(&reference)?;
    let snippet = store.read(&id)?;
    let text = if hydrate {
        let request = template::parse_args(args)?;
        template::hydrate(&snippet.body, &request, Mode::Strict)?
    } else {
        snippet.body
    };
    output.emit(&text)
}
