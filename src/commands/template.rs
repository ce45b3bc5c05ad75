use crate::output::Output;
use crate::storage::SnippetStore;
use crate::sync::SyncEngine;
use crate::template::{self, Mode};
use crate::Error;
use anyhow::Result;

/// Direct invocation: `pd <template> [--key=value ...] [-- trailing words]`.
///
/// Missing parameters are left in place.
pub fn run_template<S: SyncEngine>(
    store: &mut SnippetStore<S>,
    words: &[String],
    output: &Output,
) -> Result<()> {
    let Some((reference, args)) = words.split_first() else {
        return Err(Error::InvalidInput("missing template name".to_string()).into());
    };

    let request = template::parse_args(args)?;
    let id = store.resolve(reference)?;
    let snippet = store.read(&id)?;
    let text = template::hydrate(&snippet.body, &request, Mode::Lenient)?;
    output.emit(&text)
}
