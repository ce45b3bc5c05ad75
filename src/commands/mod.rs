pub mod configure;
pub mod copy;
pub mod edit;
pub mod fork;
pub mod list;
pub mod new;
pub mod read;
pub mod search;
pub mod sync;
pub mod template;
pub mod write;

use crate::config::{Config, Context};
use crate::storage::SnippetStore;
use crate::sync::GitSync;
use crate::Error;
use anyhow::Result;
use std::io::{self, Read};

/// Opens the store on the configured git remote.
pub fn open_store(config: &Config, context: Context) -> Result<SnippetStore<GitSync>> {
    let sync = GitSync::new(
        config.cache_root()?,
        config.remote_url()?,
        context.current_user(),
        config.sync_timeout(),
    );
    Ok(SnippetStore::open(context, sync))
}

/// Uses `content` when given, otherwise reads stdin to the end.
pub(crate) fn content_or_stdin(content: Option<String>) -> Result<String> {
    match content {
        Some(content) => Ok(content),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| Error::io("<stdin>", e))?;
            Ok(buf)
        }
    }
}
