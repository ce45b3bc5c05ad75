use crate::storage::{Reference, SnippetStore};
use crate::sync::SyncEngine;
use crate::Error;
use anyhow::Result;

pub fn new_snippet<S: SyncEngine>(
    store: &mut SnippetStore<S>,
    name: &str,
    content: Option<String>,
) -> Result<()> {
    // `pd new ada/foo` is accepted when ada is the current user.
    let name = match Reference::parse(name)? {
        Reference::Implicit { name } => name,
        Reference::Explicit(id) if id.owner() == store.current_user() => id.name().to_string(),
        Reference::Explicit(id) => {
            return Err(Error::PermissionDenied {
                owner: id.owner().to_string(),
                current_user: store.current_user().to_string(),
            }
            .into())
        }
    };

    let snippet = match content {
        Some(body) => store.create_with_body(&name, &body)?,
        None => store.create(&name)?,
    };
    eprintln!("✓ Created snippet: {} ({})", snippet.id, snippet.path.display());
    Ok(())
}
