pub mod cache;
pub mod id;
pub mod store;

pub use cache::{LocalCache, Snippet, SNIPPET_SUFFIX};
pub use id::{Reference, SnippetId};
pub use store::{CacheState, Phase, SearchHit, SnippetStore};
