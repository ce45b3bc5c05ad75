//! # Promptdir
//!
//! A prompt-snippet manager backed by a git repository.
//!
//! Snippets are plain text files addressed as `owner/name`. They are mirrored
//! into a local cache that is pulled before every read and pushed after every
//! write. Snippets containing `{{param}}` placeholders can be hydrated into
//! final text with named parameters and trailing free-form words.

pub mod commands;
pub mod config;
pub mod output;
pub mod search;
pub mod storage;
pub mod sync;
pub mod template;

use std::path::PathBuf;
use thiserror::Error as ThisError;

pub use config::{Config, Context};
pub use storage::{LocalCache, Phase, Reference, Snippet, SnippetId, SnippetStore};
pub use sync::{FakeSync, GitSync, SyncEngine, SyncFailure, SyncStats};
pub use template::{hydrate, HydrationRequest, Mode};

/// Error type for promptdir operations.
///
/// Every variant maps to a distinct exit code through [`Error::exit_code`] so
/// scripts built on the CLI can branch on the outcome.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A reference string could not be parsed into an `owner/name` id.
    #[error("invalid identifier '{reference}': {reason}")]
    InvalidIdentifier {
        /// The reference as given.
        reference: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// No snippet exists under the id after syncing.
    #[error("snippet not found: {0}")]
    NotFound(SnippetId),

    /// The destination of `new` or `fork` is already taken.
    #[error("snippet already exists: {0} (use `pd write` to overwrite)")]
    AlreadyExists(SnippetId),

    /// A write targeted another user's namespace.
    #[error("cannot write to '{owner}': snippets may only be written under your own name '{current_user}'")]
    PermissionDenied {
        /// Owner segment of the rejected id.
        owner: String,
        /// The configured current user.
        current_user: String,
    },

    /// The remote could not be reconciled with the local cache.
    #[error("sync failed: {0}; resolve the problem in the cache and run `pd sync`")]
    SyncFailure(#[from] SyncFailure),

    /// Local disk I/O failed.
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Strict hydration found placeholders without a value.
    #[error("missing parameter(s): {}", names.join(", "))]
    MissingParameter {
        /// Placeholder names without a value, in order of first appearance.
        names: Vec<String>,
    },

    /// Configuration is missing or unreadable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed command-line input that is not an identifier.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable process exit code for this kind of failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) => 2,
            Self::InvalidIdentifier { .. } => 3,
            Self::NotFound(_) => 4,
            Self::AlreadyExists(_) => 5,
            Self::PermissionDenied { .. } => 6,
            Self::SyncFailure(_) => 7,
            Self::Io { .. } => 8,
            Self::MissingParameter { .. } => 9,
            Self::Config(_) => 10,
        }
    }
}

/// Result type alias for promptdir operations.
pub type Result<T> = std::result::Result<T, Error>;
