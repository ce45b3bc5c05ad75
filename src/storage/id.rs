use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Address of a snippet: the owning user and the snippet name.
///
/// Both segments are non-empty and free of path separators, so an id always
/// maps to exactly one file in the cache. Case is preserved as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnippetId {
    owner: String,
    name: String,
}

impl SnippetId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let name = name.into();
        let reference = format!("{owner}/{name}");
        validate_segment(&reference, &owner)?;
        validate_segment(&reference, &name)?;
        Ok(Self { owner, name })
    }

    /// Parses a reference, filling in `current_user` when no owner is given.
    pub fn parse(reference: &str, current_user: &str) -> Result<Self> {
        Reference::parse(reference)?.resolve(current_user)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The same name under another owner.
    pub fn with_owner(&self, owner: &str) -> Result<Self> {
        Self::new(owner, self.name.clone())
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parses an explicit `owner/name` reference. Bare names are rejected.
impl FromStr for SnippetId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Reference::parse(s)?.require_owner()
    }
}

/// A parsed reference before the owner has been resolved.
///
/// A string without `/` names one of the current user's snippets; the
/// owner is only known once the configured username is supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Implicit { name: String },
    Explicit(SnippetId),
}

impl Reference {
    pub fn parse(reference: &str) -> Result<Self> {
        if reference.is_empty() {
            return Err(invalid(reference, "reference is empty"));
        }

        let mut parts = reference.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, _) => {
                validate_segment(reference, name)?;
                Ok(Self::Implicit {
                    name: name.to_string(),
                })
            }
            (Some(owner), Some(name), None) => {
                validate_segment(reference, owner)?;
                validate_segment(reference, name)?;
                Ok(Self::Explicit(SnippetId {
                    owner: owner.to_string(),
                    name: name.to_string(),
                }))
            }
            _ => Err(invalid(reference, "expected at most one '/'")),
        }
    }

    pub const fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }

    pub fn resolve(self, current_user: &str) -> Result<SnippetId> {
        match self {
            Self::Implicit { name } => SnippetId::new(current_user, name),
            Self::Explicit(id) => Ok(id),
        }
    }

    /// Returns the id, failing for bare names.
    pub fn require_owner(self) -> Result<SnippetId> {
        match self {
            Self::Explicit(id) => Ok(id),
            Self::Implicit { name } => Err(invalid(&name, "an explicit owner is required (owner/name)")),
        }
    }
}

fn validate_segment(reference: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(invalid(reference, "owner and name must be non-empty"));
    }
    if segment.contains('/') {
        return Err(invalid(reference, "expected at most one '/'"));
    }
    if segment.contains('\\') || segment.contains('\0') {
        return Err(invalid(reference, "path separators are not allowed"));
    }
    // Leading dots would address `.git` or escape the cache root.
    if segment.starts_with('.') {
        return Err(invalid(reference, "segments may not start with '.'"));
    }
    Ok(())
}

fn invalid(reference: &str, reason: &'static str) -> Error {
    Error::InvalidIdentifier {
        reference: reference.to_string(),
        reason,
    }
}
