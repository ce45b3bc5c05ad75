use crate::storage::SnippetId;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of snippet files inside an owner directory.
pub const SNIPPET_SUFFIX: &str = ".prompt.md";

/// A snippet loaded from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub id: SnippetId,
    pub body: String,
    pub path: PathBuf,
}

/// Directory tree mirroring the remote repository.
///
/// `root/<owner>/<name>.prompt.md` holds the body of `owner/name`; the mapping
/// depends on nothing but the id and the root.
#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, id: &SnippetId) -> PathBuf {
        self.root
            .join(id.owner())
            .join(format!("{}{SNIPPET_SUFFIX}", id.name()))
    }

    pub fn exists(&self, id: &SnippetId) -> bool {
        self.path(id).is_file()
    }

    pub fn read(&self, id: &SnippetId) -> Result<Snippet> {
        let path = self.path(id);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(Snippet {
                id: id.clone(),
                body,
                path,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(id.clone())),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    pub fn write(&self, id: &SnippetId, body: &str) -> Result<Snippet> {
        let path = self.path(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&path, body).map_err(|e| Error::io(&path, e))?;
        tracing::debug!(snippet = %id, path = %path.display(), "wrote snippet to cache");
        Ok(Snippet {
            id: id.clone(),
            body: body.to_string(),
            path,
        })
    }

    /// Enumerates snippet ids, optionally restricted to one owner.
    ///
    /// The directory tree is walked lazily and afresh on every call, so the
    /// result reflects the cache at iteration time. Order is unspecified.
    /// Entries that are not valid snippet files (including `.git`) are skipped.
    pub fn list(&self, owner: Option<&str>) -> impl Iterator<Item = SnippetId> + 'static {
        let owners: Box<dyn Iterator<Item = (String, PathBuf)>> = match owner {
            Some(owner) => Box::new(std::iter::once((owner.to_string(), self.root.join(owner)))),
            None => Box::new(
                read_dir_lazy(&self.root)
                    .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
                    .filter_map(|entry| {
                        let name = entry.file_name().into_string().ok()?;
                        Some((name, entry.path()))
                    }),
            ),
        };

        owners.flat_map(|(owner, dir)| {
            read_dir_lazy(&dir).filter_map(move |entry| {
                if !entry.file_type().is_ok_and(|t| t.is_file()) {
                    return None;
                }
                let file_name = entry.file_name().into_string().ok()?;
                let name = file_name.strip_suffix(SNIPPET_SUFFIX)?;
                SnippetId::new(owner.as_str(), name).ok()
            })
        })
    }
}

fn read_dir_lazy(dir: &Path) -> impl Iterator<Item = fs::DirEntry> {
    let dir_display = dir.display().to_string();
    fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(move |entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(dir = %dir_display, error = %e, "skipping unreadable cache entry");
                None
            }
        })
}
