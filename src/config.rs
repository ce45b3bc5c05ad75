use crate::storage::SnippetId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 30;

const fn default_sync_timeout() -> u64 {
    DEFAULT_SYNC_TIMEOUT_SECS
}

/// Settings persisted in `<config_dir>/promptdir/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Owner segment for your own snippets. Falls back to `git config user.name`.
    #[serde(default)]
    pub username: Option<String>,
    /// `owner/repo` slug of the snippet repository.
    #[serde(default)]
    pub remote_repo: Option<String>,
    /// Clone URL override; defaults to GitHub over SSH.
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
    #[serde(default = "default_sync_timeout")]
    pub sync_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            remote_repo: None,
            remote_url: None,
            cache_dir: None,
            output_file: None,
            sync_timeout_secs: DEFAULT_SYNC_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Loads the config file, writing a default one on first run.
    pub fn init() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        serde_json::from_str(&config_str).map_err(|e| {
            Error::Config(format!("failed to parse config file {}: {e}", path.display()))
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let config_str = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        fs::write(path, config_str).map_err(|e| Error::io(path, e))
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .ok_or_else(|| Error::Config("failed to determine config directory".to_string()))?;
        Ok(config_dir.join("promptdir").join("config.json"))
    }

    /// Builds the immutable per-run context.
    pub fn context(&self) -> Result<Context> {
        let username = match &self.username {
            Some(name) => name.clone(),
            None => git_username().ok_or_else(|| {
                Error::Config(
                    "no username configured; run `pd config --username NAME` or set git user.name"
                        .to_string(),
                )
            })?,
        };
        Context::new(&username, self.repo_slug()?, self.output_file.clone())
    }

    fn repo_slug(&self) -> Result<&str> {
        self.remote_repo.as_deref().ok_or_else(|| {
            Error::Config("no snippet repository configured; run `pd config --repo owner/repo`".to_string())
        })
    }

    pub fn remote_url(&self) -> Result<String> {
        if let Some(url) = &self.remote_url {
            return Ok(url.clone());
        }
        Ok(format!("git@github.com:{}.git", self.repo_slug()?))
    }

    /// Cache root, one directory per repository.
    pub fn cache_root(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        let base = dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .ok_or_else(|| Error::Config("failed to determine cache directory".to_string()))?;
        Ok(base.join("promptdir").join(self.repo_slug()?.replace('/', "_")))
    }

    /// Checks the fields that are set, without resolving fallbacks.
    pub fn validate(&self) -> Result<()> {
        if let Some(username) = &self.username {
            check_username(username)?;
        }
        if let Some(slug) = &self.remote_repo {
            check_repo_slug(slug)?;
        }
        Ok(())
    }

    pub const fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }
}

/// Read-only settings threaded through the store for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    current_user: String,
    remote_repo: String,
    output_file: Option<PathBuf>,
}

impl Context {
    pub fn new(
        current_user: &str,
        remote_repo: &str,
        output_file: Option<PathBuf>,
    ) -> Result<Self> {
        check_username(current_user)?;
        check_repo_slug(remote_repo)?;
        Ok(Self {
            current_user: current_user.to_string(),
            remote_repo: remote_repo.to_string(),
            output_file,
        })
    }

    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    pub fn remote_repo(&self) -> &str {
        &self.remote_repo
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }
}

/// The username becomes an owner directory, so it must be a valid segment.
fn check_username(username: &str) -> Result<()> {
    SnippetId::new(username, "_")
        .map(|_| ())
        .map_err(|_| Error::Config(format!("username '{username}' cannot be used as an owner")))
}

fn check_repo_slug(slug: &str) -> Result<()> {
    match slug.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => Ok(()),
        _ => Err(Error::Config(format!(
            "remote repository '{slug}' is not of the form owner/repo"
        ))),
    }
}

fn git_username() -> Option<String> {
    let output = Command::new("git").args(["config", "user.name"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let name = String::from_utf8(output.stdout).ok()?;
    let name = name.trim().replace(' ', "_");
    (!name.is_empty()).then_some(name)
}
