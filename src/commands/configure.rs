use crate::config::Config;
use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

/// Non-interactive config updates. With no flags the current config is shown.
#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// Your owner name in the snippet repository
    #[arg(long)]
    pub username: Option<String>,
    /// Snippet repository as owner/repo
    #[arg(long)]
    pub repo: Option<String>,
    /// Clone URL, if not git@github.com:<repo>.git
    #[arg(long)]
    pub remote_url: Option<String>,
    /// Local cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
    /// Default output file instead of stdout
    #[arg(long)]
    pub output_file: Option<PathBuf>,
    /// Timeout in seconds for each git command
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl ConfigArgs {
    fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.repo.is_none()
            && self.remote_url.is_none()
            && self.cache_dir.is_none()
            && self.output_file.is_none()
            && self.timeout.is_none()
    }

    fn apply(self, config: &mut Config) {
        if let Some(username) = self.username {
            config.username = Some(username);
        }
        if let Some(repo) = self.repo {
            config.remote_repo = Some(repo);
        }
        if let Some(url) = self.remote_url {
            config.remote_url = Some(url);
        }
        if let Some(dir) = self.cache_dir {
            config.cache_dir = Some(dir);
        }
        if let Some(path) = self.output_file {
            config.output_file = Some(path);
        }
        if let Some(secs) = self.timeout {
            config.sync_timeout_secs = secs;
        }
    }
}

pub fn configure(mut config: Config, path: &Path, args: ConfigArgs) -> Result<()> {
    if args.is_empty() {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    args.apply(&mut config);
    config.validate()?;
    config.save_to(path)?;
    eprintln!("✓ Saved config: {}", path.display());
    Ok(())
}
