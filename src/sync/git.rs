use super::{SyncEngine, SyncFailure, SyncStats};
use crate::{Error, Result};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::instrument;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const REMOTE: &str = "origin";

struct GitOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl GitOutput {
    fn success(&self) -> bool {
        self.status.success()
    }

    fn message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("git exited with {}", self.status)
        } else {
            stderr.to_string()
        }
    }
}

/// Sync engine driving the `git` command-line client.
///
/// The cache root is a regular clone of the remote; it is created on first
/// use. Each `git` invocation is bounded by `timeout` and killed on expiry.
#[derive(Debug, Clone)]
pub struct GitSync {
    root: PathBuf,
    remote_url: String,
    author: String,
    timeout: Duration,
}

impl GitSync {
    pub fn new(
        root: impl Into<PathBuf>,
        remote_url: impl Into<String>,
        author: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            root: root.into(),
            remote_url: remote_url.into(),
            author: author.into(),
            timeout,
        }
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    fn run(&self, cwd: &Path, args: &[&str]) -> Result<GitOutput> {
        tracing::debug!(?args, cwd = %cwd.display(), "running git");
        let mut child = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SyncFailure::Transport(format!("failed to start git: {e}")))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!(?args, "git timed out");
                    return Err(SyncFailure::Timeout {
                        seconds: self.timeout.as_secs(),
                    }
                    .into());
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(SyncFailure::Transport(e.to_string()).into()),
            }
        };

        Ok(GitOutput {
            status,
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }

    fn git(&self, args: &[&str]) -> Result<GitOutput> {
        self.run(&self.root, args)
    }

    /// Runs a command that must succeed, mapping failure to a transport error.
    fn git_ok(&self, args: &[&str]) -> Result<String> {
        let output = self.git(args)?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(SyncFailure::Transport(output.message()).into())
        }
    }

    fn ensure_clone(&self) -> Result<()> {
        if self.root.join(".git").exists() {
            return Ok(());
        }
        if fs::read_dir(&self.root).is_ok_and(|mut entries| entries.next().is_some()) {
            return Err(Error::Config(format!(
                "cache directory {} is not a clone of {}; move it aside and retry",
                self.root.display(),
                self.remote_url
            )));
        }
        let parent = self
            .root
            .parent()
            .ok_or_else(|| Error::Config(format!("invalid cache directory: {}", self.root.display())))?;
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

        tracing::info!(url = %self.remote_url, root = %self.root.display(), "cloning snippet repository");
        let root = self.root.to_string_lossy();
        let output = self.run(parent, &["clone", "--quiet", &self.remote_url, &root])?;
        if output.success() {
            Ok(())
        } else {
            Err(SyncFailure::Unreachable(output.message()).into())
        }
    }

    fn branch(&self) -> Result<String> {
        Ok(self.git_ok(&["symbolic-ref", "--short", "HEAD"])?.trim().to_string())
    }

    fn has_ref(&self, reference: &str) -> Result<bool> {
        Ok(self
            .git(&["rev-parse", "--verify", "--quiet", reference])?
            .success())
    }

    fn count(&self, range: &str) -> Result<usize> {
        let out = self.git_ok(&["rev-list", "--count", range])?;
        out.trim()
            .parse()
            .map_err(|_| SyncFailure::Transport(format!("unexpected rev-list output: {out}")).into())
    }

    /// Commits not upstream and upstream commits not local.
    fn ahead_behind(&self, upstream: &str) -> Result<(usize, usize)> {
        if !self.has_ref("HEAD")? {
            return Ok((0, self.count(upstream)?));
        }
        let ahead = self.count(&format!("{upstream}..HEAD"))?;
        let behind = self.count(&format!("HEAD..{upstream}"))?;
        Ok((ahead, behind))
    }

    fn upstream(&self) -> Result<Option<String>> {
        let upstream = format!("refs/remotes/{REMOTE}/{}", self.branch()?);
        Ok(self.has_ref(&upstream)?.then_some(upstream))
    }
}

impl SyncEngine for GitSync {
    fn root(&self) -> &Path {
        &self.root
    }

    fn prepare(&mut self) -> Result<()> {
        self.ensure_clone()
    }

    #[instrument(skip(self), fields(url = %self.remote_url))]
    fn pull(&mut self) -> Result<SyncStats> {
        self.ensure_clone()?;

        let fetch = self.git(&["fetch", "--quiet", "--prune", REMOTE])?;
        if !fetch.success() {
            return Err(SyncFailure::Unreachable(fetch.message()).into());
        }

        // Nothing published on this branch yet.
        let Some(upstream) = self.upstream()? else {
            return Ok(SyncStats::default());
        };

        let (ahead, behind) = self.ahead_behind(&upstream)?;
        if behind == 0 {
            return Ok(SyncStats::default());
        }
        if ahead > 0 {
            return Err(SyncFailure::Diverged { ahead, behind }.into());
        }

        let merge = self.git(&["merge", "--ff-only", "--quiet", &upstream])?;
        if !merge.success() {
            return Err(SyncFailure::Transport(merge.message()).into());
        }
        tracing::info!(commits = behind, "fast-forwarded cache");
        Ok(SyncStats {
            pulled: behind,
            pushed: 0,
        })
    }

    #[instrument(skip(self), fields(url = %self.remote_url))]
    fn push(&mut self, message: &str) -> Result<SyncStats> {
        self.ensure_clone()?;

        self.git_ok(&["add", "--all"])?;
        let status = self.git_ok(&["status", "--porcelain"])?;
        if !status.trim().is_empty() {
            let name = format!("user.name={}", self.author);
            let email = format!("user.email={}@users.noreply.promptdir", self.author);
            self.git_ok(&[
                "-c",
                &name,
                "-c",
                &email,
                "-c",
                "commit.gpgsign=false",
                "commit",
                "--quiet",
                "-m",
                message,
            ])?;
        }

        let ahead = match self.upstream()? {
            Some(upstream) => self.ahead_behind(&upstream)?.0,
            None if self.has_ref("HEAD")? => self.count("HEAD")?,
            None => 0,
        };
        if ahead == 0 {
            return Ok(SyncStats::default());
        }

        let refspec = format!("HEAD:refs/heads/{}", self.branch()?);
        let push = self.git(&["push", "--quiet", REMOTE, &refspec])?;
        if !push.success() {
            let reason = push.message();
            return Err(if is_unreachable(&reason) {
                SyncFailure::Unreachable(reason)
            } else {
                SyncFailure::Rejected(reason)
            }
            .into());
        }
        tracing::info!(commits = ahead, "pushed snippets");
        Ok(SyncStats {
            pulled: 0,
            pushed: ahead,
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

fn is_unreachable(stderr: &str) -> bool {
    [
        "Could not read from remote",
        "unable to access",
        "Could not resolve host",
        "does not appear to be a git repository",
    ]
    .iter()
    .any(|needle| stderr.contains(needle))
}
