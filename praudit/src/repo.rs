//! Local working copies: clone-or-update, checkout, guaranteed removal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::error::SyncError;

const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(60);

/// One unit of audit work: where to fetch from, what to call the local
/// working copy, and which branch to inspect.
///
/// Name and branch come straight from webhook payloads, so both are
/// validated against an allow-list before any subprocess sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub clone_url: String,
    pub name: String,
    pub branch: String,
}

impl RepoRef {
    pub fn new(clone_url: &str, name: &str, branch: &str) -> Result<Self, SyncError> {
        if !valid_name(name) {
            return Err(SyncError::InvalidName(name.to_string()));
        }
        if !valid_branch(branch) {
            return Err(SyncError::InvalidBranch(branch.to_string()));
        }
        Ok(Self {
            clone_url: clone_url.to_string(),
            name: name.to_string(),
            branch: branch.to_string(),
        })
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn valid_branch(branch: &str) -> bool {
    !branch.is_empty()
        && !branch.starts_with('-')
        && !branch.contains("..")
        && branch
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
}

/// Owning handle for one run's working copy.
///
/// The directory is removed when the handle drops, so cleanup happens on
/// success, on error, and when the run future is cancelled mid-flight.
/// Removal is best-effort: a failure is logged, never propagated.
#[derive(Debug)]
pub struct Workdir {
    path: PathBuf,
}

impl Workdir {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workdir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove working copy");
            }
        }
    }
}

/// Creates and updates working copies under a single root directory.
#[derive(Debug, Clone)]
pub struct Workspaces {
    root: PathBuf,
    git_timeout: Duration,
}

impl Workspaces {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            git_timeout: DEFAULT_GIT_TIMEOUT,
        }
    }

    pub fn with_git_timeout(mut self, timeout: Duration) -> Self {
        self.git_timeout = timeout;
        self
    }

    /// Ensures a local working copy of `repo` exists and is current: a fresh
    /// clone when absent, a fast-forward pull when a copy is already on disk
    /// (a leftover from an interrupted run).
    #[instrument(skip(self), fields(repo = %repo.name))]
    pub async fn ensure_local(&self, repo: &RepoRef) -> Result<Workdir, SyncError> {
        let path = self.root.join(&repo.name);

        if path.is_dir() {
            debug!(path = %path.display(), "working copy exists, pulling");
            self.git(&path, "pull", &["pull", "--ff-only"]).await?;
        } else {
            tokio::fs::create_dir_all(&self.root).await?;
            debug!(path = %path.display(), "cloning");
            self.git(&self.root, "clone", &["clone", "--", &repo.clone_url, &repo.name])
                .await?;
        }

        Ok(Workdir { path })
    }

    /// Switches the working copy to `branch`. A branch that does not exist
    /// on the remote is a [`SyncError`].
    #[instrument(skip(self, workdir))]
    pub async fn checkout(&self, workdir: &Workdir, branch: &str) -> Result<(), SyncError> {
        self.git(workdir.path(), "checkout", &["checkout", "-q", branch])
            .await
    }

    async fn git(
        &self,
        cwd: &Path,
        operation: &'static str,
        args: &[&str],
    ) -> Result<(), SyncError> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(cwd).kill_on_drop(true);

        let output = tokio::time::timeout(self.git_timeout, cmd.output())
            .await
            .map_err(|_| SyncError::Timeout {
                operation,
                seconds: self.git_timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(SyncError::Git {
                operation,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
