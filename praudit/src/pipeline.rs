//! Orchestrates one audit run: sync, config discovery, scan, report.
//!
//! Working copies are addressed only by repository name, so runs for the
//! same name are serialized through an internal lock map; without it,
//! concurrent checkouts would corrupt each other's branch state and one
//! run's cleanup could delete the copy out from under another.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument};

use crate::config::RepoConfig;
use crate::error::AuditError;
use crate::repo::{RepoRef, Workspaces};
use crate::report::render_report;
use crate::scanner::Scanner;

pub struct AuditPipeline {
    workspaces: Workspaces,
    scanner: Scanner,
    locks: RepoLocks,
}

impl AuditPipeline {
    /// Creates a pipeline that keeps working copies under `workroot`.
    pub fn new(workroot: impl Into<PathBuf>) -> Self {
        Self {
            workspaces: Workspaces::new(workroot),
            scanner: Scanner::default(),
            locks: RepoLocks::default(),
        }
    }

    pub fn with_scanner(mut self, scanner: Scanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_git_timeout(mut self, timeout: Duration) -> Self {
        self.workspaces = self.workspaces.with_git_timeout(timeout);
        self
    }

    /// Runs the full pipeline for one repository branch and returns the
    /// rendered report body.
    ///
    /// The working copy never outlives the run: its guard removes the
    /// directory on success, failure, and cancellation alike.
    #[instrument(skip(self), fields(repo = %repo.name, branch = %repo.branch))]
    pub async fn run(&self, repo: &RepoRef) -> Result<String, AuditError> {
        let _serialized = self.locks.acquire(&repo.name).await;

        let workdir = self.workspaces.ensure_local(repo).await?;
        self.workspaces.checkout(&workdir, &repo.branch).await?;

        let config = RepoConfig::load(workdir.path());
        let package_location = config
            .as_ref()
            .and_then(|c| c.package_location.as_deref());
        debug!(?package_location, "manifest location resolved");

        let outcome = self.scanner.scan(workdir.path(), package_location).await?;
        info!("scan finished");

        Ok(render_report(&outcome))
    }
}

/// One async mutex per repository name, created on first use.
#[derive(Default)]
struct RepoLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl RepoLocks {
    async fn acquire(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().expect("lock map poisoned");
            map.entry(name.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
