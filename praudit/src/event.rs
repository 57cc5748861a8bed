//! Inbound pull-request event surface.
//!
//! Delivery and authentication belong to the hosting webhook framework;
//! this is only the payload slice the pipeline consumes.

use serde::Deserialize;

use crate::error::SyncError;
use crate::github::PrHandle;
use crate::repo::RepoRef;

/// Fixed body posted when an event carries the dry-run flag.
pub const DRY_RUN_COMMENT: &str = "Dry Run Complete";

/// Pull-request actions that trigger an audit.
const TRIGGER_ACTIONS: &[&str] = &["opened", "reopened", "synchronize"];

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub clone_url: String,
    pub repo: String,
    pub owner: String,
    pub pr_number: u64,
    /// Head branch ref of the pull request.
    pub branch: String,
    #[serde(default)]
    pub dry_run: bool,
}

impl PullRequestEvent {
    pub fn triggers_audit(&self) -> bool {
        TRIGGER_ACTIONS.contains(&self.action.as_str())
    }

    pub fn pr(&self) -> PrHandle {
        PrHandle {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            number: self.pr_number,
        }
    }

    /// Validates the payload-sourced name and branch into a [`RepoRef`].
    pub fn repo_ref(&self) -> Result<RepoRef, SyncError> {
        RepoRef::new(&self.clone_url, &self.repo, &self.branch)
    }
}
