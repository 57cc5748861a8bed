//! Pull-request dependency auditing: sync a repository branch, run the npm
//! audit scanner, render a plain-text report, and keep exactly one bot
//! comment on the PR.
//!
//! Webhook delivery and API authentication live outside this crate. A
//! hosting framework hands a [`PullRequestEvent`] and a [`CommentApi`]
//! implementation to [`handle_event`]; everything else is internal.

pub mod config;
pub mod error;
pub mod event;
pub mod github;
pub mod pipeline;
pub mod repo;
pub mod report;
pub mod scanner;

pub use config::RepoConfig;
pub use error::{AuditError, ScannerError, SyncError};
pub use event::{DRY_RUN_COMMENT, PullRequestEvent};
pub use github::{BOT_LOGIN, CommentApi, GitHubClient, PrHandle, replace_bot_comment};
pub use pipeline::AuditPipeline;
pub use repo::RepoRef;
pub use report::render_report;
pub use scanner::{ScanOutcome, Scanner};

use tracing::debug;

/// Entry point for one webhook delivery.
///
/// Unrecognized actions are ignored. A dry-run event short-circuits the
/// pipeline and posts the fixed placeholder body. Otherwise the pipeline
/// runs and the bot comment on the PR is replaced with the fresh report;
/// sync and scan-parse failures propagate without posting anything.
pub async fn handle_event(
    pipeline: &AuditPipeline,
    api: &dyn CommentApi,
    event: &PullRequestEvent,
) -> Result<(), AuditError> {
    if !event.triggers_audit() {
        debug!(action = %event.action, "ignoring pull request action");
        return Ok(());
    }

    let pr = event.pr();
    if event.dry_run {
        return api
            .create_comment(&pr, DRY_RUN_COMMENT)
            .await
            .map_err(AuditError::Comment);
    }

    let repo = event.repo_ref()?;
    let report = pipeline.run(&repo).await?;
    replace_bot_comment(api, &pr, &report).await
}
