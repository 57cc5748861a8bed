//! GitHub comment client and the bot-comment replacement flow.
//!
//! The authenticated API client the webhook framework hands out is modeled
//! as the [`CommentApi`] trait; [`GitHubClient`] is the REST implementation
//! used when the pipeline runs standalone.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::AuditError;

pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Login of the automated account whose stale comments get replaced.
pub const BOT_LOGIN: &str = "npm-audit-security-tool[bot]";

/// Where a report comment lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrHandle {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    pub user: CommentAuthor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentAuthor {
    pub login: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl IssueComment {
    /// True only for comments authored by our own bot identity: exact login
    /// match plus the automated account-type marker. Comments from humans
    /// and from other bots are never touched.
    pub fn is_own_bot_comment(&self) -> bool {
        self.user.kind == "Bot" && self.user.login == BOT_LOGIN
    }
}

/// The comment operations the pipeline needs from its host. Implemented by
/// [`GitHubClient`]; tests substitute fakes.
#[async_trait]
pub trait CommentApi: Send + Sync {
    async fn list_comments(&self, pr: &PrHandle) -> Result<Vec<IssueComment>>;
    async fn delete_comment(&self, pr: &PrHandle, id: u64) -> Result<()>;
    async fn create_comment(&self, pr: &PrHandle, body: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base(GITHUB_API_BASE, token)
    }

    /// Points the client at a different API root (mock servers in tests).
    pub fn with_base(base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("praudit")
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
            base: base.into(),
            token,
        }
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request
    }

    async fn send_checked(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{url} returned HTTP {status}");
        }
        Ok(response)
    }

    fn comments_url(&self, pr: &PrHandle) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.base, pr.owner, pr.repo, pr.number
        )
    }
}

#[async_trait]
impl CommentApi for GitHubClient {
    #[instrument(skip(self), fields(pr = pr.number))]
    async fn list_comments(&self, pr: &PrHandle) -> Result<Vec<IssueComment>> {
        let url = self.comments_url(pr);
        let response = self
            .send_checked(self.request(reqwest::Method::GET, &url), &url)
            .await?;
        response
            .json()
            .await
            .with_context(|| format!("failed to parse JSON from {url}"))
    }

    #[instrument(skip(self), fields(pr = pr.number))]
    async fn delete_comment(&self, pr: &PrHandle, id: u64) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/comments/{id}",
            self.base, pr.owner, pr.repo
        );
        self.send_checked(self.request(reqwest::Method::DELETE, &url), &url)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, body), fields(pr = pr.number))]
    async fn create_comment(&self, pr: &PrHandle, body: &str) -> Result<()> {
        let url = self.comments_url(pr);
        let payload = serde_json::json!({ "body": body });
        self.send_checked(self.request(reqwest::Method::POST, &url).json(&payload), &url)
            .await?;
        Ok(())
    }
}

/// Replaces any prior bot-authored comments on the PR with `body`.
///
/// Stale deletions run before the new comment is posted and are best-effort:
/// a failed listing or a failed individual deletion is logged and never
/// blocks posting. A failed create is fatal.
#[instrument(skip(api, body), fields(pr = pr.number))]
pub async fn replace_bot_comment(
    api: &dyn CommentApi,
    pr: &PrHandle,
    body: &str,
) -> Result<(), AuditError> {
    let stale: Vec<IssueComment> = match api.list_comments(pr).await {
        Ok(comments) => comments
            .into_iter()
            .filter(IssueComment::is_own_bot_comment)
            .collect(),
        Err(e) => {
            warn!(error = %e, "failed to list existing comments, skipping deletion");
            Vec::new()
        }
    };

    debug!(stale = stale.len(), "deleting prior bot comments");
    let deletions = join_all(stale.iter().map(|c| api.delete_comment(pr, c.id))).await;
    for (comment, result) in stale.iter().zip(deletions) {
        if let Err(e) = result {
            warn!(comment = comment.id, error = %e, "failed to delete stale comment");
        }
    }

    api.create_comment(pr, body).await.map_err(AuditError::Comment)
}
