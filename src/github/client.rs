use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::TriggerError;
use crate::evaluator::CheckSuiteSource;
use crate::labels::LabelApi;
use crate::models::{CheckConclusion, CheckStatus, CheckSuite};
use crate::orchestrator::{HistoryQuery, ReviewPublisher};

/// GitHub API client for check suites, labels, and review comments
#[derive(Clone)]
pub struct GitHubClient {
    client: Octocrab,
}

/// Wire shape of the check-suites listing
#[derive(Debug, Deserialize)]
struct CheckSuiteList {
    check_suites: Vec<ApiCheckSuite>,
}

#[derive(Debug, Deserialize)]
struct ApiCheckSuite {
    id: u64,
    status: String,
    conclusion: Option<String>,
    app: Option<ApiApp>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    latest_check_runs_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiApp {
    name: String,
}

impl ApiCheckSuite {
    fn into_model(self) -> CheckSuite {
        let status = match self.status.as_str() {
            "queued" => CheckStatus::Queued,
            "in_progress" => CheckStatus::InProgress,
            _ => CheckStatus::Completed,
        };

        // Cancelled/timed-out/action-required all block readiness the same
        // way a failure does
        let conclusion = self.conclusion.map(|c| match c.as_str() {
            "success" => CheckConclusion::Success,
            "neutral" => CheckConclusion::Neutral,
            "skipped" => CheckConclusion::Skipped,
            _ => CheckConclusion::Failure,
        });

        CheckSuite {
            id: self.id,
            status,
            conclusion,
            origin_app: self.app.map(|a| a.name).unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            run_count: self.latest_check_runs_count,
        }
    }
}

impl GitHubClient {
    /// Create a new GitHub client with the given token
    pub fn new(token: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .context("Failed to create GitHub client")?;

        Ok(Self { client })
    }

    /// Create a client against a non-default API base, used in tests
    pub fn with_base_uri(token: &str, base_uri: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .base_uri(base_uri)
            .context("Invalid GitHub API base URI")?
            .personal_token(token.to_string())
            .build()
            .context("Failed to create GitHub client")?;

        Ok(Self { client })
    }

    /// Post the review summary as a PR comment, embedding the revision
    /// marker that `has_existing_review_marker` later finds
    pub async fn post_review_comment(
        &self,
        repo: &str,
        number: u64,
        revision: &str,
        summary: &str,
    ) -> Result<u64> {
        let (owner, repo_name) = parse_repo(repo)?;

        info!(repo, number, "Posting review comment");

        let body = format!("{}\n\n{}\n", summary.trim_end(), revision_marker(revision));

        let comment = self
            .client
            .issues(owner, repo_name)
            .create_comment(number, body)
            .await
            .context("Failed to post review comment")?;

        debug!(comment_id = comment.id.0, "Review comment posted");

        Ok(comment.id.0)
    }
}

/// Hidden marker embedded in posted review comments
pub fn revision_marker(revision: &str) -> String {
    format!("<!-- ai-review:revision:{} -->", revision)
}

#[async_trait]
impl CheckSuiteSource for GitHubClient {
    async fn list_for_revision(
        &self,
        repo: &str,
        revision: &str,
    ) -> Result<Vec<CheckSuite>, TriggerError> {
        let (owner, repo_name) =
            parse_repo(repo).map_err(|e| TriggerError::fetch("check suites", e))?;

        debug!(repo, revision, "Listing check suites");

        let listing: CheckSuiteList = self
            .client
            .get(
                format!("/repos/{}/{}/commits/{}/check-suites", owner, repo_name, revision),
                None::<&()>,
            )
            .await
            .map_err(|e| TriggerError::fetch("check suites", e))?;

        Ok(listing
            .check_suites
            .into_iter()
            .map(ApiCheckSuite::into_model)
            .collect())
    }
}

#[async_trait]
impl LabelApi for GitHubClient {
    async fn update(
        &self,
        repo: &str,
        number: u64,
        add: &[&str],
        remove: &[&str],
    ) -> Result<()> {
        let (owner, repo_name) = parse_repo(repo)?;
        let issues = self.client.issues(owner, repo_name);

        if !add.is_empty() {
            let labels: Vec<String> = add.iter().map(|s| s.to_string()).collect();
            issues
                .add_labels(number, &labels)
                .await
                .context("Failed to add labels")?;
        }

        for label in remove {
            match issues.remove_label(number, label).await {
                Ok(_) => {}
                // Removing an absent label keeps the operation idempotent
                Err(octocrab::Error::GitHub { source, .. })
                    if source.status_code.as_u16() == 404 => {}
                Err(e) => return Err(e).context("Failed to remove label"),
            }
        }

        Ok(())
    }
}

#[async_trait]
impl HistoryQuery for GitHubClient {
    async fn has_existing_review_marker(
        &self,
        repo: &str,
        number: u64,
        revision: &str,
    ) -> Result<bool, TriggerError> {
        let (owner, repo_name) =
            parse_repo(repo).map_err(|e| TriggerError::fetch("review history", e))?;

        let marker = revision_marker(revision);

        let page = self
            .client
            .issues(owner, repo_name)
            .list_comments(number)
            .per_page(100)
            .send()
            .await
            .map_err(|e| TriggerError::fetch("review history", e))?;

        let comments = self
            .client
            .all_pages(page)
            .await
            .map_err(|e| TriggerError::fetch("review history", e))?;

        Ok(comments
            .iter()
            .any(|c| c.body.as_deref().is_some_and(|b| b.contains(&marker))))
    }
}

#[async_trait]
impl ReviewPublisher for GitHubClient {
    async fn publish(
        &self,
        repo: &str,
        number: u64,
        revision: &str,
        summary: &str,
    ) -> Result<()> {
        self.post_review_comment(repo, number, revision, summary)
            .await?;
        Ok(())
    }
}

/// Parse owner and repo from a repo string like "owner/repo"
pub fn parse_repo(repo: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = repo.split('/').collect();
    if parts.len() != 2 {
        anyhow::bail!("Invalid repo format. Expected 'owner/repo', got: {}", repo);
    }
    Ok((parts[0], parts[1]))
}
