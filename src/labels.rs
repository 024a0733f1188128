use async_trait::async_trait;
use tracing::{debug, warn};

/// Review progress labels on the change request, intended mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateLabel {
    Needed,
    InProgress,
    Complete,
}

impl StateLabel {
    pub fn name(&self) -> &'static str {
        match self {
            StateLabel::Needed => "ai-review-needed",
            StateLabel::InProgress => "ai-review-in-progress",
            StateLabel::Complete => "ai-review-complete",
        }
    }
}

/// Platform label operations, treated as idempotent set operations
#[async_trait]
pub trait LabelApi: Send + Sync {
    async fn update(
        &self,
        repo: &str,
        number: u64,
        add: &[&str],
        remove: &[&str],
    ) -> anyhow::Result<()>;
}

/// Best-effort state-label transitions.
///
/// Failures are logged and swallowed; a label glitch must never block or
/// fail the review pipeline.
pub struct ReviewLifecycleLabeler<L: LabelApi> {
    api: L,
}

impl<L: LabelApi> ReviewLifecycleLabeler<L> {
    pub fn new(api: L) -> Self {
        Self { api }
    }

    /// On gate acquisition: mark the review as running
    pub async fn mark_in_progress(&self, repo: &str, number: u64) {
        self.apply(
            repo,
            number,
            &[StateLabel::InProgress.name()],
            &[StateLabel::Needed.name(), StateLabel::Complete.name()],
        )
        .await;
    }

    /// On executor success: mark the review as done
    pub async fn mark_complete(&self, repo: &str, number: u64) {
        self.apply(
            repo,
            number,
            &[StateLabel::Complete.name()],
            &[StateLabel::InProgress.name(), StateLabel::Needed.name()],
        )
        .await;
    }

    /// On executor failure: clear the in-progress marker, leaving no state
    /// label to signal "needs attention"
    pub async fn revert_in_progress(&self, repo: &str, number: u64) {
        self.apply(repo, number, &[], &[StateLabel::InProgress.name()])
            .await;
    }

    /// Get the underlying label API for direct access
    pub fn api(&self) -> &L {
        &self.api
    }

    async fn apply(&self, repo: &str, number: u64, add: &[&str], remove: &[&str]) {
        match self.api.update(repo, number, add, remove).await {
            Ok(()) => debug!(repo, number, ?add, ?remove, "Updated state labels"),
            Err(e) => warn!(repo, number, error = %e, "Label update failed, continuing"),
        }
    }
}
