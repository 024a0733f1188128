use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::TriggerMode;
use crate::errors::TriggerError;
use crate::evaluator::{CheckSuiteSource, CompletionEvaluator};
use crate::executor::ReviewExecutor;
use crate::gate::DeduplicationGate;
use crate::labels::{LabelApi, ReviewLifecycleLabeler};
use crate::models::{ChangeRequestRef, CompletionEvent, ItemOutcome, SkipReason};

/// Restart-surviving dedup check: was a review artifact already published
/// for this revision?
#[async_trait]
pub trait HistoryQuery: Send + Sync {
    async fn has_existing_review_marker(
        &self,
        repo: &str,
        number: u64,
        revision: &str,
    ) -> Result<bool, TriggerError>;
}

/// Publishes the review artifact embedding the revision marker
#[async_trait]
pub trait ReviewPublisher: Send + Sync {
    async fn publish(
        &self,
        repo: &str,
        number: u64,
        revision: &str,
        summary: &str,
    ) -> anyhow::Result<()>;
}

/// Top-level handler for one inbound completion event.
///
/// Fans out per associated change request with settle-all semantics: one
/// item's failure never aborts its siblings. Transport-level success is the
/// caller's concern; business outcomes live in the returned list.
pub struct ReviewTriggerOrchestrator<S, L, E, H, P>
where
    S: CheckSuiteSource,
    L: LabelApi,
    E: ReviewExecutor,
    H: HistoryQuery,
    P: ReviewPublisher,
{
    evaluator: CompletionEvaluator<S>,
    labeler: ReviewLifecycleLabeler<L>,
    executor: E,
    history: H,
    publisher: P,
    gate: Arc<DeduplicationGate>,
    mode: TriggerMode,
}

impl<S, L, E, H, P> ReviewTriggerOrchestrator<S, L, E, H, P>
where
    S: CheckSuiteSource,
    L: LabelApi,
    E: ReviewExecutor,
    H: HistoryQuery,
    P: ReviewPublisher,
{
    pub fn new(
        evaluator: CompletionEvaluator<S>,
        labeler: ReviewLifecycleLabeler<L>,
        executor: E,
        history: H,
        publisher: P,
        gate: Arc<DeduplicationGate>,
        mode: TriggerMode,
    ) -> Self {
        Self {
            evaluator,
            labeler,
            executor,
            history,
            publisher,
            gate,
            mode,
        }
    }

    /// Handle one completion event for the given repository
    #[instrument(skip(self, event), fields(repo, system = %event.originating_system))]
    pub async fn handle(&self, repo: &str, event: &CompletionEvent) -> Vec<ItemOutcome> {
        if let TriggerMode::NamedWorkflow(ref wanted) = self.mode {
            if &event.originating_system != wanted {
                info!(
                    system = %event.originating_system,
                    wanted = %wanted,
                    "Ignoring completion from non-trigger system"
                );
                return Vec::new();
            }
        }

        let outcomes = join_all(
            event
                .change_requests
                .iter()
                .map(|item| self.process_item(repo, event, item)),
        )
        .await;

        let reviewed = outcomes.iter().filter(|o| o.success).count();
        let skipped = outcomes.iter().filter(|o| o.skipped_reason.is_some()).count();
        let failed = outcomes.len() - reviewed - skipped;
        info!(reviewed, skipped, failed, "Completion event handled");

        outcomes
    }

    async fn process_item(
        &self,
        repo: &str,
        event: &CompletionEvent,
        item: &ChangeRequestRef,
    ) -> ItemOutcome {
        let number = item.number;

        let Some(revision) = item.head_revision.as_deref() else {
            warn!(number, "Change request has no head revision, skipping");
            return ItemOutcome::skipped(number, SkipReason::MissingRevision);
        };

        let ready = match self.is_ready(repo, revision, event).await {
            Ok(ready) => ready,
            Err(e) => {
                warn!(number, error = %e, "Readiness check failed, will retry on next event");
                return ItemOutcome::failed(number, e.to_string());
            }
        };

        if !ready {
            return ItemOutcome::skipped(number, SkipReason::NotReady);
        }

        match self
            .history
            .has_existing_review_marker(repo, number, revision)
            .await
        {
            Ok(true) => {
                info!(number, revision, "Review artifact already published for this revision");
                return ItemOutcome::skipped(number, SkipReason::AlreadyReviewed);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(number, error = %e, "History check failed, will retry on next event");
                return ItemOutcome::failed(number, e.to_string());
            }
        }

        let request_id = Uuid::new_v4();
        let acquisition = self.gate.try_acquire(repo, number, revision, request_id);
        if !acquisition.acquired() {
            info!(number, revision, ?acquisition, "Duplicate suppressed by gate");
            return ItemOutcome::skipped(number, SkipReason::Duplicate);
        }

        self.labeler.mark_in_progress(repo, number).await;

        let branch = item
            .head_branch
            .as_deref()
            .or(event.head_branch.as_deref());
        let prompt = build_prompt(repo, number, branch, revision);

        match self.executor.run(repo, number, branch, &prompt).await {
            Ok(summary) => {
                self.gate.mark_completed(repo, number, revision);

                if let Err(e) = self
                    .publisher
                    .publish(repo, number, revision, &summary)
                    .await
                {
                    warn!(number, error = %e, "Failed to publish review summary");
                }

                self.labeler.mark_complete(repo, number).await;
                info!(number, revision, request_id = %request_id, "Review completed");
                ItemOutcome::reviewed(number)
            }
            Err(e) => {
                // Revert so a later duplicate delivery can retry
                self.labeler.revert_in_progress(repo, number).await;
                self.gate.release(repo, number, revision);
                warn!(number, revision, error = %e, "Review executor failed");
                ItemOutcome::failed(number, e.to_string())
            }
        }
    }

    async fn is_ready(
        &self,
        repo: &str,
        revision: &str,
        event: &CompletionEvent,
    ) -> Result<bool, TriggerError> {
        match self.mode {
            TriggerMode::WaitForAll => self.evaluator.evaluate(repo, revision).await,
            // The named suite's own conclusion is the whole signal
            TriggerMode::NamedWorkflow(_) => {
                Ok(event.conclusion.as_deref() == Some("success"))
            }
        }
    }
}

fn build_prompt(repo: &str, number: u64, branch: Option<&str>, revision: &str) -> String {
    let branch_line = branch
        .map(|b| format!("Branch: {}\n", b))
        .unwrap_or_default();

    format!(
        "Review pull request #{number} in {repo} at revision {revision}.\n{branch_line}\
         All CI checks have settled. Provide a concise review summary of the\n\
         changes, flagging correctness, security, and performance issues.",
    )
}
