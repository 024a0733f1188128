use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::classifier::{classify, ClassifierThresholds, SuiteClass};
use crate::config::Config;
use crate::errors::TriggerError;
use crate::models::CheckSuite;

/// Fresh check-suite listing for a revision
#[async_trait]
pub trait CheckSuiteSource: Send + Sync {
    async fn list_for_revision(
        &self,
        repo: &str,
        revision: &str,
    ) -> Result<Vec<CheckSuite>, TriggerError>;
}

/// Decides whether a revision is review-ready.
///
/// Waits out a debounce before reading, to absorb eventually-consistent
/// reports from independent CI systems, then fetches the current full suite
/// list rather than trusting the triggering event's partial view. Re-entrant:
/// repeated calls for a still-pending revision are side-effect-free reads.
pub struct CompletionEvaluator<S: CheckSuiteSource> {
    source: S,
    debounce: Duration,
    thresholds: ClassifierThresholds,
}

impl<S: CheckSuiteSource> CompletionEvaluator<S> {
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            source,
            debounce: config.debounce_delay(),
            thresholds: ClassifierThresholds {
                conditional_job_timeout: config.conditional_job_timeout(),
                stale_in_progress_timeout: config.stale_in_progress_timeout(),
                empty_suite_grace: config.empty_suite_grace(),
            },
        }
    }

    /// True iff every meaningful suite completed successfully
    #[instrument(skip(self), fields(repo, revision))]
    pub async fn evaluate(&self, repo: &str, revision: &str) -> Result<bool, TriggerError> {
        if !self.debounce.is_zero() {
            debug!(debounce_ms = self.debounce.as_millis() as u64, "Debouncing before evaluation");
            tokio::time::sleep(self.debounce).await;
        }

        let suites = self.source.list_for_revision(repo, revision).await?;
        Ok(self.verdict(&suites))
    }

    /// Classify every suite for operator-facing inspection
    pub async fn inspect(
        &self,
        repo: &str,
        revision: &str,
    ) -> Result<Vec<(CheckSuite, SuiteClass)>, TriggerError> {
        let suites = self.source.list_for_revision(repo, revision).await?;
        let now = Utc::now();
        Ok(suites
            .into_iter()
            .map(|s| {
                let class = classify(&s, now, &self.thresholds);
                (s, class)
            })
            .collect())
    }

    /// Get the underlying suite source for direct access
    pub fn source(&self) -> &S {
        &self.source
    }

    fn verdict(&self, suites: &[CheckSuite]) -> bool {
        if suites.is_empty() {
            debug!("No check suites reported yet");
            return false;
        }

        let now = Utc::now();
        let mut meaningful = 0usize;

        for suite in suites {
            let class = classify(suite, now, &self.thresholds);
            if !class.is_meaningful() {
                debug!(suite = suite.id, app = %suite.origin_app, %class, "Suite excluded from readiness");
                continue;
            }

            meaningful += 1;
            if !suite.is_successful() {
                debug!(
                    suite = suite.id,
                    app = %suite.origin_app,
                    status = ?suite.status,
                    conclusion = ?suite.conclusion,
                    "Meaningful suite not yet successful"
                );
                return false;
            }
        }

        // A non-empty list where every suite was skippable counts as passed
        if meaningful == 0 {
            info!(total = suites.len(), "All suites skippable, treating revision as passed");
        }

        true
    }
}
