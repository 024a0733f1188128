use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{CheckConclusion, CheckStatus, CheckSuite};

/// Classification of a single check suite against the readiness decision.
///
/// A pure function of the suite's fields and the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuiteClass {
    /// The suite's outcome affects review-readiness
    Meaningful,
    /// Concluded neutral or skipped; carries no signal
    SkippedNeutral,
    /// Queued past the conditional-job timeout; assumed never scheduled
    SkippedTimeout,
    /// Queued with zero runs past the grace period; misconfigured integration
    SkippedEmpty,
    /// In progress but not updated within the stale threshold; abandoned
    SkippedStale,
}

impl SuiteClass {
    pub fn is_meaningful(&self) -> bool {
        matches!(self, SuiteClass::Meaningful)
    }
}

impl std::fmt::Display for SuiteClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SuiteClass::Meaningful => "meaningful",
            SuiteClass::SkippedNeutral => "skipped-neutral",
            SuiteClass::SkippedTimeout => "skipped-timeout",
            SuiteClass::SkippedEmpty => "skipped-empty",
            SuiteClass::SkippedStale => "skipped-stale",
        };
        f.write_str(s)
    }
}

/// Thresholds the classifier applies, derived from [`crate::config::Config`]
#[derive(Debug, Clone, Copy)]
pub struct ClassifierThresholds {
    pub conditional_job_timeout: chrono::Duration,
    pub stale_in_progress_timeout: chrono::Duration,
    pub empty_suite_grace: chrono::Duration,
}

/// Classify one check suite at `now`.
///
/// Rules apply in priority order; the first match wins.
pub fn classify(suite: &CheckSuite, now: DateTime<Utc>, thresholds: &ClassifierThresholds) -> SuiteClass {
    if matches!(
        suite.conclusion,
        Some(CheckConclusion::Neutral) | Some(CheckConclusion::Skipped)
    ) {
        return SuiteClass::SkippedNeutral;
    }

    let age = now - suite.created_at;

    if suite.status == CheckStatus::Queued && age > thresholds.conditional_job_timeout {
        return SuiteClass::SkippedTimeout;
    }

    if suite.status == CheckStatus::Queued
        && suite.run_count == 0
        && age > thresholds.empty_suite_grace
    {
        return SuiteClass::SkippedEmpty;
    }

    if suite.status == CheckStatus::InProgress
        && (now - suite.updated_at) > thresholds.stale_in_progress_timeout
    {
        return SuiteClass::SkippedStale;
    }

    SuiteClass::Meaningful
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn thresholds() -> ClassifierThresholds {
        ClassifierThresholds {
            conditional_job_timeout: Duration::minutes(5),
            stale_in_progress_timeout: Duration::minutes(30),
            empty_suite_grace: Duration::seconds(60),
        }
    }

    fn suite(status: CheckStatus, conclusion: Option<CheckConclusion>, age: Duration) -> CheckSuite {
        let now = Utc::now();
        CheckSuite {
            id: 1,
            status,
            conclusion,
            origin_app: "CI".to_string(),
            created_at: now - age,
            updated_at: now - age,
            run_count: 1,
        }
    }

    #[test]
    fn test_neutral_conclusion_wins_regardless_of_age() {
        let now = Utc::now();

        // An ancient queued suite would otherwise be skipped-timeout
        let s = suite(
            CheckStatus::Queued,
            Some(CheckConclusion::Skipped),
            Duration::hours(2),
        );
        assert_eq!(classify(&s, now, &thresholds()), SuiteClass::SkippedNeutral);

        let s = suite(
            CheckStatus::Completed,
            Some(CheckConclusion::Neutral),
            Duration::seconds(1),
        );
        assert_eq!(classify(&s, now, &thresholds()), SuiteClass::SkippedNeutral);
    }

    #[test]
    fn test_queued_timeout_boundary() {
        let now = Utc::now();
        let timeout = Duration::minutes(5);

        let over = suite(
            CheckStatus::Queued,
            None,
            timeout + Duration::milliseconds(1),
        );
        assert_eq!(classify(&over, now, &thresholds()), SuiteClass::SkippedTimeout);

        let under = suite(
            CheckStatus::Queued,
            None,
            timeout - Duration::milliseconds(1),
        );
        assert_eq!(classify(&under, now, &thresholds()), SuiteClass::Meaningful);
    }

    #[test]
    fn test_empty_queued_suite_past_grace() {
        let now = Utc::now();
        let mut s = suite(CheckStatus::Queued, None, Duration::seconds(90));
        s.run_count = 0;

        assert_eq!(classify(&s, now, &thresholds()), SuiteClass::SkippedEmpty);

        // With runs attached the grace rule does not apply
        s.run_count = 2;
        assert_eq!(classify(&s, now, &thresholds()), SuiteClass::Meaningful);
    }

    #[test]
    fn test_stale_in_progress() {
        let now = Utc::now();
        let s = suite(CheckStatus::InProgress, None, Duration::minutes(45));
        assert_eq!(classify(&s, now, &thresholds()), SuiteClass::SkippedStale);

        let fresh = suite(CheckStatus::InProgress, None, Duration::minutes(10));
        assert_eq!(classify(&fresh, now, &thresholds()), SuiteClass::Meaningful);
    }

    #[test]
    fn test_completed_failure_is_meaningful() {
        let now = Utc::now();
        let s = suite(
            CheckStatus::Completed,
            Some(CheckConclusion::Failure),
            Duration::minutes(1),
        );
        assert_eq!(classify(&s, now, &thresholds()), SuiteClass::Meaningful);
    }

    #[test]
    fn test_stale_uses_updated_at_not_created_at() {
        let now = Utc::now();
        let mut s = suite(CheckStatus::InProgress, None, Duration::hours(2));
        // Recently touched, so not abandoned even though it started long ago
        s.updated_at = now - Duration::minutes(1);
        assert_eq!(classify(&s, now, &thresholds()), SuiteClass::Meaningful);
    }
}
