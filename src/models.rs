use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a check suite as reported by the CI platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Completed,
}

/// Conclusion of a completed check suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
    Neutral,
    Skipped,
}

/// One CI system's grouped report of checks against a revision.
///
/// Fetched fresh per evaluation; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSuite {
    pub id: u64,
    pub status: CheckStatus,
    pub conclusion: Option<CheckConclusion>,
    /// Name of the app/system that owns this suite
    pub origin_app: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of check runs attached to the suite
    pub run_count: u32,
}

impl CheckSuite {
    /// Whether the suite finished with a passing conclusion
    pub fn is_successful(&self) -> bool {
        self.status == CheckStatus::Completed && self.conclusion == Some(CheckConclusion::Success)
    }
}

/// A change request associated with a completion event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequestRef {
    pub number: u64,
    pub head_revision: Option<String>,
    pub head_branch: Option<String>,
}

/// Normalized completion signal, produced from a validated inbound event
#[derive(Debug, Clone)]
pub struct CompletionEvent {
    pub conclusion: Option<String>,
    pub head_revision: String,
    pub head_branch: Option<String>,
    pub change_requests: Vec<ChangeRequestRef>,
    /// Name of the CI system that reported completion
    pub originating_system: String,
}

/// Why a change request was skipped this round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    MissingRevision,
    NotReady,
    Duplicate,
    AlreadyReviewed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::MissingRevision => "missing-revision",
            SkipReason::NotReady => "not-ready",
            SkipReason::Duplicate => "duplicate",
            SkipReason::AlreadyReviewed => "already-reviewed",
        };
        f.write_str(s)
    }
}

/// Per-change-request outcome of handling one completion event
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub number: u64,
    pub success: bool,
    pub error: Option<String>,
    pub skipped_reason: Option<SkipReason>,
}

impl ItemOutcome {
    pub fn reviewed(number: u64) -> Self {
        Self {
            number,
            success: true,
            error: None,
            skipped_reason: None,
        }
    }

    pub fn skipped(number: u64, reason: SkipReason) -> Self {
        Self {
            number,
            success: false,
            error: None,
            skipped_reason: Some(reason),
        }
    }

    pub fn failed(number: u64, error: impl Into<String>) -> Self {
        Self {
            number,
            success: false,
            error: Some(error.into()),
            skipped_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_is_successful() {
        let mut suite = CheckSuite {
            id: 1,
            status: CheckStatus::Completed,
            conclusion: Some(CheckConclusion::Success),
            origin_app: "CI".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            run_count: 3,
        };
        assert!(suite.is_successful());

        suite.conclusion = Some(CheckConclusion::Failure);
        assert!(!suite.is_successful());

        suite.conclusion = Some(CheckConclusion::Success);
        suite.status = CheckStatus::InProgress;
        assert!(!suite.is_successful());
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::Duplicate.to_string(), "duplicate");
        assert_eq!(SkipReason::MissingRevision.to_string(), "missing-revision");
    }

    #[test]
    fn test_status_serde() {
        let status: CheckStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, CheckStatus::InProgress);

        let conclusion: Option<CheckConclusion> = serde_json::from_str("null").unwrap();
        assert!(conclusion.is_none());
    }
}
