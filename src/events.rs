use serde::Deserialize;

use crate::errors::TriggerError;
use crate::models::{ChangeRequestRef, CompletionEvent};

/// Inbound completion signal, one variant per supported shape.
///
/// Transport and signature verification happen upstream; this is the
/// validated boundary between the raw delivery and the pipeline.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InboundEvent {
    CheckSuiteCompleted(CheckSuitePayload),
    WorkflowRunCompleted(WorkflowRunPayload),
}

#[derive(Debug, Deserialize)]
pub struct CheckSuitePayload {
    pub conclusion: Option<String>,
    pub head_sha: String,
    pub head_branch: Option<String>,
    #[serde(default)]
    pub pull_requests: Vec<PullRequestRef>,
    pub app: AppRef,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowRunPayload {
    /// Workflow name, used for named-workflow trigger matching
    pub name: String,
    pub conclusion: Option<String>,
    pub head_sha: String,
    pub head_branch: Option<String>,
    #[serde(default)]
    pub pull_requests: Vec<PullRequestRef>,
}

#[derive(Debug, Deserialize)]
pub struct AppRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    pub head: Option<CommitRef>,
}

#[derive(Debug, Deserialize)]
pub struct CommitRef {
    pub sha: Option<String>,
    #[serde(rename = "ref")]
    pub branch: Option<String>,
}

impl InboundEvent {
    /// Parse and validate a raw JSON delivery
    pub fn parse(raw: &str) -> Result<CompletionEvent, TriggerError> {
        let event: InboundEvent = serde_json::from_str(raw)
            .map_err(|e| TriggerError::MalformedEvent(e.to_string()))?;
        event.normalize()
    }

    /// Normalize into the shape the pipeline consumes
    pub fn normalize(self) -> Result<CompletionEvent, TriggerError> {
        let (conclusion, head_sha, head_branch, pull_requests, system) = match self {
            InboundEvent::CheckSuiteCompleted(p) => (
                p.conclusion,
                p.head_sha,
                p.head_branch,
                p.pull_requests,
                p.app.name,
            ),
            InboundEvent::WorkflowRunCompleted(p) => (
                p.conclusion,
                p.head_sha,
                p.head_branch,
                p.pull_requests,
                p.name,
            ),
        };

        if head_sha.is_empty() {
            return Err(TriggerError::MalformedEvent(
                "event has no head revision".to_string(),
            ));
        }

        let change_requests = pull_requests
            .into_iter()
            .map(|pr| ChangeRequestRef {
                number: pr.number,
                head_revision: pr.head.as_ref().and_then(|h| h.sha.clone()),
                head_branch: pr.head.and_then(|h| h.branch),
            })
            .collect();

        Ok(CompletionEvent {
            conclusion,
            head_revision: head_sha,
            head_branch,
            change_requests,
            originating_system: system,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_suite_event() {
        let raw = r#"{
            "event": "check_suite_completed",
            "conclusion": "success",
            "head_sha": "abc123",
            "head_branch": "feature/foo",
            "app": {"name": "GitHub Actions"},
            "pull_requests": [
                {"number": 42, "head": {"sha": "abc123", "ref": "feature/foo"}}
            ]
        }"#;

        let event = InboundEvent::parse(raw).unwrap();
        assert_eq!(event.head_revision, "abc123");
        assert_eq!(event.originating_system, "GitHub Actions");
        assert_eq!(event.change_requests.len(), 1);
        assert_eq!(event.change_requests[0].number, 42);
        assert_eq!(
            event.change_requests[0].head_revision.as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_parse_workflow_run_event() {
        let raw = r#"{
            "event": "workflow_run_completed",
            "name": "CI",
            "conclusion": "success",
            "head_sha": "def456",
            "pull_requests": []
        }"#;

        let event = InboundEvent::parse(raw).unwrap();
        assert_eq!(event.originating_system, "CI");
        assert!(event.change_requests.is_empty());
        assert!(event.head_branch.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_shape() {
        let raw = r#"{"event": "push", "head_sha": "abc"}"#;
        let err = InboundEvent::parse(raw).unwrap_err();
        assert!(matches!(err, TriggerError::MalformedEvent(_)));
    }

    #[test]
    fn test_parse_rejects_empty_revision() {
        let raw = r#"{
            "event": "check_suite_completed",
            "conclusion": null,
            "head_sha": "",
            "app": {"name": "CI"}
        }"#;

        let err = InboundEvent::parse(raw).unwrap_err();
        assert!(err.to_string().contains("no head revision"));
    }

    #[test]
    fn test_pull_request_without_head() {
        let raw = r#"{
            "event": "check_suite_completed",
            "conclusion": "failure",
            "head_sha": "abc123",
            "app": {"name": "CI"},
            "pull_requests": [{"number": 7, "head": null}]
        }"#;

        let event = InboundEvent::parse(raw).unwrap();
        assert!(event.change_requests[0].head_revision.is_none());
    }
}
