use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use check_trigger::evaluator::CheckSuiteSource;
use check_trigger::labels::LabelApi;
use check_trigger::models::{CheckConclusion, CheckStatus};
use check_trigger::GitHubClient;

fn label_json(name: &str) -> serde_json::Value {
    json!({
        "id": 1,
        "node_id": "L_1",
        "url": format!("https://api.github.com/repos/o/r/labels/{}", name),
        "name": name,
        "description": null,
        "color": "ededed",
        "default": false
    })
}

#[tokio::test]
async fn test_list_check_suites_maps_wire_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/commits/abc123/check-suites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "check_suites": [
                {
                    "id": 11,
                    "status": "completed",
                    "conclusion": "success",
                    "app": {"name": "GitHub Actions"},
                    "created_at": "2026-08-30T10:00:00Z",
                    "updated_at": "2026-08-30T10:05:00Z",
                    "latest_check_runs_count": 3
                },
                {
                    "id": 12,
                    "status": "queued",
                    "conclusion": null,
                    "app": {"name": "CodeQL"},
                    "created_at": "2026-08-30T10:00:00Z",
                    "updated_at": "2026-08-30T10:00:00Z",
                    "latest_check_runs_count": 0
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = GitHubClient::with_base_uri("test-token", &server.uri()).unwrap();

    let suites = client.list_for_revision("o/r", "abc123").await.unwrap();

    assert_eq!(suites.len(), 2);
    assert_eq!(suites[0].id, 11);
    assert_eq!(suites[0].status, CheckStatus::Completed);
    assert_eq!(suites[0].conclusion, Some(CheckConclusion::Success));
    assert_eq!(suites[0].origin_app, "GitHub Actions");
    assert_eq!(suites[0].run_count, 3);

    assert_eq!(suites[1].status, CheckStatus::Queued);
    assert!(suites[1].conclusion.is_none());
    assert_eq!(suites[1].run_count, 0);
}

#[tokio::test]
async fn test_label_update_adds_then_removes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/repos/o/r/issues/42/labels"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([label_json("ai-review-in-progress")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        // octocrab percent-encodes label names (including hyphens) on the wire
        .and(path("/repos/o/r/issues/42/labels/ai%2Dreview%2Dneeded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::with_base_uri("test-token", &server.uri()).unwrap();

    client
        .update("o/r", 42, &["ai-review-in-progress"], &["ai-review-needed"])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_removing_absent_label_is_tolerated() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        // octocrab percent-encodes label names (including hyphens) on the wire
        .and(path("/repos/o/r/issues/42/labels/ai%2Dreview%2Din%2Dprogress"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Label does not exist",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&server)
        .await;

    let client = GitHubClient::with_base_uri("test-token", &server.uri()).unwrap();

    client
        .update("o/r", 42, &[], &["ai-review-in-progress"])
        .await
        .unwrap();
}

