//! Backend endpoint tests against a local mock server.

use decide_client::{ApiClient, ClientConfig, ClientError, IssueCreateRequest, ListIssuesParams};
use decide_core::{CardAction, CostImpact, Issue, Urgency};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(ClientConfig::new(&server.uri()).with_user("person-7")).unwrap()
}

fn issue_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Retention policy",
        "text": "Keep logs for 30 days",
        "tags": ["privacy"],
        "status": "PENDING",
        "submitter_id": "person-7",
        "created_at": "2026-10-01T09:00:00Z",
        "updated_at": "2026-10-01T09:00:00Z"
    })
}

#[tokio::test]
async fn create_issue_posts_body_with_user_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/issues/"))
        .and(header("X-User-ID", "person-7"))
        .and(body_json(json!({
            "text": "Keep logs for 30 days",
            "title": "Retention policy",
            "tags": ["privacy"],
            "urgency": "HIGH",
            "cost_impact": "LOW"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issue_id": "issue-1",
            "run_id": "run-1",
            "status": "PENDING"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let issue = Issue {
        title: "Retention policy".to_string(),
        description: "Keep logs for 30 days".to_string(),
        tags: vec!["privacy".to_string()],
        urgency: Urgency::High,
        cost_impact: CostImpact::Low,
        timeline_days: None,
    };
    let created = client(&server)
        .create_issue(&IssueCreateRequest::from(&issue))
        .await
        .unwrap();
    assert_eq!(created.issue_id, "issue-1");
    assert_eq!(created.run_id, "run-1");
}

#[tokio::test]
async fn list_issues_sends_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/issues/"))
        .and(query_param("limit", "20"))
        .and(query_param("my_issues", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json("issue-1")])))
        .mount(&server)
        .await;

    let params = ListIssuesParams {
        limit: Some(20),
        my_issues: Some(true),
        ..Default::default()
    };
    let issues = client(&server).list_issues(&params).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, "issue-1");
}

#[tokio::test]
async fn failed_status_carries_body_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/issues/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("issue not found"))
        .mount(&server)
        .await;

    let err = client(&server).get_issue("missing").await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert!(err.to_string().contains("issue not found"));
}

#[tokio::test]
async fn failed_status_without_body_says_so() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/persons/me"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client(&server).current_user().await.unwrap_err();
    assert!(err.to_string().contains("No response body"));
}

#[tokio::test]
async fn no_content_reads_as_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/decisions/card-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let card = client(&server).decision_card("card-1").await.unwrap();
    assert!(card.is_none());
}

#[tokio::test]
async fn no_content_where_a_body_is_required_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/issues/issue-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let err = client(&server).get_issue("issue-1").await.unwrap_err();
    assert!(matches!(err, ClientError::NoContent(_)));
}

#[tokio::test]
async fn graphs_default_missing_arrays_and_send_limits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/graphs/full"))
        .and(query_param("max_nodes", "500"))
        .and(query_param("max_edges", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [{"id": "p-1", "name": "Kim"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/graphs/run-1/subgraph"))
        .and(query_param("max_nodes", "120"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let api = client(&server);
    let full = api.full_graph(Some(500), Some(1000)).await.unwrap();
    assert_eq!(full.nodes.len(), 1);
    assert!(full.edges.is_empty());
    let sub = api.subgraph("run-1", 120).await.unwrap();
    assert!(sub.is_empty());
}

#[tokio::test]
async fn card_action_posts_actor_and_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/decisions/card-1/reject"))
        .and(body_json(json!({
            "approver_id": "person-7",
            "reason": "over budget"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "REJECTED"})))
        .expect(1)
        .mount(&server)
        .await;

    let action = CardAction::Reject {
        reason: "over budget".to_string(),
        comment: None,
    };
    let body = client(&server).card_action("card-1", &action).await.unwrap();
    assert_eq!(body, Some(json!({"status": "REJECTED"})));
}

#[tokio::test]
async fn invalid_card_action_never_reaches_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let action = CardAction::Withdraw {
        reason: "  ".to_string(),
    };
    let err = client(&server).card_action("card-1", &action).await.unwrap_err();
    assert!(matches!(err, ClientError::Domain(_)));
}

#[tokio::test]
async fn timeline_parses_audit_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/audit/runs/run-1/timeline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "a-1",
            "event_type": "ISSUE_CREATED",
            "event_timestamp": "2026-10-01T09:00:00Z",
            "actor_id": "person-7"
        }])))
        .mount(&server)
        .await;

    let timeline = client(&server).run_timeline("run-1").await.unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].event_type, "ISSUE_CREATED");
}
