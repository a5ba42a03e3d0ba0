use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use review_gate_action::recording::{Direction, RecordedEvent};
use review_gate_action::{run, Config, RecordingLogger, RepositorySlug, RunError, RunOutcome};
use review_gate_core::{AuthorizedReviewersSource, Decision, PullRequestRef, ReviewState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::net::TcpListener;

const TOKEN: &str = "test-token";

#[derive(Debug, Clone)]
struct SeenRequest {
    path: String,
    page: u32,
    per_page: Option<String>,
    authorization: Option<String>,
    api_version: Option<String>,
}

#[derive(Clone)]
struct MockGitHub {
    pages: Arc<Vec<Vec<Value>>>,
    status: StatusCode,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockGitHub {
    fn with_pages(pages: Vec<Vec<Value>>) -> Self {
        Self {
            pages: Arc::new(pages),
            status: StatusCode::OK,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::with_pages(Vec::new())
        }
    }

    fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

async fn list_reviews(
    State(mock): State<MockGitHub>,
    Path((owner, repo, number)): Path<(String, String, u64)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let page: u32 = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    mock.seen.lock().unwrap().push(SeenRequest {
        path: format!("{}/{}/{}", owner, repo, number),
        page,
        per_page: params.get("per_page").cloned(),
        authorization: header("authorization"),
        api_version: header("x-github-api-version"),
    });

    if !mock.status.is_success() {
        return (mock.status, "upstream exploded").into_response();
    }

    let body = mock
        .pages
        .get(page as usize - 1)
        .cloned()
        .unwrap_or_default();
    Json(Value::Array(body)).into_response()
}

async fn start_server(mock: MockGitHub) -> String {
    let app = Router::new()
        .route(
            "/repos/{owner}/{repo}/pulls/{number}/reviews",
            get(list_reviews),
        )
        .with_state(mock);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn review(id: u64, login: Option<&str>, state: &str, commit: &str) -> Value {
    json!({
        "id": id,
        "user": login.map(|l| json!({"login": l, "id": id + 1000})),
        "body": "",
        "state": state,
        "commit_id": commit,
        "submitted_at": "2024-05-01T12:00:00Z"
    })
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn pull_request_event(&self, number: u64, head_sha: &str) -> PathBuf {
        self.write(
            "event.json",
            &json!({
                "action": "synchronize",
                "pull_request": {
                    "number": number,
                    "head": {"sha": head_sha, "ref": "feature"},
                    "merge_commit_sha": "merge123"
                }
            })
            .to_string(),
        )
    }

    fn config(&self, api_url: &str, event_path: PathBuf, reviewers: &str) -> Config {
        Config {
            credential: TOKEN.to_string(),
            authorized_reviewers_source: AuthorizedReviewersSource::File(
                self.write("reviewers.json", reviewers),
            ),
            repository: RepositorySlug {
                owner: "octo-org".to_string(),
                name: "widgets".to_string(),
            },
            event_path,
            api_url: api_url.to_string(),
            recording_log_path: None,
        }
    }
}

fn expect_decision(outcome: RunOutcome) -> Decision {
    match outcome {
        RunOutcome::Evaluated { decision, .. } => decision,
        RunOutcome::NotApplicable => panic!("expected an evaluation"),
    }
}

#[tokio::test]
async fn test_authorized_approval_on_head_commit_passes() {
    let mock = MockGitHub::with_pages(vec![vec![
        review(1, Some("carol"), "APPROVED", "sha1"),
        review(2, Some("alice"), "CHANGES_REQUESTED", "sha1"),
        review(3, Some("alice"), "APPROVED", "sha1"),
    ]]);
    let api_url = start_server(mock.clone()).await;
    let fixture = Fixture::new();
    let config = fixture.config(
        &api_url,
        fixture.pull_request_event(7, "sha1"),
        r#"["alice", "bob"]"#,
    );

    let outcome = run(&config, None).await.unwrap();

    match outcome {
        RunOutcome::Evaluated {
            pull_request,
            decision: Decision::Pass(review),
        } => {
            assert_eq!(pull_request, PullRequestRef::new(7, "sha1"));
            assert_eq!(review.author_login.as_deref(), Some("alice"));
            assert_eq!(review.state, ReviewState::Approved);
        }
        other => panic!("expected pass, got {:?}", other),
    }

    let seen = mock.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "octo-org/widgets/7");
    assert_eq!(seen[0].per_page.as_deref(), Some("100"));
    assert_eq!(
        seen[0].authorization.as_deref(),
        Some("Bearer test-token")
    );
    assert_eq!(seen[0].api_version.as_deref(), Some("2022-11-28"));
}

#[tokio::test]
async fn test_stale_approval_fails() {
    let mock = MockGitHub::with_pages(vec![vec![review(1, Some("alice"), "APPROVED", "sha0")]]);
    let api_url = start_server(mock).await;
    let fixture = Fixture::new();
    let config = fixture.config(
        &api_url,
        fixture.pull_request_event(7, "sha1"),
        r#"["alice", "bob"]"#,
    );

    let decision = expect_decision(run(&config, None).await.unwrap());
    assert_eq!(decision, Decision::Fail);
}

#[tokio::test]
async fn test_approval_by_deleted_account_fails() {
    let mock = MockGitHub::with_pages(vec![vec![review(1, None, "APPROVED", "sha1")]]);
    let api_url = start_server(mock).await;
    let fixture = Fixture::new();
    let config = fixture.config(
        &api_url,
        fixture.pull_request_event(7, "sha1"),
        r#"["alice", "ghost"]"#,
    );

    let decision = expect_decision(run(&config, None).await.unwrap());
    assert_eq!(decision, Decision::Fail);
}

#[tokio::test]
async fn test_no_reviews_fails() {
    let mock = MockGitHub::with_pages(vec![]);
    let api_url = start_server(mock).await;
    let fixture = Fixture::new();
    let config = fixture.config(&api_url, fixture.pull_request_event(7, "sha1"), r#"["alice"]"#);

    let decision = expect_decision(run(&config, None).await.unwrap());
    assert_eq!(decision, Decision::Fail);
}

#[tokio::test]
async fn test_approval_on_second_page_is_found() {
    let first_page: Vec<Value> = (0..100)
        .map(|i| review(i, Some("bob"), "COMMENTED", "sha1"))
        .collect();
    let second_page = vec![review(100, Some("alice"), "APPROVED", "sha1")];
    let mock = MockGitHub::with_pages(vec![first_page, second_page]);
    let api_url = start_server(mock.clone()).await;
    let fixture = Fixture::new();
    let config = fixture.config(&api_url, fixture.pull_request_event(7, "sha1"), r#"["alice"]"#);

    let decision = expect_decision(run(&config, None).await.unwrap());
    assert_eq!(
        decision.matching_review().and_then(|r| r.author_login.as_deref()),
        Some("alice")
    );

    let pages: Vec<u32> = mock.seen().iter().map(|r| r.page).collect();
    assert_eq!(pages, vec![1, 2]);
}

#[tokio::test]
async fn test_full_page_followed_by_empty_page_stops() {
    let first_page: Vec<Value> = (0..100)
        .map(|i| review(i, Some("bob"), "APPROVED", "sha0"))
        .collect();
    let mock = MockGitHub::with_pages(vec![first_page]);
    let api_url = start_server(mock.clone()).await;
    let fixture = Fixture::new();
    let config = fixture.config(&api_url, fixture.pull_request_event(7, "sha1"), r#"["bob"]"#);

    let decision = expect_decision(run(&config, None).await.unwrap());
    assert_eq!(decision, Decision::Fail);

    let pages: Vec<u32> = mock.seen().iter().map(|r| r.page).collect();
    assert_eq!(pages, vec![1, 2]);
}

#[tokio::test]
async fn test_event_without_pull_request_is_not_applicable() {
    let mock = MockGitHub::with_pages(vec![]);
    let api_url = start_server(mock.clone()).await;
    let fixture = Fixture::new();
    let event = fixture.write("event.json", r#"{"ref": "refs/heads/main", "commits": []}"#);
    let mut config = fixture.config(&api_url, event, r#"["alice"]"#);
    // Not read at all when there is nothing to check
    config.authorized_reviewers_source =
        AuthorizedReviewersSource::File(fixture.path("does-not-exist.json"));

    let outcome = run(&config, None).await.unwrap();
    assert_eq!(outcome, RunOutcome::NotApplicable);
    assert!(mock.seen().is_empty());
}

#[tokio::test]
async fn test_missing_reviewers_file_is_config_error_before_fetching() {
    let mock = MockGitHub::with_pages(vec![vec![review(1, Some("alice"), "APPROVED", "sha1")]]);
    let api_url = start_server(mock.clone()).await;
    let fixture = Fixture::new();
    let mut config = fixture.config(&api_url, fixture.pull_request_event(7, "sha1"), "[]");
    config.authorized_reviewers_source =
        AuthorizedReviewersSource::File(fixture.path("missing.json"));

    let err = run(&config, None).await.unwrap_err();
    assert!(matches!(err, RunError::Config(_)), "{:?}", err);
    assert!(err.failure_message().contains("missing.json"));
    assert!(mock.seen().is_empty());
}

#[tokio::test]
async fn test_unreadable_event_is_config_error() {
    let fixture = Fixture::new();
    let config = fixture.config(
        "http://127.0.0.1:9",
        fixture.path("no-event.json"),
        r#"["alice"]"#,
    );

    let err = run(&config, None).await.unwrap_err();
    assert!(matches!(err, RunError::Config(_)), "{:?}", err);
}

#[tokio::test]
async fn test_upstream_error_status_is_fatal() {
    let mock = MockGitHub::failing(StatusCode::BAD_GATEWAY);
    let api_url = start_server(mock).await;
    let fixture = Fixture::new();
    let config = fixture.config(&api_url, fixture.pull_request_event(7, "sha1"), r#"["alice"]"#);

    let err = run(&config, None).await.unwrap_err();
    assert!(matches!(err, RunError::Upstream(_)), "{:?}", err);
    let message = err.failure_message();
    assert!(message.starts_with("Caught an error: GitHub API error listing reviews: 502"));
    assert!(message.contains("upstream exploded"));
}

#[tokio::test]
async fn test_unreachable_api_is_fatal() {
    // Grab a free port, then close it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fixture = Fixture::new();
    let config = fixture.config(
        &format!("http://{}", addr),
        fixture.pull_request_event(7, "sha1"),
        r#"["alice"]"#,
    );

    let err = run(&config, None).await.unwrap_err();
    assert!(matches!(err, RunError::Upstream(_)), "{:?}", err);
    assert!(err
        .failure_message()
        .contains("Failed to send list reviews request"));
}

#[tokio::test]
async fn test_recording_log_captures_sanitized_traffic() {
    let mock = MockGitHub::with_pages(vec![vec![review(1, Some("alice"), "APPROVED", "sha1")]]);
    let api_url = start_server(mock).await;
    let fixture = Fixture::new();
    let config = fixture.config(&api_url, fixture.pull_request_event(7, "sha1"), r#"["alice"]"#);
    let log_path = fixture.path("recordings.jsonl");

    let logger = RecordingLogger::new(log_path.clone()).await.unwrap();
    let outcome = run(&config, Some(&logger)).await.unwrap();
    logger.finish().await;
    assert!(expect_decision(outcome).is_pass());

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(!contents.contains(TOKEN));

    let events: Vec<RecordedEvent> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].direction, Direction::Request);
    assert_eq!(
        events[0].operation,
        "GET /repos/octo-org/widgets/pulls/7/reviews"
    );
    assert_eq!(events[0].data["headers"]["authorization"], "[REDACTED]");
    assert_eq!(events[1].direction, Direction::Response);
    assert_eq!(events[1].operation, "response_200");
    assert_eq!(events[0].correlation_id, events[1].correlation_id);
}
