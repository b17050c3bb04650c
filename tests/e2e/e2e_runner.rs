use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
use axum::routing::post;
use problem_fetch::runner::{DECODE_ERROR_PREFIX, REQUEST_ERROR_PREFIX};
use problem_fetch::{Outcome, Runner, RunnerConfig};
use serde::Deserialize;
use sonic_rs::JsonValueTrait;
use tokio::net::TcpListener;
use tokio::time::sleep;

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ReceivedQuery {
    display_id: u64,
    discussion_count: bool,
    judge_info: bool,
    judge_info_to_be_preprocessed: bool,
    last_submission_and_last_accepted_submission: bool,
    localized_contents_of_locale: String,
    permission_of_current_user: bool,
    samples: bool,
    statistics: bool,
    tags_of_locale: String,
}

#[derive(Clone, Debug)]
struct Captured {
    content_type: Option<String>,
    body: Bytes,
}

#[derive(Clone, Default)]
struct AppState {
    captured: Arc<Mutex<Vec<Captured>>>,
}

#[tokio::test]
async fn e2e_prints_json_reply() {
    let server = TestServer::start().await;
    let runner = Runner::new(RunnerConfig::for_base_url(&server.base_url));

    let outcome = runner.run().await;

    let body = outcome.body().expect("example reply should decode");
    assert_eq!(body.get("displayId").and_then(|v| v.as_u64()), Some(1002));
    assert_eq!(body.get("title").and_then(|v| v.as_str()), Some("Example"));
    let printed = outcome.to_string();
    assert!(printed.contains(r#""displayId":1002"#), "printed {printed}");
    assert!(printed.contains(r#""title":"Example""#), "printed {printed}");
}

#[tokio::test]
async fn e2e_request_carries_json_header_and_exact_payload() {
    let server = TestServer::start().await;
    let runner = Runner::new(RunnerConfig::for_base_url(&server.base_url));

    runner.run().await;

    let captured = server.captured();
    assert_eq!(captured.len(), 1, "exactly one request should be sent");
    let request = &captured[0];
    assert_eq!(request.content_type.as_deref(), Some("application/json"));

    let received: ReceivedQuery =
        sonic_rs::from_slice(&request.body).expect("body should match the fixed query shape");
    assert_eq!(
        received,
        ReceivedQuery {
            display_id: 1002,
            discussion_count: true,
            judge_info: true,
            judge_info_to_be_preprocessed: true,
            last_submission_and_last_accepted_submission: true,
            localized_contents_of_locale: "zh_CN".to_string(),
            permission_of_current_user: true,
            samples: true,
            statistics: true,
            tags_of_locale: "zh_CN".to_string(),
        }
    );
}

#[tokio::test]
async fn e2e_slow_server_prints_timeout_message() {
    let server = TestServer::start().await;
    let config = RunnerConfig {
        url: server.url("/slow"),
        timeout: Duration::from_millis(200),
    };

    let outcome = Runner::new(config).run().await;

    assert!(matches!(outcome, Outcome::Timeout), "got {outcome:?}");
    assert_eq!(outcome.to_string(), "请求超时");
}

#[tokio::test]
async fn e2e_refused_connection_prints_error_description() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind closed-port listener");
        listener.local_addr().expect("closed-port addr")
    };
    let config = RunnerConfig::for_base_url(&format!("http://{addr}"))
        .with_timeout(Duration::from_secs(2));

    let outcome = Runner::new(config).run().await;

    assert!(matches!(outcome, Outcome::RequestFailed(_)), "got {outcome:?}");
    let printed = outcome.to_string();
    assert!(printed.starts_with(REQUEST_ERROR_PREFIX), "printed {printed}");
    assert!(
        printed.to_lowercase().contains("refused"),
        "cause should be embedded: {printed}"
    );
    assert!(printed.contains(&addr.to_string()), "printed {printed}");
}

#[tokio::test]
async fn e2e_non_json_reply_is_reported_not_raised() {
    let server = TestServer::start().await;
    let config = RunnerConfig {
        url: server.url("/html"),
        timeout: Duration::from_secs(2),
    };

    let outcome = Runner::new(config).run().await;

    assert!(matches!(outcome, Outcome::Undecodable(_)), "got {outcome:?}");
    assert!(outcome.to_string().starts_with(DECODE_ERROR_PREFIX));
}

#[tokio::test]
async fn e2e_server_error_with_json_body_is_printed() {
    let server = TestServer::start().await;
    let config = RunnerConfig {
        url: server.url("/error"),
        timeout: Duration::from_secs(2),
    };

    let outcome = Runner::new(config).run().await;

    match &outcome {
        Outcome::Success { status, .. } => assert_eq!(*status, 500),
        other => panic!("expected decoded error body, got {other:?}"),
    }
    assert_eq!(outcome.to_string(), r#"{"error":"INTERNAL"}"#);
}

struct TestServer {
    base_url: String,
    state: AppState,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let state = AppState::default();
        let app = Router::new()
            .route("/api/problem/getProblem", post(problem_handler))
            .route("/slow", post(slow_handler))
            .route("/html", post(html_handler))
            .route("/error", post(error_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url,
            state,
            task,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn captured(&self) -> Vec<Captured> {
        self.state
            .captured
            .lock()
            .expect("captured requests mutex")
            .clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn problem_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(&'static str, &'static str); 1], &'static str) {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state
        .captured
        .lock()
        .expect("captured requests mutex")
        .push(Captured { content_type, body });
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"displayId":1002,"title":"Example"}"#,
    )
}

async fn slow_handler() -> (StatusCode, &'static str) {
    sleep(Duration::from_secs(2)).await;
    (StatusCode::OK, r#"{"displayId":1002}"#)
}

async fn html_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "<html><body>maintenance</body></html>")
}

async fn error_handler() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"INTERNAL"}"#)
}
