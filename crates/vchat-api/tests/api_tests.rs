//! Router-level tests against a scripted model service.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

use vchat_api::{create_router, ApiConfig, AppState};
use vchat_models::{AssetState, KEY_MOMENTS_PROMPT};
use vchat_session::testing::ScriptedService;
use vchat_session::{PollPolicy, SessionConfig};

const BOUNDARY: &str = "vchat-test-boundary";

struct TestApp {
    router: Router,
    service: Arc<ScriptedService>,
    scratch: TempDir,
}

impl TestApp {
    fn new(service: ScriptedService) -> Self {
        Self::with_config(service, ApiConfig::default())
    }

    fn with_config(service: ScriptedService, config: ApiConfig) -> Self {
        let poll = PollPolicy::default()
            .with_interval(Duration::from_millis(1))
            .with_max_attempts(20);
        Self::with_poll(service, config, poll)
    }

    fn with_poll(service: ScriptedService, config: ApiConfig, poll: PollPolicy) -> Self {
        let scratch = tempfile::tempdir().unwrap();
        let service = Arc::new(service);
        let session_config = SessionConfig::default()
            .with_scratch_dir(scratch.path())
            .with_poll(poll);
        let state = AppState::with_service(config, service.clone(), session_config);

        Self {
            router: create_router(state, None),
            service,
            scratch,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        assert_ok!(self.router.clone().oneshot(request).await)
    }

    fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch.path()).unwrap().count()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn create_session(&self) -> String {
        let response = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/api/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn interact(&self, session_id: &str, filename: &str, prompt: Option<&str>) -> Response {
        let body = multipart_body(Some((filename, b"fake video bytes")), prompt);
        self.send(
            Request::builder()
                .method("POST")
                .uri(format!("/api/sessions/{}/interactions", session_id))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

fn multipart_body(video: Option<(&str, &[u8])>, prompt: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((filename, data)) = video {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(prompt) = prompt {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"prompt\"\r\n\r\n{}\r\n",
                BOUNDARY, prompt
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn json(response: Response) -> Value {
    serde_json::from_str(&text(response).await).unwrap()
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new(ScriptedService::new(vec![AssetState::Active]));

    for uri in ["/health", "/healthz"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "healthy");
    }
}

#[tokio::test]
async fn test_ready_checks_scratch_dir_and_capacity() {
    let app = TestApp::new(ScriptedService::new(vec![AssetState::Active]));
    let response = app.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["scratch_dir"]["status"], "ok");

    let full = TestApp::with_config(
        ScriptedService::new(vec![AssetState::Active]),
        ApiConfig {
            max_sessions: 1,
            ..ApiConfig::default()
        },
    );
    full.create_session().await;
    let response = full.get("/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(response).await["checks"]["sessions"]["status"], "error");
}

#[tokio::test]
async fn test_index_serves_upload_form() {
    let app = TestApp::new(ScriptedService::new(vec![AssetState::Active]));
    let response = app.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-Request-ID"));
    let csp = response.headers()["Content-Security-Policy"].to_str().unwrap();
    assert!(csp.contains("media-src 'self' blob:"));
    let body = text(response).await;
    assert!(body.contains("<form"));
    assert!(body.contains("name=\"video\""));
    assert!(body.contains("<video id=\"preview\""));
    assert!(body.contains("renderMarkdown"));
}

#[tokio::test]
async fn test_formats_lists_all_extensions() {
    let app = TestApp::new(ScriptedService::new(vec![AssetState::Active]));
    let body = json(app.get("/api/formats").await).await;

    let formats = body["formats"].as_array().unwrap();
    assert_eq!(formats.len(), 6);
    assert!(formats
        .iter()
        .any(|f| f["extension"] == "mov" && f["mime_type"] == "video/quicktime"));
    assert_eq!(body["default_mime_type"], "video/mp4");
}

#[tokio::test]
async fn test_end_to_end_mov_interaction() {
    let app = TestApp::new(
        ScriptedService::new(vec![AssetState::Processing, AssetState::Active])
            .with_response("Describe this video", Some("A dog catches a frisbee."))
            .with_response(KEY_MOMENTS_PROMPT, Some("0:02 throw\n\n0:05 catch\n")),
    );
    let session_id = app.create_session().await;

    let response = app
        .interact(&session_id, "clip.mov", Some("Describe this video"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/markdown; charset=utf-8"
    );

    let body = text(response).await;
    assert!(body.starts_with("A dog catches a frisbee."));
    assert!(body.contains("### Summary:"));
    assert!(body.contains("- 0:02 throw\n- 0:05 catch\n"));
    assert!(body.contains("**Q1:** Describe this video"));
    assert!(body.contains("**A1:** A dog catches a frisbee."));

    let uploads = app.service.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].mime_type, "video/quicktime");
    assert!(!uploads[0].path.exists());
    assert_eq!(app.service.delete_calls(), 1);
    assert_eq!(app.service.inactive_generate_calls(), 0);

    let history = json(app.get(&format!("/api/sessions/{}", session_id)).await).await;
    let turns = history["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["prompt"], "Describe this video");
}

#[tokio::test]
async fn test_history_accumulates_across_interactions() {
    let app = TestApp::new(ScriptedService::new(vec![AssetState::Active]));
    let session_id = app.create_session().await;

    app.interact(&session_id, "a.mp4", Some("first")).await;
    let response = app.interact(&session_id, "b.mkv", Some("second")).await;
    let body = text(response).await;

    assert!(body.contains("**Q1:** first"));
    assert!(body.contains("**Q2:** second"));
    assert_eq!(app.service.delete_calls(), 2);
}

#[tokio::test]
async fn test_unsupported_format_is_rejected_before_upload() {
    let app = TestApp::new(ScriptedService::new(vec![AssetState::Active]));
    let session_id = app.create_session().await;

    let response = app.interact(&session_id, "slides.pdf", Some("hi")).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(json(response).await["code"], "unsupported_format");
    assert!(app.service.uploads().is_empty());
    assert_eq!(app.service.delete_calls(), 0);
}

#[tokio::test]
async fn test_missing_video_field() {
    let app = TestApp::new(ScriptedService::new(vec![AssetState::Active]));
    let session_id = app.create_session().await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri(format!("/api/sessions/{}/interactions", session_id))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(None, Some("hello"))))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_processing_maps_to_422_and_deletes() {
    let app = TestApp::new(ScriptedService::new(vec![AssetState::Processing, AssetState::Failed]));
    let session_id = app.create_session().await;

    let response = app.interact(&session_id, "clip.avi", Some("What?")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.service.prompts().is_empty());
    assert_eq!(app.service.delete_calls(), 1);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = TestApp::new(ScriptedService::new(vec![AssetState::Active]));

    let response = app.get("/api/sessions/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(response).await["code"], "not_found");

    let response = app.interact("does-not-exist", "clip.mp4", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.service.uploads().is_empty());
}

#[tokio::test]
async fn test_delete_session() {
    let app = TestApp::new(ScriptedService::new(vec![AssetState::Active]));
    let session_id = app.create_session().await;
    let uri = format!("/api/sessions/{}", session_id);

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(app.send(delete()).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.send(delete()).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&uri).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_limit_is_503() {
    let app = TestApp::with_config(
        ScriptedService::new(vec![AssetState::Active]),
        ApiConfig {
            max_sessions: 1,
            ..ApiConfig::default()
        },
    );
    app.create_session().await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_rate_limiting() {
    let app = TestApp::with_config(
        ScriptedService::new(vec![AssetState::Active]),
        ApiConfig {
            rate_limit_rps: 2,
            ..ApiConfig::default()
        },
    );

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let response = app
            .send(
                Request::builder()
                    .uri("/api/formats")
                    .header("X-Forwarded-For", "192.168.1.100")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        statuses.push(response.status());
    }

    assert_eq!(
        statuses,
        vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );
}

#[tokio::test]
async fn test_client_disconnect_cancels_poll_but_cleans_up() {
    let app = TestApp::with_poll(
        ScriptedService::new(vec![AssetState::Processing]),
        ApiConfig::default(),
        PollPolicy::default()
            .with_interval(Duration::from_millis(10))
            .with_max_attempts(10_000),
    );
    let session_id = app.create_session().await;

    // The request future is dropped while the asset is still processing.
    let request = app.interact(&session_id, "clip.mp4", Some("Anything?"));
    assert_err!(tokio::time::timeout(Duration::from_millis(150), request).await);

    for _ in 0..100 {
        if app.service.delete_calls() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(app.service.delete_calls(), 1);
    assert!(app.service.status_calls() > 0);

    let status_calls = app.service.status_calls();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(app.service.status_calls(), status_calls);
    assert!(app.service.prompts().is_empty());
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_interaction_refreshes_session_activity() {
    let app = TestApp::new(
        ScriptedService::new(vec![AssetState::Active]).with_generate_delay(Duration::from_millis(100)),
    );
    let session_id = app.create_session().await;

    let started = chrono::Utc::now();
    let response = app.interact(&session_id, "clip.mp4", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let session = json(app.get(&format!("/api/sessions/{}", session_id)).await).await;
    let last_active: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(session["last_active_at"].clone()).unwrap();
    // Two generation calls ran after the interaction started.
    assert!(last_active - started >= chrono::Duration::milliseconds(200));
    assert!(session["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_streamed_upload_leaves_no_scratch_files() {
    let app = TestApp::new(ScriptedService::new(vec![AssetState::Active]));
    let session_id = app.create_session().await;

    let response = app.interact(&session_id, "clip.mkv", Some("Describe this video")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let uploads = app.service.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].size, b"fake video bytes".len() as u64);
    assert_eq!(app.scratch_entries(), 0);
}
