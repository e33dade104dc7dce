//! Integration tests for the backend client.
//!
//! Each test binds an in-process Axum router to an ephemeral port and points
//! a real [`ForestApi`] at it, so request shapes, headers, and response
//! folding are exercised over actual HTTP.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::significant_drop_tightening
)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use forest_client::{
    ClientConfig, ClientError, ForestApi, ForestBackend, PipelineQuery, PipelineWatcher,
    SubmissionError, SubmissionPolicy, SubmissionRequest, submit_capture,
};
use forest_types::{CreatureKind, PipelineState, RosterPage};
use serde_json::{Value, json};

/// Everything the fake backend saw, plus scripted status replies.
#[derive(Default)]
struct Recorded {
    auth_headers: Vec<Option<String>>,
    status_queries: Vec<HashMap<String, String>>,
    status_script: VecDeque<Value>,
    reports: Vec<Value>,
    approvals: Vec<Value>,
    asset_queries: Vec<HashMap<String, String>>,
    queue_job_ids: Vec<String>,
    deleted: Vec<String>,
    capture_busy: bool,
}

type Shared = Arc<Mutex<Recorded>>;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["pin"] == "123456" {
        (StatusCode::OK, Json(json!({"ok": true, "token": "tok-1", "name": "Staff"})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"ok": false, "error": "bad pin"})))
    }
}

async fn latest_animals(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    state.lock().unwrap().auth_headers.push(bearer(&headers));
    Json(json!({
        "items": [
            {"filename": "sky_1.png", "type": "sky", "url": "/static/animations/sky_1.png"},
            {"filename": "water_1.png", "type": "water", "url": "/static/animations/water_1.png"}
        ]
    }))
}

async fn pipeline_status(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut guard = state.lock().unwrap();
    guard.status_queries.push(params);
    let reply = guard
        .status_script
        .pop_front()
        .unwrap_or_else(|| json!({"state": "IDLE", "progress": 0, "message": "Ready", "version": 1}));
    Json(reply)
}

async fn capture_process(State(state): State<Shared>) -> (StatusCode, Json<Value>) {
    if state.lock().unwrap().capture_busy {
        (StatusCode::CONFLICT, Json(json!({"ok": false, "error": "Pipeline is busy."})))
    } else {
        (StatusCode::OK, Json(json!({"ok": true, "message": "Capture and process started."})))
    }
}

async fn approve(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let kind = body["type"].as_str().unwrap_or("ground").to_owned();
    state.lock().unwrap().approvals.push(body);
    Json(json!({"ok": true, "filename": format!("{kind}_20250101_120000.png")}))
}

async fn forest_state(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    state.lock().unwrap().reports.push(body);
    Json(json!({"ok": true}))
}

async fn queue_status(State(state): State<Shared>, Path(job_id): Path<String>) -> Json<Value> {
    state.lock().unwrap().queue_job_ids.push(job_id.clone());
    Json(json!({"job_id": job_id, "state": "done"}))
}

async fn delete_animal(State(state): State<Shared>, Path(filename): Path<String>) -> Json<Value> {
    state.lock().unwrap().deleted.push(filename.clone());
    Json(json!({"ok": true, "deleted": filename}))
}

async fn asset(
    State(state): State<Shared>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Vec<u8>) {
    state.lock().unwrap().asset_queries.push(params);
    if name == "missing.png" {
        (StatusCode::NOT_FOUND, Vec::new())
    } else {
        (StatusCode::OK, vec![0x89, b'P', b'N', b'G'])
    }
}

async fn html_error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>")
}

async fn spawn_backend(state: Shared) -> String {
    let router = Router::new()
        .route("/api/login", post(login))
        .route("/api/latest_animals", get(latest_animals))
        .route("/api/pipeline_status", get(pipeline_status))
        .route("/api/capture_process", post(capture_process))
        .route("/api/approve", post(approve))
        .route("/api/forest_state", post(forest_state))
        .route("/api/queue_status/{job_id}", get(queue_status))
        .route("/api/animals/{filename}", delete(delete_animal))
        .route("/static/animations/{name}", get(asset))
        .route("/api/pictures", get(html_error))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

async fn client_for(state: &Shared) -> ForestApi {
    let base = spawn_backend(Arc::clone(state)).await;
    ForestApi::new(&ClientConfig::with_base(base)).unwrap()
}

#[tokio::test]
async fn roster_decodes_and_login_adds_bearer() {
    let state = Shared::default();
    let api = client_for(&state).await;

    let anonymous = api.latest_animals().await;
    assert!(anonymous.ok);
    assert_eq!(anonymous.status, 200);
    let roster: RosterPage = anonymous.decode().unwrap();
    assert_eq!(roster.items.len(), 2);
    assert_eq!(roster.items[0].kind, CreatureKind::Sky);

    let rejected = api.login("000000").await;
    assert!(!rejected.ok);
    assert_eq!(rejected.status, 401);
    assert_eq!(rejected.error_message(), Some("bad pin"));
    assert!(!api.has_token().await);

    let accepted = api.login("123456").await;
    assert!(accepted.ok);
    assert!(api.has_token().await);

    let _ = api.latest_animals().await;
    let headers = state.lock().unwrap().auth_headers.clone();
    assert_eq!(headers, vec![None, Some("Bearer tok-1".to_owned())]);
}

#[tokio::test]
async fn non_json_error_body_degrades_to_none() {
    let state = Shared::default();
    let api = client_for(&state).await;

    let response = api.pictures().await;
    assert!(!response.ok);
    assert_eq!(response.status, 500);
    assert!(response.data.is_none());
}

#[tokio::test]
async fn unreachable_backend_is_not_ok() {
    // Bind and immediately drop a listener so the port is closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig {
        request_timeout_ms: 500,
        ..ClientConfig::with_base(format!("http://{addr}"))
    };
    let api = ForestApi::new(&config).unwrap();
    let response = api.latest_animals().await;
    assert!(!response.ok);
    assert_eq!(response.status, 0);
    assert!(response.data.is_none());
}

#[tokio::test]
async fn pipeline_status_sends_long_poll_parameters() {
    let state = Shared::default();
    let api = client_for(&state).await;

    let _ = api.pipeline_status(PipelineQuery::long_poll(1, 5)).await;
    let _ = api.pipeline_status(PipelineQuery::snapshot()).await;

    let queries = state.lock().unwrap().status_queries.clone();
    assert_eq!(queries[0]["wait"], "1");
    assert_eq!(queries[0]["timeout"], "1");
    assert_eq!(queries[0]["since"], "5");
    assert_eq!(queries[1]["wait"], "0");
    assert_eq!(queries[1]["since"], "0");
}

#[tokio::test]
async fn path_segments_are_encoded() {
    let state = Shared::default();
    let api = client_for(&state).await;

    let response = api.queue_status("job 42").await;
    assert!(response.ok);
    let deleted = api.delete_animal("ground one.png").await;
    assert!(deleted.ok);

    let guard = state.lock().unwrap();
    assert_eq!(guard.queue_job_ids, vec!["job 42".to_owned()]);
    assert_eq!(guard.deleted, vec!["ground one.png".to_owned()]);
}

#[tokio::test]
async fn forest_state_report_carries_full_set() {
    let state = Shared::default();
    let api = client_for(&state).await;

    let rendered = vec!["a.png".to_owned(), "b.png".to_owned()];
    let response = ForestBackend::report_forest_state(&api, rendered).await;
    assert!(response.ok);

    let reports = state.lock().unwrap().reports.clone();
    assert_eq!(reports, vec![json!({"rendered": ["a.png", "b.png"]})]);
}

#[tokio::test]
async fn asset_fetch_is_cache_busted() {
    let state = Shared::default();
    let api = client_for(&state).await;

    let bytes = api.fetch_asset("/static/animations/fox.png").await.unwrap();
    assert_eq!(bytes.len(), 4);

    let missing = api.fetch_asset("/static/animations/missing.png").await;
    assert!(matches!(missing, Err(ClientError::Status { status: 404 })));

    let queries = state.lock().unwrap().asset_queries.clone();
    assert_eq!(queries.len(), 2);
    assert!(queries.iter().all(|q| q.contains_key("t")));
}

#[tokio::test]
async fn watcher_only_surfaces_new_versions() {
    let state = Shared::default();
    state.lock().unwrap().status_script = VecDeque::from(vec![
        json!({"state": "IDLE", "progress": 0, "message": "Ready", "version": 3}),
        json!({"state": "IDLE", "progress": 0, "message": "Ready", "version": 3}),
        json!({"state": "PROCESSING", "progress": 65, "message": "Running", "version": 4}),
    ]);
    let api = client_for(&state).await;
    let mut watcher = PipelineWatcher::new(1);

    let first = watcher.next_change(&api).await.unwrap();
    assert_eq!(first.version, 3);
    assert!(watcher.next_change(&api).await.is_none());
    let third = watcher.next_change(&api).await.unwrap();
    assert_eq!(third.state, PipelineState::Processing);

    let queries = state.lock().unwrap().status_queries.clone();
    let since: Vec<&str> = queries.iter().map(|q| q["since"].as_str()).collect();
    assert_eq!(since, vec!["0", "3", "3"]);
}

fn fast_policy() -> SubmissionPolicy {
    SubmissionPolicy {
        poll_interval: Duration::from_millis(5),
        max_attempts: 10,
    }
}

fn request() -> SubmissionRequest {
    SubmissionRequest {
        kind: CreatureKind::Ground,
        name: String::new(),
        drawer_name: "Ploy".to_owned(),
        phone_number: None,
    }
}

#[tokio::test]
async fn submission_approves_once_with_detected_kind() {
    let state = Shared::default();
    state.lock().unwrap().status_script = VecDeque::from(vec![
        json!({"state": "PROCESSING", "progress": 65, "message": "Running", "version": 2}),
        json!({"state": "READY_FOR_REVIEW", "progress": 100, "message": "Review", "detected_type": "water", "version": 3}),
    ]);
    let api = client_for(&state).await;

    let mut progress = Vec::new();
    let outcome = submit_capture(&api, "data:image/png;base64,AAAA", &request(), &fast_policy(), |pct, _| {
        progress.push(pct);
    })
    .await
    .unwrap();

    assert_eq!(outcome.kind, CreatureKind::Water);
    assert_eq!(outcome.filename, "water_20250101_120000.png");
    assert!(progress.iter().all(|pct| *pct >= 10));
    assert!(progress.contains(&65));

    let approvals = state.lock().unwrap().approvals.clone();
    assert_eq!(approvals.len(), 1);
    assert_eq!(approvals[0]["type"], "water");
    assert_eq!(approvals[0]["name"], "water_creature");
    assert_eq!(approvals[0]["drawer_name"], "Ploy");
}

#[tokio::test]
async fn submission_surfaces_busy_pipeline() {
    let state = Shared::default();
    state.lock().unwrap().capture_busy = true;
    let api = client_for(&state).await;

    let result = submit_capture(&api, "data:", &request(), &fast_policy(), |_, _| {}).await;
    assert_eq!(result, Err(SubmissionError::Rejected("Pipeline is busy.".to_owned())));
    assert!(state.lock().unwrap().approvals.is_empty());
}

#[tokio::test]
async fn submission_fails_when_pipeline_goes_idle() {
    let state = Shared::default();
    // Default script answers IDLE at 0% forever.
    let api = client_for(&state).await;

    let result = submit_capture(&api, "data:", &request(), &fast_policy(), |_, _| {}).await;
    assert_eq!(result, Err(SubmissionError::ProcessingFailed("Ready".to_owned())));
    assert_eq!(state.lock().unwrap().status_queries.len(), 4);
}

#[tokio::test]
async fn submission_times_out() {
    let state = Shared::default();
    state.lock().unwrap().status_script = (0..10)
        .map(|v| json!({"state": "PROCESSING", "progress": 50, "message": "Running", "version": v}))
        .collect();
    let api = client_for(&state).await;

    let result = submit_capture(&api, "data:", &request(), &fast_policy(), |_, _| {}).await;
    assert_eq!(result, Err(SubmissionError::TimedOut));
    assert_eq!(state.lock().unwrap().status_queries.len(), 10);
    assert!(state.lock().unwrap().approvals.is_empty());
}
