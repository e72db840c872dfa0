mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use common::{spawn, ScriptedEvaluator};
use interview_orchestrator::models::candidate::Candidate;
use interview_orchestrator::services::store_service::{MemorySessionStore, SessionStore};
use interview_orchestrator::{routes, AppState};

async fn app(scores: Vec<u8>) -> Router {
    app_over(MemorySessionStore::new(), scores).await
}

async fn app_over(store: MemorySessionStore, scores: Vec<u8>) -> Router {
    let handle = spawn(&store, Arc::new(ScriptedEvaluator::new(scores))).await;
    routes::router(AppState::new(handle, Arc::new(store)))
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn interview_flow_over_http() {
    let app = app(vec![8]).await;

    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interview"], "not_started");

    let (status, body) = call(
        &app,
        "POST",
        "/api/interview",
        Some(json!({ "name": "Ada", "email": "ada@example.com", "phone": null })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["current_question_index"], 0);
    assert_eq!(body["current_time_limit"], 20);
    assert_eq!(body["questions"].as_array().unwrap().len(), 6);
    let candidate_id = body["candidate"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "POST",
        "/api/interview/answer",
        Some(json!({ "question_index": 0, "answer": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("provide an answer"));

    let (status, body) = call(
        &app,
        "POST",
        "/api/interview/answer",
        Some(json!({ "question_index": 0, "answer": "let is block scoped" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "finalized");
    assert_eq!(body["score"], 8);

    let (status, body) = call(&app, "GET", "/api/interview", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_question_index"], 1);
    assert_eq!(body["answered"], 1);
    assert_eq!(body["score"]["total"], 8);

    let (status, _) = call(&app, "POST", "/api/interview/resume", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(&app, "POST", "/api/interview/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paused");

    let (status, body) = call(&app, "GET", "/api/candidates", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Ada");
    assert_eq!(list[0]["status"], "paused");

    let uri = format!("/api/candidates/{}", candidate_id);
    let (status, body) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["status"], "paused");
}

#[tokio::test]
async fn intake_is_validated() {
    let app = app(vec![]).await;

    let (status, _) = call(&app, "POST", "/api/interview", Some(json!({ "name": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/api/interview",
        Some(json!({ "name": "Ada", "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, "GET", "/api/interview", None).await;
    assert_eq!(body["status"], "not_started");
}

#[tokio::test]
async fn second_intake_conflicts_with_active_interview() {
    let app = app(vec![]).await;
    let (status, _) = call(&app, "POST", "/api/interview", Some(json!({ "name": "Ada" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(&app, "POST", "/api/interview", Some(json!({ "name": "Bob" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("abandon"));

    let (status, body) = call(&app, "POST", "/api/interview/abandon", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_started");

    let (status, _) = call(&app, "POST", "/api/interview", Some(json!({ "name": "Bob" }))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn recovery_offer_is_empty_without_interrupted_session() {
    let app = app(vec![]).await;
    let (status, body) = call(&app, "GET", "/api/recovery", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["offer"].is_null());

    let choice = json!({ "choice": "continue" });
    let (status, _) = call(&app, "POST", "/api/recovery", Some(choice)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let choice = json!({ "choice": "cancel" });
    let (status, _) = call(&app, "POST", "/api/recovery", Some(choice)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_candidate_is_not_found() {
    let app = app(vec![]).await;
    let uri = format!("/api/candidates/{}", Uuid::new_v4());
    let (status, body) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn candidate_list_filters_and_sorts() {
    let store = MemorySessionStore::new();
    let mut older = Candidate::new("Zed".into(), Some("zed@Example.com".into()), None);
    older.created_at = older.created_at - chrono::Duration::minutes(5);
    store.save_candidate(&older).await.unwrap();
    let newer = Candidate::new("amy".into(), Some("amy@other.org".into()), None);
    store.save_candidate(&newer).await.unwrap();
    let app = app_over(store, vec![]).await;

    let names = |body: &JsonValue| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, body) = call(&app, "GET", "/api/candidates", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["amy", "Zed"]);

    let uri = "/api/candidates?sort_by=name&order=asc";
    let (_, body) = call(&app, "GET", uri, None).await;
    assert_eq!(names(&body), vec!["amy", "Zed"]);

    let uri = "/api/candidates?sort_by=created_at&order=asc";
    let (_, body) = call(&app, "GET", uri, None).await;
    assert_eq!(names(&body), vec!["Zed", "amy"]);

    let (_, body) = call(&app, "GET", "/api/candidates?search=EXAMPLE", None).await;
    assert_eq!(names(&body), vec!["Zed"]);

    let (_, body) = call(&app, "GET", "/api/candidates?status=completed", None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = call(&app, "GET", "/api/candidates?sort_by=salary", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
