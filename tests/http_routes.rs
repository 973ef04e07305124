//! In-process tests of the JSON API, driven with `oneshot`

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde_json::{Value, json};
use tower::ServiceExt;

use ikigai_pathway::config::Config;
use ikigai_pathway::enrich::Enricher;
use ikigai_pathway::http::{HttpState, build_router};
use ikigai_pathway::storage::{MemoryStore, Profile, ResponseStore};

fn app_with(config: Config, store: Arc<MemoryStore>) -> Router {
    let state = HttpState::new(config, store, Enricher::disabled()).unwrap();
    build_router(state)
}

fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (app_with(Config::default(), store.clone()), store)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn call_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = call(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_is_plain_ok() {
    let (app, _) = app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn responses_round_trip_through_grouping() {
    let (app, _) = app();
    for (question, text) in [("q1", "painting|hiking"), ("q2", "music")] {
        let (status, _) = call_json(
            &app,
            Method::POST,
            "/responses",
            Some(json!({"user_id": "u1", "pillar": "love", "question_id": question, "response": text})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, grouped) =
        call_json(&app, Method::GET, "/responses/grouped?user_id=u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grouped["love"], json!(["painting", "hiking", "music"]));

    let (_, list) = call_json(&app, Method::GET, "/responses?user_id=u1&pillar=love", None).await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (status, completion) =
        call_json(&app, Method::GET, "/responses/completion?user_id=u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completion["allCompleted"], false);
    assert_eq!(completion["totalQuestionsAnswered"], 2);
}

#[tokio::test]
async fn unknown_pillar_is_bad_request() {
    let (app, _) = app();
    let (status, body) =
        call_json(&app, Method::GET, "/responses?user_id=u1&pillar=hobbies", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);
}

#[tokio::test]
async fn deleting_missing_response_is_not_found() {
    let (app, _) = app();
    let (status, body) = call_json(&app, Method::DELETE, "/responses/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"]["message"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn pathway_steps_replace_and_reset() {
    let (app, _) = app();
    call_json(
        &app,
        Method::PUT,
        "/pathway/u1/love",
        Some(json!({"answers": ["painting", "hiking"]})),
    )
    .await;
    let (status, state) = call_json(
        &app,
        Method::PUT,
        "/pathway/u1/love",
        Some(json!({"answers": [" music ", ""]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["responses"]["love"], json!(["music"]));
    assert_eq!(state["next_step"], "good_at");

    let (_, grouped) = call_json(&app, Method::GET, "/responses/grouped?user_id=u1", None).await;
    assert_eq!(grouped["love"], json!(["music"]));

    let (_, state) = call_json(&app, Method::DELETE, "/pathway/u1", None).await;
    assert_eq!(state["progress"], 0.0);
    let (_, state) = call_json(&app, Method::GET, "/pathway/u1", None).await;
    assert_eq!(state["next_step"], "love");
}

#[tokio::test]
async fn render_returns_base64_png() {
    let (app, _) = app();
    let (status, body) = call_json(
        &app,
        Method::POST,
        "/charts/render",
        Some(json!({"responses": {"love": ["painting"], "hobbies": ["chess"]}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mime_type"], "image/png");
    let bytes = BASE64_STANDARD
        .decode(body["image_base64"].as_str().unwrap())
        .unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[tokio::test]
async fn render_rejects_bad_color_and_size() {
    let (app, _) = app();
    let (status, body) = call_json(
        &app,
        Method::POST,
        "/charts/render",
        Some(json!({"responses": {}, "color_scheme": {"love": "blurple"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("love"));

    let (status, _) = call_json(
        &app,
        Method::POST,
        "/charts/render",
        Some(json!({"responses": {}, "size": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn saved_chart_can_be_fetched_as_image() {
    let (app, store) = app();
    store
        .save_response("u1", ikigai_pathway::Pillar::Love, "painting")
        .await
        .unwrap();

    let (status, record) =
        call_json(&app, Method::POST, "/charts", Some(json!({"user_id": "u1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["chart_data"]["responses"]["love"], json!(["painting"]));

    let (status, fetched) = call_json(&app, Method::GET, "/charts/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], record["id"]);

    let (status, png) = call(&app, Method::GET, "/charts/u1/image", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&png[1..4], b"PNG");

    let (status, _) = call_json(&app, Method::GET, "/charts/u2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn placeholder_is_png() {
    let (app, _) = app();
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/charts/placeholder")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn ai_routes_fall_back_without_provider() {
    let (app, _) = app();
    let (status, body) = call_json(
        &app,
        Method::POST,
        "/ai/suggestions",
        Some(json!({"text": "I like maps", "pillar": "world_needs"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["suggestions"][0], "Environmental solutions");

    let (_, body) = call_json(
        &app,
        Method::POST,
        "/ai/suggestions",
        Some(json!({"text": "chess", "pillar": "hobbies"})),
    )
    .await;
    assert_eq!(body["suggestions"], json!(["Enter more details"]));
    assert_eq!(body["fallback_reason"], "unknown pillar 'hobbies'");

    let (_, body) = call_json(&app, Method::GET, "/charts/u1/tips", None).await;
    assert_eq!(body["tips"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn profile_update_derives_avatar_url() {
    let (app, store) = app();
    store
        .insert_profile(Profile {
            id: "u1".into(),
            email: Some("u1@example.com".into()),
            ..Profile::default()
        })
        .await;

    let (status, body) = call_json(&app, Method::PATCH, "/profiles/u1", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("No fields to update"));

    let (status, body) = call_json(
        &app,
        Method::PATCH,
        "/profiles/u1",
        Some(json!({"avatar_id": "crane"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["avatar_url"], "/images/avatar images/crane.jpg");

    let (status, _) = call_json(&app, Method::GET, "/profiles/u9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bearer_token_guards_everything_but_health() {
    let mut config = Config::default();
    config.runtime.bearer_token = Some("s3cret".into());
    let app = app_with(config, Arc::new(MemoryStore::new()));

    let (status, _) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, "/info", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/info")
                .header(header::AUTHORIZATION, "Bearer s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_count_requests() {
    let (app, _) = app();
    call(&app, Method::GET, "/health", None).await;
    call(&app, Method::GET, "/responses/nope", None).await;
    let (_, metrics) = call_json(&app, Method::GET, "/metrics", None).await;
    assert_eq!(metrics["total_requests"], 2);
    assert_eq!(metrics["errors_total"], 1);
}

#[tokio::test]
async fn render_survives_oversized_response_text() {
    let (app, _) = app();
    let long = "a".repeat(400_000);
    let (status, body) = call_json(
        &app,
        Method::POST,
        "/charts/render",
        Some(json!({"responses": {"love": [long, "b", "c"]}, "size": 4000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let bytes = BASE64_STANDARD
        .decode(body["image_base64"].as_str().unwrap())
        .unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}
