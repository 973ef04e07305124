//! Provider clients against a local axum stub standing in for the hosted APIs

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use ikigai_pathway::clients::{
    CompletionRequest, GeminiClient, GroqClient, LlmError, TextGenerator,
};
use ikigai_pathway::enrich::Enricher;
use ikigai_pathway::pillar::Pillar;

#[derive(Clone, Default)]
struct Stub {
    calls: Arc<AtomicU32>,
    /// Number of leading calls answered with 503
    fail_first: u32,
    reply: String,
    seen: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn chat_completions(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = stub.calls.fetch_add(1, Ordering::SeqCst);
    stub.seen.lock().await.push((headers, body));
    if n < stub.fail_first {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": "busy"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{"message": {"role": "assistant", "content": stub.reply}}]
        })),
    )
}

async fn generate_content(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.calls.fetch_add(1, Ordering::SeqCst);
    stub.seen.lock().await.push((headers, body));
    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{"content": {"parts": [{"text": stub.reply}]}}]
        })),
    )
}

#[tokio::test]
async fn groq_client_sends_bearer_and_system_prompt() {
    let stub = Stub {
        reply: "Choir, Songwriting".into(),
        ..Stub::default()
    };
    let router = Router::new()
        .route("/openai/v1/chat/completions", post(chat_completions))
        .with_state(stub.clone());
    let addr = spawn(router).await;

    let client = GroqClient::new("gsk_test", Duration::from_secs(5))
        .unwrap()
        .with_base_url(format!("http://{}/openai/v1", addr));
    let request = CompletionRequest::new("hello").with_system("be brief");
    let text = client.complete(&request).await.unwrap();
    assert_eq!(text, "Choir, Songwriting");

    let seen = stub.seen.lock().await;
    let (headers, body) = &seen[0];
    assert_eq!(headers["authorization"], "Bearer gsk_test");
    assert_eq!(body["model"], "deepseek-r1-distill-llama-70b");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "hello");
}

#[tokio::test]
async fn groq_client_retries_server_errors() {
    let stub = Stub {
        fail_first: 2,
        reply: "ok".into(),
        ..Stub::default()
    };
    let router = Router::new()
        .route("/chat/completions", post(chat_completions))
        .with_state(stub.clone());
    let addr = spawn(router).await;

    let client = GroqClient::new("k", Duration::from_secs(5))
        .unwrap()
        .with_base_url(format!("http://{}", addr))
        .with_attempts(3);
    assert_eq!(client.complete(&CompletionRequest::new("x")).await.unwrap(), "ok");
    assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn groq_client_gives_up_after_attempts() {
    let stub = Stub {
        fail_first: 10,
        ..Stub::default()
    };
    let router = Router::new()
        .route("/chat/completions", post(chat_completions))
        .with_state(stub.clone());
    let addr = spawn(router).await;

    let client = GroqClient::new("k", Duration::from_secs(5))
        .unwrap()
        .with_base_url(format!("http://{}", addr))
        .with_attempts(2);
    let err = client.complete(&CompletionRequest::new("x")).await.unwrap_err();
    assert!(matches!(err, LlmError::Http { status: 503, .. }));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn gemini_client_posts_generate_content() {
    let stub = Stub {
        reply: "1. Teach a workshop.\n2. Mentor a peer.".into(),
        ..Stub::default()
    };
    let router = Router::new()
        .route("/models/:call", post(generate_content))
        .with_state(stub.clone());
    let addr = spawn(router).await;

    let client = GeminiClient::new("gm_test", Duration::from_secs(5))
        .unwrap()
        .with_base_url(format!("http://{}/models", addr));
    let enricher = Enricher::new(Some(Arc::new(client) as Arc<dyn TextGenerator>));
    let tips = enricher
        .tips(&ikigai_pathway::PillarResponses::new().with(Pillar::GoodAt, ["teaching"]))
        .await;
    assert_eq!(tips.source(), "gemini");
    assert_eq!(
        tips.value(),
        &vec!["Teach a workshop.".to_string(), "Mentor a peer.".to_string()]
    );

    let seen = stub.seen.lock().await;
    let (headers, body) = &seen[0];
    assert_eq!(headers["x-goog-api-key"], "gm_test");
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Good At: teaching"));
    assert!(body["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("You are a career coach"));
}

#[tokio::test]
async fn unreachable_provider_falls_back() {
    // Bind then drop so the port refuses connections
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GroqClient::new("k", Duration::from_secs(2))
        .unwrap()
        .with_base_url(format!("http://{}", addr))
        .with_attempts(1);
    let enricher = Enricher::new(Some(Arc::new(client) as Arc<dyn TextGenerator>));
    let result = enricher.suggest("rivers", Pillar::WorldNeeds).await;
    assert!(result.is_fallback());
    assert_eq!(result.value()[0], "Environmental solutions");
}
