//! HTTP API for ikigai-pathway
//!
//! Axum router over the response store, the chart renderer and the enricher.
//! Health is plain text, everything else is JSON except the image routes.

use std::{cmp::Ordering, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::chart::{ChartFormat, ChartOptions, ChartRenderer, ColorScheme, EncodedImage};
use crate::config::Config;
use crate::enrich::{Enricher, Enrichment};
use crate::error::{IkigaiError, Result};
use crate::pathway::PathwayState;
use crate::pillar::{Pillar, PillarResponses};
use crate::storage::{ChartPayload, NewResponse, ProfileUpdate, ResponseStore};

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ResponseStore>,
    pub enricher: Enricher,
    pub renderer: ChartRenderer,
    pub metrics: Arc<Mutex<HttpMetrics>>,
}

impl HttpState {
    pub fn new(config: Config, store: Arc<dyn ResponseStore>, enricher: Enricher) -> Result<Self> {
        let renderer = ChartRenderer::new(ChartOptions {
            size_px: config.chart.size_px,
            format: config.chart.format,
        })?;
        Ok(Self {
            config: Arc::new(config),
            store,
            enricher,
            renderer,
            metrics: Arc::new(Mutex::new(HttpMetrics::new())),
        })
    }
}

/// Metrics for HTTP server
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    pub total_requests: u64,
    pub last_request_unix: u64,
    pub errors_total: u64,
    pub charts_rendered: u64,
    pub latencies: Vec<f64>, // ring buffer for p95
}

impl HttpMetrics {
    fn new() -> Self {
        Self {
            total_requests: 0,
            last_request_unix: unix_now(),
            errors_total: 0,
            charts_rendered: 0,
            latencies: Vec::with_capacity(256),
        }
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Info endpoint
pub async fn info_handler(State(state): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "service": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
        "storage": {
            "backend": state.store.backend(),
        },
        "ai": {
            "provider": state.enricher.provider(),
            "configured": state.config.ai.provider,
        },
        "chart": {
            "size_px": state.renderer.options().size_px,
            "format": state.renderer.options().format,
        },
        "server": {
            "bind": state.config.runtime.http_bind.to_string(),
            "auth": state.config.runtime.bearer_token.is_some(),
        }
    }))
}

/// Metrics endpoint
pub async fn metrics_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let metrics = state.metrics.lock().await.clone();

    let (avg_latency_ms, p95_latency_ms) = if metrics.latencies.is_empty() {
        (None, None)
    } else {
        let sum: f64 = metrics.latencies.iter().sum();
        let avg = sum / metrics.latencies.len() as f64;
        let mut sorted = metrics.latencies.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let p95_idx = ((sorted.len() as f64 * 0.95) as usize).min(sorted.len() - 1);
        (Some(avg), sorted.get(p95_idx).copied())
    };

    Json(json!({
        "total_requests": metrics.total_requests,
        "last_request_unix": metrics.last_request_unix,
        "errors_total": metrics.errors_total,
        "charts_rendered": metrics.charts_rendered,
        "avg_latency_ms": avg_latency_ms,
        "p95_latency_ms": p95_latency_ms,
    }))
}

// ---------------------------------------------------------------------------
// Responses

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: String,
    #[serde(default)]
    pub pillar: Option<String>,
}

fn require_user(user_id: &str) -> Result<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(IkigaiError::validation("user_id is required"));
    }
    Ok(user_id)
}

async fn save_response_handler(
    State(state): State<HttpState>,
    Json(answer): Json<NewResponse>,
) -> Result<impl IntoResponse> {
    let record = state.store.save_answer(answer).await?;
    Ok(Json(record))
}

async fn list_responses_handler(
    State(state): State<HttpState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let user_id = require_user(&query.user_id)?;
    let pillar = query
        .pillar
        .as_deref()
        .map(str::parse::<Pillar>)
        .transpose()?;
    let records = state.store.list_responses(user_id, pillar).await?;
    Ok(Json(records))
}

async fn clear_responses_handler(
    State(state): State<HttpState>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse> {
    let user_id = require_user(&query.user_id)?;
    let removed = state.store.clear_responses(user_id).await?;
    tracing::info!(user_id, removed, "Cleared responses");
    Ok(Json(json!({ "removed": removed })))
}

async fn delete_response_handler(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.store.delete_response(&id).await?;
    Ok(Json(json!({ "deleted": id })))
}

async fn grouped_responses_handler(
    State(state): State<HttpState>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse> {
    let user_id = require_user(&query.user_id)?;
    Ok(Json(state.store.get_responses(user_id).await?))
}

async fn completion_handler(
    State(state): State<HttpState>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse> {
    let user_id = require_user(&query.user_id)?;
    Ok(Json(state.store.completion(user_id).await?))
}

// ---------------------------------------------------------------------------
// Pathway steps

#[derive(Debug, Deserialize)]
pub struct StepRequest {
    pub answers: Vec<String>,
}

fn pathway_json(state: &PathwayState) -> Value {
    json!({
        "responses": state.responses,
        "completed": state.completed(),
        "next_step": state.next_step(),
        "is_complete": state.is_complete(),
        "progress": state.progress_fraction(),
    })
}

async fn pathway_handler(
    State(state): State<HttpState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let responses = state.store.get_responses(require_user(&user_id)?).await?;
    Ok(Json(pathway_json(&PathwayState::from_responses(responses))))
}

async fn submit_step_handler(
    State(state): State<HttpState>,
    Path((user_id, pillar)): Path<(String, String)>,
    Json(step): Json<StepRequest>,
) -> Result<impl IntoResponse> {
    let user_id = require_user(&user_id)?;
    let pillar: Pillar = pillar.parse()?;
    let current = PathwayState::from_responses(state.store.get_responses(user_id).await?);
    let next = current.submit_step(pillar, step.answers);
    state
        .store
        .replace_pillar(user_id, pillar, next.responses.get(pillar))
        .await?;
    Ok(Json(pathway_json(&next)))
}

async fn reset_pathway_handler(
    State(state): State<HttpState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    state.store.clear_responses(require_user(&user_id)?).await?;
    Ok(Json(pathway_json(&PathwayState::new().reset())))
}

// ---------------------------------------------------------------------------
// Charts

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub responses: PillarResponses,
    #[serde(default)]
    pub color_scheme: Option<ColorScheme>,
    #[serde(default)]
    pub format: Option<ChartFormat>,
    #[serde(default)]
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SaveChartRequest {
    pub user_id: String,
    #[serde(default)]
    pub color_scheme: Option<ColorScheme>,
}

/// Rendering is CPU-bound; keep it off the async workers
async fn render_blocking(
    state: &HttpState,
    renderer: ChartRenderer,
    responses: PillarResponses,
    color_scheme: ColorScheme,
) -> Result<EncodedImage> {
    let image =
        tokio::task::spawn_blocking(move || renderer.render(&responses, Some(&color_scheme)))
            .await??;
    let mut m = state.metrics.lock().await;
    m.charts_rendered = m.charts_rendered.saturating_add(1);
    Ok(image)
}

fn image_response(image: EncodedImage) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, image.mime_type())],
        image.bytes,
    )
        .into_response()
}

async fn render_chart_handler(
    State(state): State<HttpState>,
    Json(req): Json<RenderRequest>,
) -> Result<impl IntoResponse> {
    let defaults = state.renderer.options();
    let renderer = ChartRenderer::new(ChartOptions {
        size_px: req.size.unwrap_or(defaults.size_px),
        format: req.format.unwrap_or(defaults.format),
    })?;
    let scheme = req
        .color_scheme
        .unwrap_or_else(|| state.config.chart.color_scheme.clone());
    let image = render_blocking(&state, renderer, req.responses, scheme).await?;
    Ok(Json(json!({
        "format": image.format,
        "mime_type": image.mime_type(),
        "image_base64": image.to_base64(),
    })))
}

async fn placeholder_handler(State(state): State<HttpState>) -> Result<Response> {
    let renderer = ChartRenderer::new(ChartOptions {
        size_px: state.renderer.options().size_px,
        format: ChartFormat::Png,
    })?;
    let image = tokio::task::spawn_blocking(move || renderer.render_placeholder()).await??;
    Ok(image_response(image))
}

async fn save_chart_handler(
    State(state): State<HttpState>,
    Json(req): Json<SaveChartRequest>,
) -> Result<impl IntoResponse> {
    let user_id = require_user(&req.user_id)?;
    let responses = state.store.get_responses(user_id).await?;
    let scheme = req
        .color_scheme
        .unwrap_or_else(|| state.config.chart.color_scheme.clone());
    let image = render_blocking(&state, state.renderer, responses.clone(), scheme.clone()).await?;

    let payload = ChartPayload {
        image_base64: image.to_base64(),
        format: image.format,
        color_scheme: scheme,
        responses,
        generated_at: Utc::now(),
    };
    let record = state
        .store
        .save_chart(user_id, serde_json::to_value(&payload)?)
        .await?;
    tracing::info!(user_id, format = %image.format, "Saved chart");
    Ok(Json(record))
}

async fn get_chart_handler(
    State(state): State<HttpState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let record = state
        .store
        .get_chart(&user_id)
        .await?
        .ok_or_else(|| IkigaiError::not_found(format!("chart for user {}", user_id)))?;
    Ok(Json(record))
}

async fn chart_image_handler(
    State(state): State<HttpState>,
    Path(user_id): Path<String>,
) -> Result<Response> {
    let record = state
        .store
        .get_chart(&user_id)
        .await?
        .ok_or_else(|| IkigaiError::not_found(format!("chart for user {}", user_id)))?;
    let payload = record.payload()?;
    let bytes = BASE64_STANDARD
        .decode(payload.image_base64.as_bytes())
        .map_err(|e| IkigaiError::Serialization {
            message: format!("stored chart image is not valid base64: {}", e),
        })?;
    Ok(image_response(EncodedImage {
        format: payload.format,
        bytes,
    }))
}

fn enrichment_json(key: &str, enrichment: Enrichment<Vec<String>>) -> Value {
    let reason = match &enrichment {
        Enrichment::Fallback { reason, .. } => Some(reason.to_string()),
        Enrichment::Generated { .. } => None,
    };
    let source = enrichment.source().to_string();
    json!({
        key: enrichment.into_value(),
        "source": source,
        "fallback_reason": reason,
    })
}

async fn tips_handler(
    State(state): State<HttpState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let responses = state.store.get_responses(require_user(&user_id)?).await?;
    let tips = state.enricher.tips(&responses).await;
    Ok(Json(enrichment_json("tips", tips)))
}

// ---------------------------------------------------------------------------
// AI suggestions and profiles

#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    pub text: String,
    pub pillar: String,
}

async fn suggestions_handler(
    State(state): State<HttpState>,
    Json(req): Json<SuggestionRequest>,
) -> Result<impl IntoResponse> {
    if req.text.trim().is_empty() {
        return Err(IkigaiError::validation("text is required"));
    }
    let suggestions = state.enricher.suggest_for_key(&req.text, &req.pillar).await;
    Ok(Json(enrichment_json("suggestions", suggestions)))
}

async fn get_profile_handler(
    State(state): State<HttpState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.store.get_profile(&user_id).await?))
}

async fn update_profile_handler(
    State(state): State<HttpState>,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.store.update_profile(&user_id, update).await?))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"code": 401, "message": "Unauthorized"}})),
    )
        .into_response()
}

/// Build the full router; tests drive it with `oneshot`
pub fn build_router(state: HttpState) -> Router {
    let token = state.config.runtime.bearer_token.clone();
    let timeout = Duration::from_millis(state.config.runtime.http_request_timeout_ms);

    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/responses",
            get(list_responses_handler)
                .post(save_response_handler)
                .delete(clear_responses_handler),
        )
        .route("/responses/grouped", get(grouped_responses_handler))
        .route("/responses/completion", get(completion_handler))
        .route("/responses/:id", delete(delete_response_handler))
        .route(
            "/pathway/:user_id",
            get(pathway_handler).delete(reset_pathway_handler),
        )
        .route("/pathway/:user_id/:pillar", put(submit_step_handler))
        .route("/charts", post(save_chart_handler))
        .route("/charts/render", post(render_chart_handler))
        .route("/charts/placeholder", get(placeholder_handler))
        .route("/charts/:user_id", get(get_chart_handler))
        .route("/charts/:user_id/image", get(chart_image_handler))
        .route("/charts/:user_id/tips", get(tips_handler))
        .route("/ai/suggestions", post(suggestions_handler))
        .route(
            "/profiles/:user_id",
            get(get_profile_handler).patch(update_profile_handler),
        )
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            |State(metrics): State<Arc<Mutex<HttpMetrics>>>,
             req: axum::http::Request<Body>,
             next: axum::middleware::Next| async move {
                let start = std::time::Instant::now();
                let resp = next.run(req).await;
                let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                let mut m = metrics.lock().await;
                m.latencies.push(latency_ms);
                if m.latencies.len() > 256 {
                    m.latencies.remove(0);
                }
                if !resp.status().is_success() {
                    m.errors_total = m.errors_total.saturating_add(1);
                }
                m.total_requests = m.total_requests.saturating_add(1);
                m.last_request_unix = unix_now();
                resp
            },
        ))
        // Bearer auth only when a token is configured
        .layer(middleware::from_fn_with_state(
            token,
            |State(token): State<Option<String>>,
             req: axum::http::Request<Body>,
             next: axum::middleware::Next| async move {
                let Some(expected) = token else {
                    return next.run(req).await;
                };
                if req.uri().path() == "/health" || req.method() == Method::OPTIONS {
                    return next.run(req).await;
                }
                let headers: &HeaderMap = req.headers();
                let header_ok = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|h| h.to_str().ok())
                    .is_some_and(|v| v == format!("Bearer {}", expected));
                if !header_ok {
                    return unauthorized();
                }
                next.run(req).await
            },
        ))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Start the HTTP server
pub async fn start_http_server(state: HttpState) -> anyhow::Result<()> {
    let bind = state.config.runtime.http_bind;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener: {}", e))?;

    tracing::info!("Starting HTTP server on {}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
