pub mod config;
pub mod error;
pub mod form;
pub mod validation;

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::form::TtsText;
use crate::validation::validate_tts_text;

#[derive(Clone)]
pub struct AppState {
    pub tts: Arc<tts_core::TtsManager>,
    pub config: ServerConfig,
}

/// Routes, served both at the root and under `/api`, with request ids,
/// tracing and the CORS policy applied.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config.cors_allowed_origin)?;
    info!("CORS configured for origin {}", state.config.cors_allowed_origin);

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .into_inner();

    let api = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/tts", post(tts_endpoint));

    Ok(Router::new()
        .merge(api.clone()) // root paths
        .nest("/api", api) // /api prefix
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(middleware_stack)
        .with_state(state))
}

/// Only `origin` may call the API from a browser; other origins get no
/// `access-control-allow-origin` header.
pub fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|e| anyhow!("invalid CORS origin {origin:?}: {e}"))?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
        .allow_credentials(false))
}

// Request ID middleware for tracing
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()).ok();
    if let Some(id) = &request_id {
        request.headers_mut().insert("x-request-id", id.clone());
    }
    let mut response = next.run(request).await;
    if let Some(id) = request_id {
        response.headers_mut().insert("x-request-id", id);
    }
    response
}

pub async fn health_check() -> &'static str {
    "ok"
}

/// `POST /tts`: speak the form field `text` and stream the audio back, one
/// element per sentence, in sentence order.
///
/// Synthesis is bounded by the request timeout; running out of time drops
/// the pipeline, which aborts its in-flight engine calls.
pub async fn tts_endpoint(
    State(state): State<AppState>,
    TtsText(text): TtsText,
) -> Result<Response, ApiError> {
    let text = validate_tts_text(text.as_deref(), state.config.max_text_length)?;
    info!("TTS request received: text length={}", text.len());

    let timeout = state.config.request_timeout();
    let chunks = tokio::time::timeout(timeout, state.tts.synthesize(text))
        .await
        .map_err(|_| {
            error!("TTS request timed out after {:?}", timeout);
            ApiError::Internal(format!("Request timed out after {}s", timeout.as_secs()))
        })?
        .map_err(|e| ApiError::from_pipeline(e, state.config.expose_error_details))?;

    let total: usize = chunks.iter().map(|c| c.len()).sum();
    info!("Streaming {} audio chunk(s), {} bytes", chunks.len(), total);

    let body = Body::from_stream(tts_core::audio_stream(chunks));
    Ok(([(header::CONTENT_TYPE, state.tts.content_type())], body).into_response())
}
