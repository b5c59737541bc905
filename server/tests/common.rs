//! Common utilities for integration tests

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use bytes::Bytes;
use server::{build_router, config::ServerConfig, AppState};
use tower::ServiceExt;
use tts_core::{
    LanguageAssigner, LanguageCandidate, LanguageDetector, LanguagePolicy, LanguageTag, SpeechSynthesizer,
    TtsManager,
};

/// Speaks `[lang:text]`; sleeps longer for earlier sentences when `stagger`
/// is set, sleeps `delay` before every call, and fails on any text
/// containing "explode" the way a chunked engine does, with the cause
/// wrapped in a piece label.
#[derive(Default)]
pub struct FakeSynth {
    pub stagger: bool,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    async fn synthesize(&self, text: &str, language: &LanguageTag) -> anyhow::Result<Bytes> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stagger {
            let wait = 20 * (5u64.saturating_sub(call as u64));
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }
        tokio::time::sleep(self.delay).await;
        if text.contains("explode") {
            return Err(anyhow::anyhow!("engine exploded on {:?}", text).context("piece 1 of 1"));
        }
        Ok(Bytes::from(format!("[{language}:{text}]")))
    }
}

/// A detector that never recognizes anything.
pub struct BlindDetector;

impl LanguageDetector for BlindDetector {
    fn detect(&self, _text: &str) -> anyhow::Result<Vec<LanguageCandidate>> {
        Ok(Vec::new())
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        cors_allowed_origin: "http://localhost:3000".to_string(),
        ..Default::default()
    }
}

/// Create a test app instance around `synth` with the given language policy.
pub fn create_test_app_with(synth: Arc<FakeSynth>, assigner: LanguageAssigner, config: ServerConfig) -> Router {
    let tts = Arc::new(TtsManager::new(synth, assigner).with_options(config.dispatch_options()));
    build_router(AppState { tts, config }).expect("test router")
}

/// Create a test app instance speaking English for every sentence.
pub fn create_test_app() -> Router {
    create_test_app_with(
        Arc::new(FakeSynth::default()),
        LanguageAssigner::fixed(LanguageTag::new("en")),
        test_config(),
    )
}

/// Test app whose detector yields `unknown` for everything.
pub fn create_blind_app() -> Router {
    create_test_app_with(
        Arc::new(FakeSynth::default()),
        LanguageAssigner::new(LanguagePolicy::Detected, Arc::new(BlindDetector)),
        test_config(),
    )
}

pub fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub const MULTIPART_BOUNDARY: &str = "tts-test-boundary";

/// A `multipart/form-data` POST with one text field per `(name, value)`.
pub fn multipart_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{MULTIPART_BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
