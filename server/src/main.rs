use std::{net::SocketAddr, sync::Arc};

use anyhow::anyhow;
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer};
use tracing::{info, warn};

use server::{build_router, config::ServerConfig, AppState};
use speech_client::{GoogleTranslateTts, GttsOptions};
use tts_core::{LanguageAssigner, LanguagePolicy, SpeechSynthesizer, TtsManager, WhatlangDetector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting TTS server...");

    // Load configuration from environment
    let config = ServerConfig::from_env();

    let synthesizer = Arc::new(GoogleTranslateTts::new(GttsOptions {
        tld: config.gtts_tld.clone(),
        slow: config.gtts_slow,
        request_timeout: config.synthesis_timeout(),
    })?);

    match &config.language_policy {
        LanguagePolicy::Fixed(tag) if !synthesizer.supports_language(tag) => {
            warn!("Fixed language '{tag}' is not supported by the speech engine; every request will be rejected");
        }
        LanguagePolicy::Fixed(tag) => info!("Language policy: fixed '{tag}'"),
        LanguagePolicy::Detected => info!("Language policy: per-sentence detection"),
    }

    let assigner = LanguageAssigner::new(config.language_policy.clone(), Arc::new(WhatlangDetector));
    let tts = Arc::new(TtsManager::new(synthesizer, assigner).with_options(config.dispatch_options()));

    info!(
        "Server configuration loaded: port={}, max_concurrent_syntheses={}, synthesis_timeout={}s, failure_policy={:?}",
        config.port, config.max_concurrent_syntheses, config.synthesis_timeout_secs, config.failure_policy
    );

    // Rate limiting configuration
    // Using GlobalKeyExtractor to rate limit globally (all requests share the same limit)
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(config.rate_limit_interval_ms())
            .burst_size(config.rate_limit_per_minute)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow!("invalid rate limit configuration"))?,
    );
    info!("Rate limiting: {} requests per minute", config.rate_limit_per_minute);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let state = AppState { tts, config };
    let app = build_router(state)?.layer(GovernorLayer::new(governor_conf));

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow!("Failed to bind {addr}: {e}. Try a different PORT.")
    })?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
