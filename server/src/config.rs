// Configuration for the server, read from the environment

use std::{str::FromStr, time::Duration};

use tracing::warn;
use tts_core::{DispatchOptions, FailurePolicy, LanguagePolicy};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origin: String,
    pub language_policy: LanguagePolicy,
    pub failure_policy: FailurePolicy,
    pub max_concurrent_syntheses: usize,
    pub synthesis_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_text_length: usize,
    pub rate_limit_per_minute: u32,
    pub expose_error_details: bool,
    pub gtts_tld: String,
    pub gtts_slow: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            language_policy: LanguagePolicy::default(),
            failure_policy: FailurePolicy::FailFast,
            max_concurrent_syntheses: 16,
            synthesis_timeout_secs: 30,
            request_timeout_secs: 120,
            max_text_length: 5000,
            rate_limit_per_minute: 60,
            expose_error_details: true,
            gtts_tld: "com".to_string(),
            gtts_slow: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            cors_allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .unwrap_or(defaults.cors_allowed_origin),
            language_policy: env_or("LANGUAGE_POLICY", defaults.language_policy),
            failure_policy: env_or("FAILURE_POLICY", defaults.failure_policy),
            max_concurrent_syntheses: env_or("MAX_CONCURRENT_SYNTHESES", defaults.max_concurrent_syntheses)
                .max(1),
            synthesis_timeout_secs: env_or("SYNTHESIS_TIMEOUT_SECS", defaults.synthesis_timeout_secs),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            max_text_length: env_or("MAX_TEXT_LENGTH", defaults.max_text_length),
            rate_limit_per_minute: env_or("RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute).max(1),
            expose_error_details: env_or("EXPOSE_ERROR_DETAILS", defaults.expose_error_details),
            gtts_tld: std::env::var("GTTS_TLD").unwrap_or(defaults.gtts_tld),
            gtts_slow: env_or("GTTS_SLOW", defaults.gtts_slow),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }

    /// Milliseconds between replenished rate-limit permits.
    pub fn rate_limit_interval_ms(&self) -> u64 {
        (60_000 / u64::from(self.rate_limit_per_minute.max(1))).max(1)
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            max_concurrency: self.max_concurrent_syntheses,
            task_timeout: Some(self.synthesis_timeout()),
            failure_policy: self.failure_policy,
        }
    }
}

/// Parse `key` from the environment, keeping `default` when it is unset or
/// malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid value for {key}: {raw:?}");
            default
        }),
        Err(_) => default,
    }
}
