//! Client for the Google Translate speech endpoint.
//!
//! The endpoint speaks at most [`MAX_CHARS`] characters per request, so longer
//! text is cut at word boundaries, each piece is fetched in turn, and the MP3
//! payloads are concatenated.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use regex::Regex;
use reqwest::{header, Client};
use serde_json::{json, Value};
use tracing::debug;

use tts_core::{LanguageTag, SpeechSynthesizer};

/// Identifier of the speech RPC in the `batchexecute` protocol.
pub const GOOGLE_TTS_RPC: &str = "jQ1olc";

/// Longest text accepted by a single request.
pub const MAX_CHARS: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/47.0.2526.106 Safari/537.36";

/// Language codes the endpoint accepts.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "af", "am", "ar", "bg", "bn", "bs", "ca", "cs", "cy", "da", "de", "el", "en", "es", "et", "eu", "fi",
    "fr", "fr-CA", "gl", "gu", "ha", "hi", "hr", "hu", "id", "is", "it", "iw", "ja", "jw", "km", "kn",
    "ko", "la", "lt", "lv", "ml", "mr", "ms", "my", "ne", "nl", "no", "pa", "pl", "pt", "pt-PT", "ro",
    "ru", "si", "sk", "sq", "sr", "su", "sv", "sw", "ta", "te", "th", "tl", "tr", "uk", "ur", "vi", "yue",
    "zh", "zh-CN", "zh-TW",
];

#[derive(Debug, Clone)]
pub struct GttsOptions {
    /// Top-level domain of the translate host, e.g. `com` or `co.uk`.
    pub tld: String,
    /// Ask for the slower speaking rate.
    pub slow: bool,
    /// Timeout for one HTTP round trip.
    pub request_timeout: Duration,
}

impl Default for GttsOptions {
    fn default() -> Self {
        Self {
            tld: "com".to_string(),
            slow: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub struct GoogleTranslateTts {
    client: Client,
    options: GttsOptions,
    audio_pattern: Regex,
}

impl GoogleTranslateTts {
    pub fn new(options: GttsOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(options.request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        let audio_pattern = Regex::new(r#"jQ1olc","\[\\"([A-Za-z0-9+/=]+)"#)?;
        Ok(Self {
            client,
            options,
            audio_pattern,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://translate.google.{}/_/TranslateWebserverUi/data/batchexecute",
            self.options.tld
        )
    }

    /// Build the `f.req` form value for one piece of text.
    pub fn rpc_payload(&self, text: &str, language: &str) -> Result<String> {
        let speed = if self.options.slow { Value::Bool(true) } else { Value::Null };
        let parameter = serde_json::to_string(&json!([text, language, speed, "null"]))?;
        let rpc = json!([[[GOOGLE_TTS_RPC, parameter, Value::Null, "generic"]]]);
        Ok(serde_json::to_string(&rpc)?)
    }

    /// Pull the base64 audio out of a `batchexecute` response body.
    pub fn decode_audio(&self, body: &str) -> Result<Vec<u8>> {
        let mut audio = Vec::new();
        for line in body.lines() {
            if let Some(caps) = self.audio_pattern.captures(line) {
                let decoded = base64::engine::general_purpose::STANDARD
                    .decode(&caps[1])
                    .context("audio payload is not valid base64")?;
                audio.extend_from_slice(&decoded);
            }
        }
        if audio.is_empty() {
            bail!("No audio stream in response. Unable to find '{}' RPC result", GOOGLE_TTS_RPC);
        }
        Ok(audio)
    }

    async fn fetch_piece(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let payload = self.rpc_payload(text, language)?;
        let body = self
            .client
            .post(self.endpoint())
            .header(header::REFERER, "http://translate.google.com/")
            .form(&[("f.req", payload)])
            .send()
            .await
            .context("request to the speech endpoint failed")?
            .error_for_status()? // convert non-200 into error
            .text()
            .await?;
        self.decode_audio(&body)
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateTts {
    async fn synthesize(&self, text: &str, language: &LanguageTag) -> Result<Bytes> {
        let pieces = split_for_engine(text, MAX_CHARS);
        if pieces.is_empty() {
            bail!("No text to speak");
        }

        let mut audio = Vec::new();
        for (i, piece) in pieces.iter().enumerate() {
            debug!(piece = i, chars = piece.chars().count(), %language, "requesting speech");
            let part = self
                .fetch_piece(piece, language.as_str())
                .await
                .with_context(|| format!("piece {} of {}", i + 1, pieces.len()))?;
            audio.extend_from_slice(&part);
        }
        Ok(Bytes::from(audio))
    }

    fn supports_language(&self, language: &LanguageTag) -> bool {
        SUPPORTED_LANGUAGES.contains(&language.as_str())
    }
}

/// Cut `text` into pieces of at most `max_chars` characters, breaking between
/// words. A single word longer than the limit is split mid-word.
pub fn split_for_engine(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            pieces.extend(chars.chunks(max_chars).map(|part| part.iter().collect::<String>()));
            continue;
        }

        if !current.is_empty() && current_len + 1 + word_len > max_chars {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
