use async_trait::async_trait;
use bytes::Bytes;

use crate::language::LanguageTag;

/// A speech engine that turns one piece of text into a complete audio payload.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` spoken in `language`, returning the encoded audio.
    async fn synthesize(&self, text: &str, language: &LanguageTag) -> anyhow::Result<Bytes>;

    /// Whether the engine can speak `language` at all.
    fn supports_language(&self, _language: &LanguageTag) -> bool {
        true
    }

    /// Content type of the payloads returned by [`SpeechSynthesizer::synthesize`].
    fn content_type(&self) -> &'static str {
        "audio/mpeg"
    }
}
