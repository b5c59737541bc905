mod collector;
mod dispatch;
mod error;
mod language;
mod sentence;
mod stream;
mod synth;

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

pub use collector::{collect, FailurePolicy};
pub use dispatch::{dispatch, AudioChunk, DispatchOptions, Segment, TaskOutcome};
pub use error::PipelineError;
pub use language::{
    LanguageAssigner, LanguageCandidate, LanguageDetector, LanguagePolicy, LanguageTag, WhatlangDetector,
};
pub use sentence::{sentences, split_sentences, Sentence, TERMINATORS};
pub use stream::audio_stream;
pub use synth::SpeechSynthesizer;

/// Turns request text into ordered, per-sentence audio.
///
/// Cloning is cheap; the engine and detector are shared.
#[derive(Clone)]
pub struct TtsManager {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    assigner: LanguageAssigner,
    options: DispatchOptions,
}

impl TtsManager {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, assigner: LanguageAssigner) -> Self {
        Self {
            synthesizer,
            assigner,
            options: DispatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Content type of the audio this manager produces.
    pub fn content_type(&self) -> &'static str {
        self.synthesizer.content_type()
    }

    /// Split `text` and tag every sentence with a language.
    ///
    /// A language the engine cannot speak becomes `unknown`, so the sentence
    /// is later skipped instead of failing the request.
    pub fn segment(&self, text: &str) -> Vec<Segment> {
        sentences(text)
            .into_iter()
            .map(|Sentence { index, text }| {
                let mut language = self.assigner.assign(&text);
                if !language.is_unknown() && !self.synthesizer.supports_language(&language) {
                    warn!(index, %language, "language not supported by the speech engine");
                    language = LanguageTag::unknown();
                }
                Segment { index, text, language }
            })
            .collect()
    }

    /// Synthesize every speakable sentence of `text` and return the audio in
    /// sentence order.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<Bytes>, PipelineError> {
        let segments = self.segment(text);
        let speakable = segments.iter().filter(|s| !s.language.is_unknown()).count();
        info!(sentences = segments.len(), speakable, "dispatching sentence synthesis");
        if speakable == 0 {
            return Err(PipelineError::NoSegments);
        }

        let outcomes = dispatch(segments, Arc::clone(&self.synthesizer), &self.options).await;
        collect(outcomes, self.options.failure_policy)
    }
}

impl std::fmt::Debug for TtsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtsManager")
            .field("synthesizer", &"<dyn SpeechSynthesizer>")
            .field("assigner", &self.assigner)
            .field("options", &self.options)
            .finish()
    }
}
