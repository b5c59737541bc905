//! Concurrent per-sentence synthesis.
//!
//! Every speakable segment becomes one tokio task in a `JoinSet`. A semaphore
//! caps how many engine calls are in flight, each call runs under its own
//! deadline, and results travel back through the join set rather than a shared
//! collection. Dropping the returned future drops the join set, which aborts
//! whatever is still running.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, warn};

use crate::{collector::FailurePolicy, error::PipelineError, language::LanguageTag, synth::SpeechSynthesizer};

/// A sentence paired with the language it will be spoken in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub text: String,
    pub language: LanguageTag,
}

/// Audio for one segment, still tagged with the segment's position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub index: usize,
    pub audio: Bytes,
}

/// Outcome of a single synthesis task.
pub type TaskOutcome = Result<AudioChunk, PipelineError>;

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Upper bound on concurrent engine calls. Zero is treated as one.
    pub max_concurrency: usize,
    /// Deadline for a single engine call, measured once it holds a permit.
    pub task_timeout: Option<Duration>,
    pub failure_policy: FailurePolicy,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            task_timeout: Some(Duration::from_secs(30)),
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

/// Run one synthesis task per segment and wait for them.
///
/// Segments tagged `unknown` are skipped. Outcomes come back in completion
/// order. Under [`FailurePolicy::FailFast`] the first failure aborts the
/// remaining tasks and is the last element returned.
pub async fn dispatch(
    segments: Vec<Segment>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    options: &DispatchOptions,
) -> Vec<TaskOutcome> {
    let permits = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for segment in segments {
        if segment.language.is_unknown() {
            debug!(index = segment.index, "skipping sentence with unknown language");
            continue;
        }
        let synthesizer = Arc::clone(&synthesizer);
        let permits = Arc::clone(&permits);
        let deadline = options.task_timeout;

        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::Task(e.to_string()))?;
            let index = segment.index;
            let call = synthesizer.synthesize(&segment.text, &segment.language);
            let result = match deadline {
                Some(after) => tokio::time::timeout(after, call)
                    .await
                    .map_err(|_| PipelineError::Timeout { index, after })?,
                None => call.await,
            };
            let audio = result.map_err(|source| PipelineError::Synthesis { index, source })?;
            debug!(index, bytes = audio.len(), language = %segment.language, "sentence synthesized");
            Ok(AudioChunk { index, audio })
        });
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .map_err(|e| PipelineError::Task(e.to_string()))
            .and_then(|outcome| outcome);

        let failed = outcome.is_err();
        if let Err(e) = &outcome {
            warn!("{e}");
        }
        outcomes.push(outcome);

        if failed && options.failure_policy == FailurePolicy::FailFast {
            if !tasks.is_empty() {
                debug!(pending = tasks.len(), "aborting sibling synthesis tasks");
            }
            tasks.abort_all();
            break;
        }
    }

    outcomes
}
