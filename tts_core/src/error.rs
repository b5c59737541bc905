use std::time::Duration;

use thiserror::Error;

/// Failures of the sentence synthesis pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Nothing in the text could be tagged with a speakable language.
    #[error("Could not detect any languages")]
    NoSegments,

    #[error("synthesis failed for sentence {index}: {source:#}")]
    Synthesis {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("synthesis of sentence {index} timed out after {after:?}")]
    Timeout { index: usize, after: Duration },

    /// The task running a synthesis call panicked or was cancelled.
    #[error("synthesis task failed: {0}")]
    Task(String),
}

impl PipelineError {
    /// Index of the sentence the failure belongs to, when known.
    pub fn index(&self) -> Option<usize> {
        match self {
            PipelineError::Synthesis { index, .. } | PipelineError::Timeout { index, .. } => {
                Some(*index)
            }
            PipelineError::NoSegments | PipelineError::Task(_) => None,
        }
    }
}
