//! Order-preserving reassembly of synthesis results.

use std::str::FromStr;

use anyhow::anyhow;
use bytes::Bytes;
use tracing::warn;

use crate::{dispatch::TaskOutcome, error::PipelineError};

/// What to do when some sentences fail to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Any failure fails the whole request.
    #[default]
    FailFast,
    /// Failed sentences are left out; the request fails only when nothing
    /// was synthesized.
    Partial,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "partial" => Ok(FailurePolicy::Partial),
            other => Err(anyhow!("unknown failure policy: {other}")),
        }
    }
}

/// Sort successful chunks by sentence index and strip the index.
///
/// Missing sentences leave no gap marker. When a failure decides the result,
/// the lowest-indexed failure among `outcomes` is returned. Under
/// [`FailurePolicy::FailFast`] dispatch stops at the first failure to
/// complete, so that is usually the only one present.
pub fn collect(outcomes: Vec<TaskOutcome>, policy: FailurePolicy) -> Result<Vec<Bytes>, PipelineError> {
    let mut chunks = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(chunk) => chunks.push(chunk),
            Err(e) => failures.push(e),
        }
    }

    if policy == FailurePolicy::FailFast || chunks.is_empty() {
        let earliest = failures
            .into_iter()
            .min_by_key(|e| e.index().unwrap_or(usize::MAX));
        if let Some(e) = earliest {
            return Err(e);
        }
    } else if !failures.is_empty() {
        warn!(
            dropped = failures.len(),
            kept = chunks.len(),
            "omitting sentences that failed to synthesize"
        );
    }

    chunks.sort_by_key(|chunk| chunk.index);
    Ok(chunks.into_iter().map(|chunk| chunk.audio).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::AudioChunk;

    fn chunk(index: usize, audio: &'static str) -> TaskOutcome {
        Ok(AudioChunk {
            index,
            audio: Bytes::from_static(audio.as_bytes()),
        })
    }

    fn failure(index: usize) -> TaskOutcome {
        Err(PipelineError::Synthesis {
            index,
            source: anyhow!("engine said no"),
        })
    }

    #[test]
    fn test_collect_sorts_by_index() {
        let out = collect(vec![chunk(2, "c"), chunk(0, "a"), chunk(1, "b")], FailurePolicy::FailFast).unwrap();
        assert_eq!(out, vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]);
    }

    #[test]
    fn test_collect_leaves_gaps_unmarked() {
        let out = collect(vec![chunk(3, "d"), chunk(0, "a")], FailurePolicy::FailFast).unwrap();
        assert_eq!(out, vec![Bytes::from("a"), Bytes::from("d")]);
    }

    #[test]
    fn test_collect_keeps_duplicates() {
        let out = collect(vec![chunk(1, "x"), chunk(1, "x")], FailurePolicy::FailFast).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_collect_fail_fast_returns_earliest_failure() {
        let err = collect(vec![chunk(0, "a"), failure(4), failure(2)], FailurePolicy::FailFast).unwrap_err();
        assert_eq!(err.index(), Some(2));
    }

    #[test]
    fn test_collect_partial_omits_failures() {
        let out = collect(vec![failure(1), chunk(2, "c"), chunk(0, "a")], FailurePolicy::Partial).unwrap();
        assert_eq!(out, vec![Bytes::from("a"), Bytes::from("c")]);
    }

    #[test]
    fn test_collect_partial_fails_when_nothing_survives() {
        let err = collect(vec![failure(1), failure(0)], FailurePolicy::Partial).unwrap_err();
        assert_eq!(err.index(), Some(0));
    }

    #[test]
    fn test_collect_empty() {
        assert!(collect(Vec::new(), FailurePolicy::FailFast).unwrap().is_empty());
    }

    #[test]
    fn test_failure_policy_from_str() {
        assert_eq!("fail-fast".parse::<FailurePolicy>().unwrap(), FailurePolicy::FailFast);
        assert_eq!("Partial".parse::<FailurePolicy>().unwrap(), FailurePolicy::Partial);
        assert!("sometimes".parse::<FailurePolicy>().is_err());
    }
}
