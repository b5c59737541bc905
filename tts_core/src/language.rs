//! Language tags, detection and the per-sentence assignment policy.

use std::{fmt, str::FromStr, sync::Arc};

use anyhow::anyhow;
use tracing::{debug, warn};

/// A language code understood by the synthesis engine, or the `unknown`
/// sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    /// Tag in the engine's casing: lowercase language, uppercase region
    /// (`EN` becomes `en`, `zh-cn` becomes `zh-CN`).
    pub fn canonical(code: &str) -> Self {
        let mut parts = code.trim().splitn(2, ['-', '_']);
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();
        match parts.next() {
            Some(region) => Self(format!("{language}-{}", region.to_ascii_uppercase())),
            None => Self(language),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One ranked answer from a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageCandidate {
    pub language: LanguageTag,
    pub confidence: f64,
}

/// A language identification service.
pub trait LanguageDetector: Send + Sync {
    /// Rank candidate languages for `text`. An empty list means no guess.
    fn detect(&self, text: &str) -> anyhow::Result<Vec<LanguageCandidate>>;
}

/// Trigram-based detector backed by `whatlang`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> anyhow::Result<Vec<LanguageCandidate>> {
        let info = whatlang::detect(text)
            .ok_or_else(|| anyhow!("no language features found in {:?}", text))?;
        let code = engine_code(info.lang()).ok_or_else(|| {
            anyhow!("detected {} which has no engine language code", info.lang().eng_name())
        })?;
        Ok(vec![LanguageCandidate {
            language: LanguageTag::new(code),
            confidence: info.confidence(),
        }])
    }
}

/// Map a `whatlang` language onto the code the speech engine expects.
fn engine_code(lang: whatlang::Lang) -> Option<&'static str> {
    use whatlang::Lang::*;
    let code = match lang {
        Afr => "af",
        Ara => "ar",
        Ben => "bn",
        Bul => "bg",
        Cat => "ca",
        Ces => "cs",
        Cmn => "zh-CN",
        Dan => "da",
        Deu => "de",
        Ell => "el",
        Eng => "en",
        Est => "et",
        Fin => "fi",
        Fra => "fr",
        Guj => "gu",
        Heb => "iw",
        Hin => "hi",
        Hrv => "hr",
        Hun => "hu",
        Ind => "id",
        Ita => "it",
        Jav => "jw",
        Jpn => "ja",
        Kan => "kn",
        Khm => "km",
        Kor => "ko",
        Lat => "la",
        Lav => "lv",
        Mal => "ml",
        Mar => "mr",
        Mya => "my",
        Nep => "ne",
        Nld => "nl",
        Nob => "no",
        Pol => "pl",
        Por => "pt",
        Ron => "ro",
        Rus => "ru",
        Sin => "si",
        Slk => "sk",
        Spa => "es",
        Srp => "sr",
        Swe => "sv",
        Tam => "ta",
        Tel => "te",
        Tgl => "tl",
        Tha => "th",
        Tur => "tr",
        Ukr => "uk",
        Urd => "ur",
        Vie => "vi",
        _ => return None,
    };
    Some(code)
}

/// How a sentence gets its language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguagePolicy {
    /// Use the detector's highest-confidence candidate.
    Detected,
    /// Tag every sentence with the same language; the detector is not run.
    Fixed(LanguageTag),
}

impl Default for LanguagePolicy {
    fn default() -> Self {
        LanguagePolicy::Fixed(LanguageTag::new("en"))
    }
}

impl FromStr for LanguagePolicy {
    type Err = anyhow::Error;

    /// `detect` (or `detected`, `auto`) selects detection; anything else is
    /// taken as a fixed language code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "" => Err(anyhow!("language policy cannot be empty")),
            "detect" | "detected" | "auto" => Ok(LanguagePolicy::Detected),
            _ => Ok(LanguagePolicy::Fixed(LanguageTag::canonical(s))),
        }
    }
}

/// Applies a [`LanguagePolicy`] to sentences.
#[derive(Clone)]
pub struct LanguageAssigner {
    policy: LanguagePolicy,
    detector: Arc<dyn LanguageDetector>,
}

impl LanguageAssigner {
    pub fn new(policy: LanguagePolicy, detector: Arc<dyn LanguageDetector>) -> Self {
        Self { policy, detector }
    }

    /// Fixed-language assigner that never consults a detector.
    pub fn fixed(language: LanguageTag) -> Self {
        Self::new(LanguagePolicy::Fixed(language), Arc::new(WhatlangDetector))
    }

    /// Tag for `sentence`. Detection failures are logged and produce the
    /// `unknown` sentinel; they never reach the caller.
    pub fn assign(&self, sentence: &str) -> LanguageTag {
        match &self.policy {
            LanguagePolicy::Fixed(tag) => tag.clone(),
            LanguagePolicy::Detected => match self.detector.detect(sentence) {
                Ok(candidates) => candidates
                    .into_iter()
                    .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
                    .map(|best| {
                        debug!(language = %best.language, confidence = best.confidence, "language detected");
                        best.language
                    })
                    .unwrap_or_else(LanguageTag::unknown),
                Err(e) => {
                    warn!("language detection failed: {e}");
                    LanguageTag::unknown()
                }
            },
        }
    }
}

impl fmt::Debug for LanguageAssigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageAssigner")
            .field("policy", &self.policy)
            .field("detector", &"<dyn LanguageDetector>")
            .finish()
    }
}
