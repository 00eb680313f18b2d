//! External service integrations behind narrow traits.
//!
//! Every slow or failure-prone operation the pipeline depends on (speech
//! synthesis, translation, dictionary lookup, tempo transformation) lives
//! behind one of these traits. The concrete cloud-backed bundle is
//! assembled once at startup from configuration and passed into the
//! pipeline; nothing here is process-global.

pub mod dictionary;
pub mod ffmpeg;
pub mod pinyin;
pub mod speech;
pub mod translate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;

pub use dictionary::HttpDictionaryClient;
pub use ffmpeg::FfmpegTempoShifter;
pub use pinyin::PinyinTransliterator;
pub use speech::HttpSpeechClient;
pub use translate::HttpTranslateClient;

/// Failure taxonomy for provider calls.
///
/// `Throttled` is the only recoverable class: the retry wrapper consumes
/// it and the caller never sees it. Everything else aborts the run.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The remote service signalled a rate limit.
    #[error("throttled by remote service: {0}")]
    Throttled(String),

    /// Any other provider failure; fatal for the whole run.
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

/// Markers remote services use to signal rate limiting in error bodies.
/// Matched in addition to HTTP 429 because some gateways tunnel the
/// signal through a 400 with a typed error code.
pub(crate) fn is_throttling_marker(body: &str) -> bool {
    body.contains("ThrottlingException") || body.contains("rate limit")
}

/// A dictionary entry as returned by the lookup service.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    /// Entry content, HTML-formatted for deck import.
    pub html: String,
}

impl Definition {
    pub fn len(&self) -> usize {
        self.html.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

/// Text-to-speech over a remote service.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and return the encoded MP3 bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Machine translation over a remote service.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, ProviderError>;
}

/// Local transliteration; infallible.
pub trait Transliterator: Send + Sync {
    fn transliterate(&self, text: &str) -> String;
}

/// Dictionary lookup for vocabulary cards.
#[async_trait]
pub trait Definer: Send + Sync {
    /// Derive the canonical (traditional-script) form used for lookup.
    async fn canonical(&self, text: &str) -> Result<String, ProviderError>;

    /// Look up the canonical form.
    async fn define(&self, canonical: &str) -> Result<Definition, ProviderError>;

    /// Human-browsable reference URL for the canonical form.
    fn reference_url(&self, canonical: &str) -> String;
}

/// Audio tempo transformation of a synthesized artifact.
#[async_trait]
pub trait TempoShifter: Send + Sync {
    /// Produce a tempo-adjusted copy of `input` next to it, returning the
    /// new path.
    async fn change_tempo(&self, input: &Path) -> Result<PathBuf, ProviderError>;
}

/// The capability bundle handed to the pipeline.
#[derive(Clone)]
pub struct ProviderSet {
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub translator: Arc<dyn Translator>,
    pub transliterator: Arc<dyn Transliterator>,
    /// Optional: vocabulary cards fall back to the placeholder definition
    /// when no dictionary is configured.
    pub definer: Option<Arc<dyn Definer>>,
    pub tempo: Arc<dyn TempoShifter>,
}

impl ProviderSet {
    /// Assemble a bundle from explicit capabilities.
    pub fn new(
        speech: Arc<dyn SpeechSynthesizer>,
        translator: Arc<dyn Translator>,
        transliterator: Arc<dyn Transliterator>,
        definer: Option<Arc<dyn Definer>>,
        tempo: Arc<dyn TempoShifter>,
    ) -> Self {
        Self {
            speech,
            translator,
            transliterator,
            definer,
            tempo,
        }
    }

    /// Assemble the cloud-backed bundle from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let speech_url = config.speech.url.clone().context(
            "speech synthesis endpoint not configured; set speech.url in \
             .cardmill/config.yaml or CARDMILL_SPEECH_URL",
        )?;
        let translate_url = config.translate.url.clone().context(
            "translation endpoint not configured; set translate.url in \
             .cardmill/config.yaml or CARDMILL_TRANSLATE_URL",
        )?;

        let speech = Arc::new(HttpSpeechClient::new(
            speech_url,
            config.speech.api_key.clone(),
            config.speech.voice.clone(),
        ));
        let translate_client = Arc::new(HttpTranslateClient::new(
            translate_url,
            config.translate.api_key.clone(),
            config.translate.source_lang.clone(),
            config.translate.target_lang.clone(),
        ));
        let definer = config.dictionary.as_ref().map(|dictionary| {
            Arc::new(HttpDictionaryClient::new(
                dictionary.url.clone(),
                dictionary.reference_base.clone(),
                Arc::clone(&translate_client),
            )) as Arc<dyn Definer>
        });

        Ok(Self {
            speech,
            translator: translate_client,
            transliterator: Arc::new(PinyinTransliterator),
            definer,
            tempo: Arc::new(FfmpegTempoShifter::new(config.tempo, config.audio_quality)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttling_markers() {
        let body = serde_json::json!({
            "code": "ThrottlingException",
            "message": "slow down",
        })
        .to_string();
        assert!(is_throttling_marker(&body));
        assert!(is_throttling_marker("translation rate limit exceeded"));
        assert!(!is_throttling_marker("internal server error"));
    }

    #[test]
    fn test_definition_length_counts_chars() {
        let definition = Definition {
            html: "學習".to_string(),
        };
        assert_eq!(definition.len(), 2);
        assert!(!definition.is_empty());
        assert!(Definition::default().is_empty());
    }
}
