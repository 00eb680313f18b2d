//! Per-card enrichment: fan out to the providers, join, assemble.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::card::{Flashcard, Kind, DEFINITION_PLACEHOLDER, TRANSLATION_PLACEHOLDER};
use crate::providers::{ProviderError, ProviderSet};

use super::retry::with_throttle_retry;

/// The meaning branch result, shaped by the card's kind.
enum Meaning {
    Translation(String),
    Definition { html: String, url: String },
}

/// Enriches one card at a time by running three provider branches
/// concurrently and joining them before the card is released.
pub struct Enricher {
    providers: ProviderSet,
    output_dir: PathBuf,
    retry_interval: Duration,
}

impl Enricher {
    pub fn new(providers: ProviderSet, output_dir: PathBuf, retry_interval: Duration) -> Self {
        Self {
            providers,
            output_dir,
            retry_interval,
        }
    }

    /// Populate every remaining field of `card`.
    ///
    /// Three branches run concurrently:
    /// - speech: synthesize, persist `<id>.mp3`, then tempo-shift the
    ///   written file (the shift never starts before the write succeeds)
    /// - transliteration
    /// - meaning: translation for sentences, dictionary lookup for
    ///   vocabulary
    ///
    /// All three must finish before the card is assembled; no partial
    /// cards escape this function.
    pub async fn enrich(&self, mut card: Flashcard) -> Result<Flashcard, ProviderError> {
        let speech_branch = async {
            let audio = with_throttle_retry(self.retry_interval, "speech synthesis", || {
                self.providers.speech.synthesize(&card.text)
            })
            .await?;

            let audio_file = self.output_dir.join(format!("{}.mp3", card.id));
            tokio::fs::write(&audio_file, &audio)
                .await
                .with_context(|| format!("failed to write audio file {}", audio_file.display()))?;

            let reduced = self.providers.tempo.change_tempo(&audio_file).await?;
            Ok::<(PathBuf, PathBuf), ProviderError>((audio_file, reduced))
        };

        let transliteration_branch = async { self.providers.transliterator.transliterate(&card.text) };

        let meaning_branch = async {
            match card.kind {
                Kind::Sentence => {
                    let translation = with_throttle_retry(self.retry_interval, "translation", || {
                        self.providers.translator.translate(&card.text)
                    })
                    .await?;
                    Ok::<Meaning, ProviderError>(Meaning::Translation(translation))
                }
                Kind::Vocabulary => match &self.providers.definer {
                    Some(definer) => {
                        let canonical =
                            with_throttle_retry(self.retry_interval, "canonicalization", || {
                                definer.canonical(&card.text)
                            })
                            .await?;
                        let url = definer.reference_url(&canonical);
                        let definition =
                            with_throttle_retry(self.retry_interval, "dictionary lookup", || {
                                definer.define(&canonical)
                            })
                            .await?;
                        Ok(Meaning::Definition {
                            html: definition.html,
                            url,
                        })
                    }
                    None => Ok(Meaning::Definition {
                        html: String::new(),
                        url: String::new(),
                    }),
                },
            }
        };

        let (audio, transliteration, meaning) =
            tokio::join!(speech_branch, transliteration_branch, meaning_branch);

        let (audio_file, reduced_speed_audio_file) = audio?;
        card.audio_file = audio_file;
        card.reduced_speed_audio_file = reduced_speed_audio_file;
        card.transliteration = transliteration;

        // An empty meaning is a "fill in later" convention, not an error.
        match meaning? {
            Meaning::Translation(translation) => {
                card.translation = if translation.is_empty() {
                    TRANSLATION_PLACEHOLDER.to_string()
                } else {
                    translation
                };
            }
            Meaning::Definition { html, url } => {
                card.definition = if html.is_empty() {
                    DEFINITION_PLACEHOLDER.to_string()
                } else {
                    html
                };
                card.dictionary_url = url;
            }
        }

        Ok(card)
    }
}
