//! HTTP speech synthesis client.
//!
//! Posts text to a TTS gateway and receives encoded MP3 bytes. The
//! gateway throttles aggressively under batch load; rate-limit responses
//! are mapped to [`ProviderError::Throttled`] so the retry wrapper can
//! absorb them.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use super::{is_throttling_marker, ProviderError, SpeechSynthesizer};

/// Speech synthesis over a remote TTS gateway
pub struct HttpSpeechClient {
    endpoint: String,
    api_key: Option<String>,
    voice: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice: &'a str,
    format: &'a str,
}

impl HttpSpeechClient {
    pub fn new(endpoint: String, api_key: Option<String>, voice: String) -> Self {
        Self {
            endpoint,
            api_key,
            voice,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let mut request = self.client.post(&self.endpoint).json(&SynthesizeRequest {
            text,
            voice: &self.voice,
            format: "mp3",
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("speech synthesis request failed")?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Throttled(
                "speech synthesis rate limit exceeded".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_throttling_marker(&body) {
                return Err(ProviderError::Throttled(format!(
                    "speech synthesis throttled: {}",
                    body.trim()
                )));
            }
            return Err(ProviderError::Fatal(anyhow!(
                "speech synthesis failed with {status}: {}",
                body.trim()
            )));
        }

        let audio = response
            .bytes()
            .await
            .context("failed to read synthesized audio stream")?;

        Ok(audio.to_vec())
    }
}
