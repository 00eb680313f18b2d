//! HTTP translation client.
//!
//! One client serves two purposes: translating sentence cards into the
//! target language, and deriving the traditional-script form of
//! vocabulary text by requesting the `zh-TW` variant of the same service.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{is_throttling_marker, ProviderError, Translator};

/// Target language code for traditional-script conversion.
const TRADITIONAL_TARGET: &str = "zh-TW";

/// Machine translation over a remote gateway
pub struct HttpTranslateClient {
    endpoint: String,
    api_key: Option<String>,
    source_lang: String,
    target_lang: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source: &'a str,
    target: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translated: String,
}

impl HttpTranslateClient {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        source_lang: String,
        target_lang: String,
    ) -> Self {
        Self {
            endpoint,
            api_key,
            source_lang,
            target_lang,
            client: reqwest::Client::new(),
        }
    }

    /// Convert text to its traditional-script form.
    pub async fn to_traditional(&self, text: &str) -> Result<String, ProviderError> {
        self.request(text, TRADITIONAL_TARGET).await
    }

    async fn request(&self, text: &str, target: &str) -> Result<String, ProviderError> {
        let mut request = self.client.post(&self.endpoint).json(&TranslateRequest {
            text,
            source: &self.source_lang,
            target,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.context("translation request failed")?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Throttled(
                "translation rate limit exceeded".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_throttling_marker(&body) {
                return Err(ProviderError::Throttled(format!(
                    "translation throttled: {}",
                    body.trim()
                )));
            }
            return Err(ProviderError::Fatal(anyhow!(
                "translation failed with {status}: {}",
                body.trim()
            )));
        }

        let translated: TranslateResponse = response
            .json()
            .await
            .context("failed to parse translation response")?;

        Ok(translated.translated)
    }
}

#[async_trait]
impl Translator for HttpTranslateClient {
    async fn translate(&self, text: &str) -> Result<String, ProviderError> {
        self.request(text, &self.target_lang).await
    }
}
