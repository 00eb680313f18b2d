//! HTTP dictionary client for vocabulary cards.
//!
//! Lookup happens against the traditional-script form of the text, which
//! is derived through the translation client. A missing entry is not an
//! error; the card just gets the definition placeholder.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{is_throttling_marker, Definer, Definition, HttpTranslateClient, ProviderError};

/// Dictionary lookup over a remote entry service
pub struct HttpDictionaryClient {
    endpoint: String,
    /// Prefix the urlencoded canonical form is appended to.
    reference_base: String,
    translate: Arc<HttpTranslateClient>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct LookupResponse {
    html: String,
}

impl HttpDictionaryClient {
    pub fn new(
        endpoint: String,
        reference_base: String,
        translate: Arc<HttpTranslateClient>,
    ) -> Self {
        Self {
            endpoint,
            reference_base,
            translate,
            client: reqwest::Client::new(),
        }
    }

    fn entry_url(&self, canonical: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(canonical)
        )
    }
}

#[async_trait]
impl Definer for HttpDictionaryClient {
    async fn canonical(&self, text: &str) -> Result<String, ProviderError> {
        self.translate.to_traditional(text).await
    }

    async fn define(&self, canonical: &str) -> Result<Definition, ProviderError> {
        let response = self
            .client
            .get(self.entry_url(canonical))
            .send()
            .await
            .context("dictionary lookup request failed")?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // No entry for this word
            return Ok(Definition::default());
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Throttled(
                "dictionary rate limit exceeded".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_throttling_marker(&body) {
                return Err(ProviderError::Throttled(format!(
                    "dictionary throttled: {}",
                    body.trim()
                )));
            }
            return Err(ProviderError::Fatal(anyhow!(
                "dictionary lookup failed with {status}: {}",
                body.trim()
            )));
        }

        let entry: LookupResponse = response
            .json()
            .await
            .context("failed to parse dictionary response")?;

        Ok(Definition { html: entry.html })
    }

    fn reference_url(&self, canonical: &str) -> String {
        format!("{}{}", self.reference_base, urlencoding::encode(canonical))
    }
}
