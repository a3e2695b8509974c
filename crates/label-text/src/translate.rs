//! Translation gateway

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Errors returned by a translation gateway
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("translation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("translation transport error: {0}")]
    Transport(reqwest::Error),

    #[error("translation service returned {code}: {body}")]
    Status {
        code: reqwest::StatusCode,
        body: String,
    },

    #[error("translation response could not be decoded: {0}")]
    Decode(String),
}

/// Phrase translation between two languages
///
/// This is the only collaborator of label resolution that may perform remote
/// calls. Implementations must be safe to share across request threads.
pub trait TranslationGateway: Send + Sync {
    /// Translate `text` from language `from` into language `to`
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError>;

    /// Turn a camel-case identifier into a space-separated phrase
    fn break_camel(&self, identifier: &str) -> String {
        crate::break_camel(identifier)
    }
}

/// Gateway that returns the phrase untranslated
///
/// Used when no translation endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

impl TranslationGateway for PassthroughTranslator {
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError> {
        if from != to {
            warn!(from, to, "no translation endpoint configured, label left untranslated");
        }
        Ok(text.to_string())
    }
}

/// Request body of a LibreTranslate-compatible `/translate` endpoint
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Blocking HTTP client for a LibreTranslate-compatible service
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpTranslator {
    /// Create a client posting to `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TranslateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TranslateError::Transport)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
            timeout,
        })
    }

    /// Attach an API key sent with every request
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The configured endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_transport(&self, err: reqwest::Error) -> TranslateError {
        if err.is_timeout() {
            TranslateError::Timeout(self.timeout)
        } else {
            TranslateError::Transport(err)
        }
    }
}

impl TranslationGateway for HttpTranslator {
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError> {
        debug!(endpoint = %self.endpoint, from, to, "translating label");

        let body = TranslateRequest {
            q: text,
            source: from,
            target: to,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| self.map_transport(e))?;

        let code = response.status();
        if !code.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TranslateError::Status { code, body });
        }

        let decoded: TranslateResponse = response
            .json()
            .map_err(|e| TranslateError::Decode(e.to_string()))?;

        Ok(decoded.translated_text)
    }
}
