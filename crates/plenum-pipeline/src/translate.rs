//! Text translation port and HTTP client.
//!
//! The production implementation talks to a chat-completions style endpoint
//! with a fixed system prompt, retrying transient server errors with
//! exponential backoff. The trait exists so the pipeline can be tested with
//! scripted translators.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::PipelineError;

/// System prompt sent with every translation request. The service must
/// return the translation alone, with no conversational framing.
const SYSTEM_PROMPT: &str = "You are a translator. Translate the following text directly to the \
     target language. Do not add any conversational text, notes, or \
     punctuation explanations. Just the translation.";

// ── Port ───────────────────────────────────────────────────────────

/// Translates text into a target language.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_language` (a BCP 47 tag).
    ///
    /// Callers treat any error as "use the original text" — translation
    /// failure never drops a segment.
    async fn translate(&self, text: &str, target_language: &str)
    -> Result<String, PipelineError>;
}

// ── Configuration ──────────────────────────────────────────────────

/// Configuration for [`HttpTranslator`].
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// Chat endpoint URL.
    pub endpoint: String,

    /// Bearer token, if the endpoint requires one.
    pub api_key: Option<String>,

    /// Model identifier sent in the request body.
    pub model: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Retries after the first attempt for 5xx / network errors.
    pub max_retries: u8,

    /// Base delay for exponential backoff between retries.
    pub retry_base_delay_ms: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ollama.com/api/chat".to_string(),
            api_key: None,
            model: "eburon-ai:cloud".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_base_delay_ms: 250,
        }
    }
}

// ── HTTP client ────────────────────────────────────────────────────

/// Production [`Translator`] over a chat-completions HTTP endpoint.
pub struct HttpTranslator {
    client: reqwest::Client,
    config: TranslatorConfig,
}

/// Non-streaming chat response envelope.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl HttpTranslator {
    /// Create a translator client.
    pub fn new(config: TranslatorConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PipelineError::TranslationFailed(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn request_body(&self, text: &str, target_language: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "stream": false,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": format!("Translate to {target_language}:\n\n{text}") },
            ],
        })
    }

    async fn post_with_retry(&self, body: &serde_json::Value) -> Result<String, PipelineError> {
        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(
                    self.config.retry_base_delay_ms * 2u64.pow(u32::from(attempt) - 1),
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(&self.config.endpoint).json(body);
            if let Some(ref key) = self.config.api_key {
                request = request.header("Authorization", format!("Bearer {key}"));
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|e| {
                            PipelineError::TranslationFailed(format!("read body: {e}"))
                        });
                    }

                    // 5xx is retryable; 4xx fails immediately.
                    last_error = format!("{} returned {status}", self.config.endpoint);
                    if !status.is_server_error() {
                        break;
                    }
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }
        }

        Err(PipelineError::TranslationFailed(last_error))
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, PipelineError> {
        let body = self.request_body(text, target_language);
        let raw = self.post_with_retry(&body).await?;

        let parsed: ChatResponse = serde_json::from_str(&raw)
            .map_err(|e| PipelineError::TranslationFailed(format!("malformed response: {e}")))?;

        let translation = parsed.message.content.trim().to_string();
        if translation.is_empty() {
            return Err(PipelineError::TranslationFailed(
                "empty translation".to_string(),
            ));
        }

        tracing::debug!(
            target_language,
            original_len = text.len(),
            translated_len = translation.len(),
            "Translated segment"
        );
        Ok(translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let translator = HttpTranslator::new(TranslatorConfig::default()).unwrap();
        let body = translator.request_body("Hello", "fr-FR");

        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.starts_with("Translate to fr-FR:"));
        assert!(user.ends_with("Hello"));
    }

    #[test]
    fn response_parsing() {
        let raw = r#"{"message":{"role":"assistant","content":" Bonjour "}}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.message.content.trim(), "Bonjour");

        assert!(serde_json::from_str::<ChatResponse>("{\"done\":true}").is_err());
    }
}
