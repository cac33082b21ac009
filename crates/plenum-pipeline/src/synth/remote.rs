//! Hosted synthesis backend.
//!
//! Talks to a bytes-in-the-body TTS endpoint: the request names a model, a
//! voice id, and an output format; the success response body is the encoded
//! audio itself. Transient server errors are retried with the same backoff
//! policy as the translation client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use plenum_core::domain::primary_subtag;

use crate::error::PipelineError;
use crate::synth::SynthBackend;

/// Configuration for [`RemoteSynth`].
#[derive(Debug, Clone)]
pub struct RemoteSynthConfig {
    /// Synthesis endpoint URL.
    pub endpoint: String,

    /// Service API key, sent as `X-API-Key`.
    pub api_key: String,

    /// Service API version header value.
    pub api_version: String,

    /// Model identifier sent in the request body.
    pub model_id: String,

    /// Voice used when no per-language voice is configured.
    pub default_voice_id: String,

    /// Per-language voice overrides, keyed by primary subtag (`"fr"`).
    pub language_voices: HashMap<String, String>,

    /// Output sample rate in Hz.
    pub sample_rate: u32,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Retries after the first attempt for 5xx / network errors.
    pub max_retries: u8,

    /// Base delay for exponential backoff between retries.
    pub retry_base_delay_ms: u64,
}

impl RemoteSynthConfig {
    /// Config for the hosted service with a single default voice.
    #[must_use]
    pub fn new(api_key: impl Into<String>, default_voice_id: impl Into<String>) -> Self {
        Self {
            endpoint: "https://api.cartesia.ai/tts/bytes".to_string(),
            api_key: api_key.into(),
            api_version: "2025-04-16".to_string(),
            model_id: "sonic-3-latest".to_string(),
            default_voice_id: default_voice_id.into(),
            language_voices: HashMap::new(),
            sample_rate: 44_100,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_base_delay_ms: 250,
        }
    }
}

/// [`SynthBackend`] over a hosted bytes endpoint.
pub struct RemoteSynth {
    client: reqwest::Client,
    config: RemoteSynthConfig,
}

impl RemoteSynth {
    /// Create a client for the hosted service.
    pub fn new(config: RemoteSynthConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PipelineError::SynthesisFailed(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn voice_for(&self, language: &str) -> &str {
        self.config
            .language_voices
            .get(primary_subtag(language))
            .unwrap_or(&self.config.default_voice_id)
    }

    fn request_body(&self, text: &str, voice_id: &str) -> serde_json::Value {
        json!({
            "model_id": self.config.model_id,
            "transcript": text,
            "voice": { "mode": "id", "id": voice_id },
            "output_format": {
                "container": "wav",
                "encoding": "pcm_f32le",
                "sample_rate": self.config.sample_rate,
            },
        })
    }
}

#[async_trait]
impl SynthBackend for RemoteSynth {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, PipelineError> {
        let body = self.request_body(text, self.voice_for(language));
        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(
                    self.config.retry_base_delay_ms * 2u64.pow(u32::from(attempt) - 1),
                );
                tokio::time::sleep(delay).await;
            }

            let request = self
                .client
                .post(&self.config.endpoint)
                .header("Cartesia-Version", &self.config.api_version)
                .header("X-API-Key", &self.config.api_key)
                .json(&body);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        // An empty body is success-with-no-audio.
                        let bytes = response.bytes().await.map_err(|e| {
                            PipelineError::SynthesisFailed(format!("read body: {e}"))
                        })?;
                        tracing::debug!(language, bytes = bytes.len(), "Synthesized remotely");
                        return Ok(bytes.to_vec());
                    }

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

        Err(PipelineError::SynthesisFailed(last_error))
    }
}
