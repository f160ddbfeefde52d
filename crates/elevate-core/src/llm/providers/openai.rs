use crate::config::LlmConfig;
use crate::core_types::{CompletionRequest, CompletionResponse};
use crate::errors::ElevateError;
use crate::llm::{CompletionClient, SpeechRequest, SpeechSynthesizer};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const GEMINI_OPENAI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Client for any endpoint speaking the OpenAI chat-completions protocol.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
}

impl OpenAIClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: OPENAI_API_BASE.to_string(),
            model,
            temperature: None,
            max_tokens: None,
            timeout: None,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Default temperature for requests that do not set one.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
        });

        if let Some(temp) = request.temperature.or(self.temperature) {
            body["temperature"] = temp.into();
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }

        if let Some(format) = &request.response_format {
            body["response_format"] = json!(format);
        }

        body
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ElevateError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request_body(&request);

        log::debug!("Completion request to {} with model {}", url, self.model);
        for (i, msg) in request.messages.iter().enumerate() {
            log::debug!("  Message #{}: role={:?}, content={}", i, msg.role, msg.content);
        }

        let mut http_request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(timeout) = self.timeout {
            http_request = http_request.timeout(timeout);
        }

        let response = http_request.send().await.map_err(|e| {
            log::error!("HTTP request to {} failed: {}", url, e);
            ElevateError::from(e)
        })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            ElevateError::Completion(format!("Failed to read response: {}", e))
        })?;

        log::debug!("Completion response ({}): {}", status, response_text);

        if status == StatusCode::TOO_MANY_REQUESTS {
            log::error!("Rate limited by {}: {}", url, response_text);
            return Err(ElevateError::RateLimited(response_text));
        }

        if !status.is_success() {
            log::error!("Completion request failed with status {}: {}", status, response_text);
            return Err(ElevateError::Completion(format!(
                "API request failed with status {}: {}",
                status, response_text
            )));
        }

        let parsed: CompletionResponse = serde_json::from_str(&response_text).map_err(|e| {
            ElevateError::Completion(format!("Invalid completion response: {}", e))
        })?;

        if parsed.choices.is_empty() {
            return Err(ElevateError::Completion("Empty choices array".to_string()));
        }

        Ok(parsed)
    }
}

fn resolve_api_key(config: &LlmConfig) -> Option<String> {
    config.auth.api_key.clone().or_else(|| {
        config
            .auth
            .api_key_env
            .as_ref()
            .and_then(|env_var| std::env::var(env_var).ok())
    })
}

/// Create a client for `base_url` from configuration
pub fn create_client(
    config: &LlmConfig,
    base_url: &str,
) -> Result<Arc<dyn CompletionClient>, ElevateError> {
    let api_key = resolve_api_key(config).ok_or_else(|| {
        ElevateError::Config(format!(
            "No API key found for {}. Set llm.auth.api_key or llm.auth.api_key_env",
            base_url
        ))
    })?;

    let mut client = OpenAIClient::new(api_key, config.model.clone())
        .with_api_base(base_url.to_string())
        .with_temperature(config.parameters.temperature)
        .with_timeout(Duration::from_secs(config.request_timeout_seconds));

    if let Some(max_tokens) = config.parameters.max_tokens {
        client = client.with_max_tokens(max_tokens);
    }

    Ok(Arc::new(client))
}

/// Client for the OpenAI `/audio/speech` endpoint, asking for raw PCM.
#[derive(Debug, Clone)]
pub struct OpenAISpeechClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    timeout: Option<Duration>,
}

impl OpenAISpeechClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: OPENAI_API_BASE.to_string(),
            model,
            timeout: None,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build_request_body(&self, request: &SpeechRequest<'_>) -> Value {
        let mut body = json!({
            "model": self.model,
            "voice": request.voice,
            "input": request.input,
            "response_format": "pcm",
        });
        if !request.instructions.trim().is_empty() {
            body["instructions"] = request.instructions.into();
        }
        body
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAISpeechClient {
    async fn synthesize(&self, request: &SpeechRequest<'_>) -> Result<Vec<i16>, ElevateError> {
        let url = format!("{}/audio/speech", self.api_base);
        log::debug!("Speech request to {} with voice {}", url, request.voice);

        let mut http_request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.build_request_body(request));
        if let Some(timeout) = self.timeout {
            http_request = http_request.timeout(timeout);
        }

        let response = http_request.send().await.map_err(|e| {
            log::error!("HTTP request to {} failed: {}", url, e);
            ElevateError::Speech(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let text = response.text().await.unwrap_or_default();
            log::error!("Rate limited by {}: {}", url, text);
            return Err(ElevateError::RateLimited(text));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            log::error!("Speech request failed with status {}: {}", status, text);
            return Err(ElevateError::Speech(format!(
                "API request failed with status {}: {}",
                status, text
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| ElevateError::Speech(format!("Failed to read audio: {}", e)))?;
        Ok(pcm_samples(&audio))
    }
}

/// Little-endian 16-bit PCM bytes to samples; a trailing odd byte is dropped.
fn pcm_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Create a speech client for `base_url` from configuration
pub fn create_speech_client(
    config: &LlmConfig,
    base_url: &str,
    model: &str,
) -> Result<Arc<dyn SpeechSynthesizer>, ElevateError> {
    let api_key = resolve_api_key(config).ok_or_else(|| {
        ElevateError::Config(format!(
            "No API key found for {}. Set llm.auth.api_key or llm.auth.api_key_env",
            base_url
        ))
    })?;

    let client = OpenAISpeechClient::new(api_key, model.to_string())
        .with_api_base(base_url.to_string())
        .with_timeout(Duration::from_secs(config.request_timeout_seconds));
    Ok(Arc::new(client))
}
