//! LLM provider implementations
//!
//! Every supported provider exposes an OpenAI-compatible chat-completions
//! endpoint, so they share one client and differ only in the base URL.

use crate::config::{LlmConfig, LlmProvider};
use crate::errors::ElevateError;
use crate::llm::{CompletionClient, SpeechSynthesizer};
use std::sync::Arc;

pub mod openai;

/// Create a completion client based on the provider configuration
pub fn create_completion_client(config: &LlmConfig) -> Result<Arc<dyn CompletionClient>, ElevateError> {
    log::info!("Creating {:?} completion client for model {}", config.provider, config.model);
    openai::create_client(config, api_base(&config.provider))
}

/// Create a text-to-speech client on the same provider endpoint
pub fn create_speech_client(config: &LlmConfig, model: &str) -> Result<Arc<dyn SpeechSynthesizer>, ElevateError> {
    log::info!("Creating {:?} speech client for model {}", config.provider, model);
    openai::create_speech_client(config, api_base(&config.provider), model)
}

/// Base URL of the provider's chat-completions API
pub fn api_base(provider: &LlmProvider) -> &str {
    match provider {
        LlmProvider::OpenAI => openai::OPENAI_API_BASE,
        LlmProvider::Gemini => openai::GEMINI_OPENAI_API_BASE,
        LlmProvider::Custom { base_url } => base_url,
    }
}
