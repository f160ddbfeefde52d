//! Configuration type definitions
//!
//! Every section has defaults, so an empty YAML document is a valid
//! configuration: OpenAI `gpt-4o-mini`, a `python:3.11-slim` Docker sandbox and
//! `chart.png` as the artifact. Override only what differs.

use crate::errors::ElevateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ElevateConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub audiocast: AudiocastConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub parameters: ModelParameters,
    #[serde(default)]
    pub auth: LlmAuth,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
            parameters: ModelParameters::default(),
            auth: LlmAuth::default(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// LLM provider types
///
/// In YAML a named provider is a plain string (`provider: gemini`) and a
/// custom endpoint is a map (`provider: {custom: {base_url: ...}}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(try_from = "ProviderRepr", into = "ProviderRepr")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Gemini,
    Custom {
        base_url: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CustomProvider {
    base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ProviderRepr {
    Named(String),
    Custom { custom: CustomProvider },
}

impl TryFrom<ProviderRepr> for LlmProvider {
    type Error = String;

    fn try_from(repr: ProviderRepr) -> Result<Self, Self::Error> {
        match repr {
            ProviderRepr::Named(name) => match name.to_lowercase().as_str() {
                "openai" => Ok(LlmProvider::OpenAI),
                "gemini" => Ok(LlmProvider::Gemini),
                "custom" => Err("custom provider requires a 'base_url'".to_string()),
                other => Err(format!("unknown LLM provider '{}'", other)),
            },
            ProviderRepr::Custom { custom } => Ok(LlmProvider::Custom {
                base_url: custom.base_url,
            }),
        }
    }
}

impl From<LlmProvider> for ProviderRepr {
    fn from(provider: LlmProvider) -> Self {
        match provider {
            LlmProvider::OpenAI => ProviderRepr::Named("openai".to_string()),
            LlmProvider::Gemini => ProviderRepr::Named("gemini".to_string()),
            LlmProvider::Custom { base_url } => ProviderRepr::Custom {
                custom: CustomProvider { base_url },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParameters {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuth {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
}

impl Default for LlmAuth {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default = "default_work_dir")]
    pub work_dir: String,
    #[serde(default = "default_sandbox_timeout")]
    pub timeout_seconds: u64,
    /// Names of process environment variables forwarded into the sandbox.
    #[serde(default)]
    pub env_passthrough: Vec<String>,
    /// Literal variables set inside the sandbox.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Artifact path inside the sandbox, relative to `work_dir` unless absolute.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
    /// Local destination of a retrieved artifact.
    #[serde(default = "default_artifact_output")]
    pub artifact_output: PathBuf,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            work_dir: default_work_dir(),
            timeout_seconds: default_sandbox_timeout(),
            env_passthrough: Vec::new(),
            env: HashMap::new(),
            artifact_path: default_artifact_path(),
            artifact_output: default_artifact_output(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptConfig {
    /// Directory of `*.md` templates that replace or extend the built-in ones.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub template_vars: HashMap<String, String>,
}

/// How the code generator asks the model for its three sections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseContract {
    /// `<PipInstalls>`, `<Imports>` and `<CodeCompletion>` tags in free text.
    #[default]
    Delimited,
    /// JSON-schema constrained response with one field per section.
    Structured,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    #[serde(default)]
    pub response_contract: ResponseContract,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudiocastConfig {
    /// Text-to-speech model served at `{provider base}/audio/speech`.
    #[serde(default = "default_speech_model")]
    pub speech_model: String,
    /// Voices handed out to speakers, closest name match first.
    #[serde(default = "default_voices")]
    pub voices: Vec<String>,
    #[serde(default = "default_audiocast_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for AudiocastConfig {
    fn default() -> Self {
        Self {
            speech_model: default_speech_model(),
            voices: default_voices(),
            output_dir: default_audiocast_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

fn default_image() -> String {
    "python:3.11-slim".to_string()
}

fn default_work_dir() -> String {
    "/home/user".to_string()
}

fn default_artifact_path() -> String {
    "chart.png".to_string()
}

fn default_artifact_output() -> PathBuf {
    PathBuf::from("chart.png")
}

fn default_speech_model() -> String {
    "gpt-4o-mini-tts".to_string()
}

fn default_voices() -> Vec<String> {
    ["alloy", "fable", "onyx", "nova", "shimmer"]
        .iter()
        .map(|voice| voice.to_string())
        .collect()
}

fn default_audiocast_output_dir() -> PathBuf {
    PathBuf::from("generated_podcast").join("podcast_out")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_temperature() -> f32 { 0.1 }
fn default_request_timeout() -> u64 { 120 }
fn default_sandbox_timeout() -> u64 { 300 }

impl ElevateConfig {
    pub fn validate(&self) -> Result<(), ElevateError> {
        if self.llm.model.trim().is_empty() {
            return Err(ElevateError::Config("LLM model cannot be empty".to_string()));
        }

        let temperature = self.llm.parameters.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ElevateError::Config(format!(
                "LLM temperature must be between 0 and 2, got {}",
                temperature
            )));
        }

        if self.llm.request_timeout_seconds == 0 {
            return Err(ElevateError::Config(
                "LLM request_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if let LlmProvider::Custom { base_url } = &self.llm.provider {
            if base_url.trim().is_empty() {
                return Err(ElevateError::Config(
                    "Custom provider requires a valid 'base_url'".to_string(),
                ));
            }
        }

        if self.sandbox.image.trim().is_empty() {
            return Err(ElevateError::Config("Sandbox image cannot be empty".to_string()));
        }

        if self.sandbox.timeout_seconds == 0 {
            return Err(ElevateError::Config(
                "Sandbox timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if !self.sandbox.work_dir.starts_with('/') {
            return Err(ElevateError::Config(format!(
                "Sandbox work_dir must be an absolute path, got '{}'",
                self.sandbox.work_dir
            )));
        }

        if self.sandbox.artifact_path.trim().is_empty() {
            return Err(ElevateError::Config(
                "Sandbox artifact_path cannot be empty".to_string(),
            ));
        }

        if self.audiocast.speech_model.trim().is_empty() {
            return Err(ElevateError::Config(
                "Audiocast speech_model cannot be empty".to_string(),
            ));
        }

        if self.audiocast.voices.iter().all(|voice| voice.trim().is_empty()) {
            return Err(ElevateError::Config(
                "Audiocast needs at least one voice".to_string(),
            ));
        }

        Ok(())
    }
}
