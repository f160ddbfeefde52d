//! Configuration loader for YAML files and environment resolution

use crate::config::types::*;
use crate::errors::ElevateError;
use std::env;
use std::path::Path;
use tokio::fs;

/// Configuration loader with environment resolution
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<ElevateConfig, ElevateError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            ElevateError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        log::info!("Loaded configuration from {}", path.display());
        let mut config = Self::from_str(&content)?;

        // Relative prompt directories are resolved against the config file
        if let (Some(dir), Some(base_dir)) = (&config.prompts.directory, path.parent()) {
            if dir.is_relative() {
                config.prompts.directory = Some(base_dir.join(dir));
            }
        }

        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<ElevateConfig, ElevateError> {
        let mut config: ElevateConfig = if content.trim().is_empty() {
            ElevateConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };

        Self::resolve_llm_auth(&mut config.llm.auth);
        config.validate()?;

        Ok(config)
    }

    /// Fill `api_key` from `api_key_env` when no literal key is configured.
    fn resolve_llm_auth(auth: &mut LlmAuth) {
        if auth.api_key.is_some() {
            return;
        }

        if let Some(env_var) = &auth.api_key_env {
            match env::var(env_var) {
                Ok(value) if !value.is_empty() => auth.api_key = Some(value),
                _ => log::debug!("API key environment variable '{}' is not set", env_var),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ConfigLoader::from_str("").unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.provider, LlmProvider::OpenAI);
        assert_eq!(config.llm.parameters.temperature, 0.1);
        assert_eq!(config.sandbox.image, "python:3.11-slim");
        assert_eq!(config.sandbox.artifact_path, "chart.png");
        assert_eq!(config.sandbox.artifact_output, PathBuf::from("chart.png"));
        assert_eq!(config.generation.response_contract, ResponseContract::Delimited);
        assert!(config.sandbox.env_passthrough.is_empty());
        assert_eq!(config.audiocast.speech_model, "gpt-4o-mini-tts");
        assert_eq!(config.audiocast.voices.len(), 5);
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
llm:
  provider:
    custom:
      base_url: http://localhost:8080/v1
  model: llama-3.3-70b
  parameters:
    temperature: 0.3
    max_tokens: 2048
  auth:
    api_key: literal-key
sandbox:
  image: python:3.12-slim
  timeout_seconds: 60
  env_passthrough: [OPENAI_API_KEY, ALPHA_VANTAGE_KEY]
  env:
    MPLBACKEND: Agg
  artifact_output: out/chart.png
generation:
  response_contract: structured
audiocast:
  voices: [nova, onyx]
  output_dir: podcasts
logging:
  level: debug
"#;
        let config = ConfigLoader::from_str(yaml).unwrap();
        assert_eq!(
            config.llm.provider,
            LlmProvider::Custom {
                base_url: "http://localhost:8080/v1".to_string()
            }
        );
        assert_eq!(config.llm.parameters.max_tokens, Some(2048));
        assert_eq!(config.llm.auth.api_key.as_deref(), Some("literal-key"));
        assert_eq!(config.sandbox.timeout_seconds, 60);
        assert_eq!(config.sandbox.env_passthrough.len(), 2);
        assert_eq!(config.sandbox.env.get("MPLBACKEND").map(String::as_str), Some("Agg"));
        assert_eq!(config.generation.response_contract, ResponseContract::Structured);
        assert_eq!(config.audiocast.voices, vec!["nova".to_string(), "onyx".to_string()]);
        assert_eq!(config.audiocast.output_dir, PathBuf::from("podcasts"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    #[serial]
    fn test_api_key_resolved_from_environment() {
        env::set_var("ELEVATE_TEST_API_KEY", "from-env");
        let config = ConfigLoader::from_str("llm:\n  auth:\n    api_key_env: ELEVATE_TEST_API_KEY\n").unwrap();
        env::remove_var("ELEVATE_TEST_API_KEY");
        assert_eq!(config.llm.auth.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let err = ConfigLoader::from_str("llm:\n  model: \"\"\n").unwrap_err();
        assert!(matches!(err, ElevateError::Config(msg) if msg.contains("model")));

        let err = ConfigLoader::from_str("llm:\n  parameters:\n    temperature: 3.5\n").unwrap_err();
        assert!(matches!(err, ElevateError::Config(msg) if msg.contains("temperature")));

        let err = ConfigLoader::from_str("sandbox:\n  timeout_seconds: 0\n").unwrap_err();
        assert!(matches!(err, ElevateError::Config(_)));

        let err = ConfigLoader::from_str("sandbox:\n  work_dir: relative/dir\n").unwrap_err();
        assert!(matches!(err, ElevateError::Config(msg) if msg.contains("absolute")));

        let err = ConfigLoader::from_str("llm:\n  provider:\n    custom:\n      base_url: \"\"\n").unwrap_err();
        assert!(matches!(err, ElevateError::Config(msg) if msg.contains("base_url")));

        let err = ConfigLoader::from_str("audiocast:\n  voices: []\n").unwrap_err();
        assert!(matches!(err, ElevateError::Config(msg) if msg.contains("voice")));
    }

    #[test]
    fn test_provider_forms() {
        let config = ConfigLoader::from_str("llm:\n  provider: gemini\n").unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Gemini);

        let config = ConfigLoader::from_str("llm:\n  provider: OpenAI\n").unwrap();
        assert_eq!(config.llm.provider, LlmProvider::OpenAI);

        let config =
            ConfigLoader::from_str("llm:\n  provider:\n    custom:\n      base_url: http://vllm:8000/v1\n").unwrap();
        assert_eq!(
            config.llm.provider,
            LlmProvider::Custom {
                base_url: "http://vllm:8000/v1".to_string()
            }
        );

        let err = ConfigLoader::from_str("llm:\n  provider: anthropic\n").unwrap_err();
        assert!(matches!(err, ElevateError::Config(msg) if msg.contains("anthropic")));
    }

    #[test]
    fn test_provider_serializes_back_to_yaml_form() {
        let provider = LlmProvider::Custom {
            base_url: "http://localhost:8080/v1".to_string(),
        };
        let yaml = serde_yaml::to_string(&provider).unwrap();
        assert!(yaml.contains("custom:"));
        let parsed: LlmProvider = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, provider);

        assert_eq!(serde_yaml::to_string(&LlmProvider::Gemini).unwrap().trim(), "gemini");
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ConfigLoader::from_str("llm: [unterminated").unwrap_err();
        assert!(matches!(err, ElevateError::Config(msg) if msg.contains("YAML")));
    }

    #[tokio::test]
    async fn test_from_file_resolves_prompt_directory() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "prompts:\n  directory: my_prompts").unwrap();

        let config = ConfigLoader::from_file(file.path()).await.unwrap();
        let expected = file.path().parent().unwrap().join("my_prompts");
        assert_eq!(config.prompts.directory, Some(expected));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = ConfigLoader::from_file("/nonexistent/elevate.yaml").await.unwrap_err();
        assert!(matches!(err, ElevateError::Config(msg) if msg.contains("Failed to read config file")));
    }
}
