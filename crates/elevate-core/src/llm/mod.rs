//! Completion client abstraction and provider integrations.
//!
//! Defines the `CompletionClient` trait every provider implements, plus the
//! provided text and JSON-schema helpers the utilities call. A structured
//! response is always re-validated locally, since not every provider enforces
//! the schema it was given.

pub use crate::core_types::{CompletionRequest, CompletionResponse, Message, ResponseFormat};
use crate::errors::ElevateError;
use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde_json::Value;

pub mod providers;
pub mod speech;

pub use providers::openai::{OpenAIClient, OpenAISpeechClient};
pub use providers::{create_completion_client, create_speech_client};
pub use speech::{SpeechRequest, SpeechSynthesizer, SPEECH_SAMPLE_RATE};

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ElevateError>;

    /// Plain-text completion of one system prompt and one user message.
    async fn complete_text(
        &self,
        system_prompt: &str,
        user_message: &str,
        temperature: Option<f32>,
    ) -> Result<String, ElevateError> {
        let mut request = CompletionRequest::new(system_prompt, user_message);
        request.temperature = temperature;

        let response = self.complete(request).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| ElevateError::Completion("Response has no message content".to_string()))
    }

    /// Completion constrained to `schema`, parsed and validated locally.
    async fn complete_structured(
        &self,
        system_prompt: &str,
        user_message: &str,
        schema_name: &str,
        schema: &Value,
    ) -> Result<Value, ElevateError> {
        let request = CompletionRequest::new(system_prompt, user_message)
            .with_response_format(ResponseFormat::json_schema(schema_name, schema.clone()));

        let response = self.complete(request).await?;
        let content = response.first_content().ok_or_else(|| {
            ElevateError::InvalidStructuredResponse {
                schema: schema_name.to_string(),
                message: "response has no message content".to_string(),
            }
        })?;

        let value: Value = serde_json::from_str(content.trim()).map_err(|e| {
            ElevateError::InvalidStructuredResponse {
                schema: schema_name.to_string(),
                message: format!("response is not JSON: {}", e),
            }
        })?;

        validate_against_schema(schema_name, schema, &value)?;
        Ok(value)
    }
}

/// Validate `value` against a JSON schema, joining every violation.
pub fn validate_against_schema(
    schema_name: &str,
    schema: &Value,
    value: &Value,
) -> Result<(), ElevateError> {
    let compiled = JSONSchema::compile(schema).map_err(|e| {
        ElevateError::Validation(format!("Invalid JSON schema '{}': {}", schema_name, e))
    })?;

    let violations: Vec<String> = match compiled.validate(value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|error| format!("{} at '{}'", error, error.instance_path))
            .collect(),
    };

    if violations.is_empty() {
        Ok(())
    } else {
        log::error!(
            "Structured response failed '{}' validation: {}",
            schema_name,
            violations.join("; ")
        );
        Err(ElevateError::InvalidStructuredResponse {
            schema: schema_name.to_string(),
            message: violations.join("; "),
        })
    }
}
