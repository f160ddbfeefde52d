use super::{require_text, SinglePurpose};
use crate::errors::ElevateError;
use serde::de::DeserializeOwned;
use serde_json::Value;

const TEMPLATE_ID: &str = "json_extraction";

/// Extracts typed data from free text with a schema-constrained completion.
pub struct OnlyJson {
    inner: SinglePurpose,
}

impl OnlyJson {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    /// Parse `content` into `T`, whose shape is described by `schema`.
    ///
    /// The response is validated against `schema` before deserializing, so a
    /// mismatch surfaces as `InvalidStructuredResponse` naming `schema_name`.
    pub async fn parse<T: DeserializeOwned>(
        &self,
        content: &str,
        schema_name: &str,
        schema: &Value,
        system_prompt: Option<&str>,
    ) -> Result<T, ElevateError> {
        require_text("content", content)?;
        let system_prompt = match system_prompt {
            Some(prompt) => prompt.to_string(),
            None => self.inner.render(TEMPLATE_ID, &[])?,
        };

        let value = self
            .inner
            .run_structured(&system_prompt, content, schema_name, schema)
            .await?;
        serde_json::from_value(value).map_err(|e| ElevateError::InvalidStructuredResponse {
            schema: schema_name.to_string(),
            message: e.to_string(),
        })
    }
}
