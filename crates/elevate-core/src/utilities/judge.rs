use super::{require_text, SinglePurpose};
use crate::errors::ElevateError;
use serde_json::Value;

/// Scores a text against criteria described by a JSON schema.
pub struct OnlyJudgeLlms {
    inner: SinglePurpose,
}

impl OnlyJudgeLlms {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    pub async fn evaluate(
        &self,
        text: &str,
        criteria_name: &str,
        criteria_schema: &Value,
        system_prompt: Option<&str>,
    ) -> Result<Value, ElevateError> {
        require_text("text", text)?;
        let system_prompt = match system_prompt {
            Some(prompt) => prompt.to_string(),
            None => self.inner.render("judge", &[])?,
        };
        self.inner
            .run_structured(&system_prompt, text, criteria_name, criteria_schema)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::ResponseFormat;
    use crate::test_utils::recording_llm::RecordingLlm;
    use crate::utilities::testing::single_purpose;
    use serde_json::json;

    fn criteria() -> Value {
        json!({
            "type": "object",
            "properties": {
                "clarity": {"type": "integer", "minimum": 1, "maximum": 10},
                "factual": {"type": "boolean"}
            },
            "required": ["clarity", "factual"]
        })
    }

    #[tokio::test]
    async fn test_evaluate() {
        let llm = RecordingLlm::replying(r#"{"clarity": 8, "factual": true}"#);
        let scores = OnlyJudgeLlms::new(single_purpose(&llm))
            .evaluate("The sky is blue.", "Criteria", &criteria(), None)
            .await
            .unwrap();

        assert_eq!(scores, json!({"clarity": 8, "factual": true}));
        let request = &llm.requests()[0];
        assert_eq!(
            request.response_format,
            Some(ResponseFormat::json_schema("Criteria", criteria()))
        );
        assert!(request.messages[0].content.contains("expert evaluator"));
    }

    #[tokio::test]
    async fn test_out_of_range_score() {
        let llm = RecordingLlm::replying(r#"{"clarity": 42, "factual": true}"#);
        let err = OnlyJudgeLlms::new(single_purpose(&llm))
            .evaluate("text", "Criteria", &criteria(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ElevateError::InvalidStructuredResponse { .. }));
    }
}
