use super::{require_text, SinglePurpose, MARKDOWN_FENCE};
use crate::errors::ElevateError;

pub struct OnlyEli5 {
    inner: SinglePurpose,
}

impl OnlyEli5 {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    pub async fn explain(&self, text: &str) -> Result<String, ElevateError> {
        require_text("text", text)?;
        self.inner.run("eli5", &[], text, Some(MARKDOWN_FENCE)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::recording_llm::RecordingLlm;
    use crate::utilities::testing::single_purpose;

    #[tokio::test]
    async fn test_explain_passes_unfenced_reply_through() {
        let llm = RecordingLlm::replying("Gravity is the Earth giving everything a hug.");
        let explanation = OnlyEli5::new(single_purpose(&llm))
            .explain("General relativity")
            .await
            .unwrap();
        assert_eq!(explanation, "Gravity is the Earth giving everything a hug.");
        assert!(llm.last_system_prompt().contains("five year old"));
    }
}
