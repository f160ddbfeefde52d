use super::{require_text, SinglePurpose};
use crate::errors::ElevateError;

/// Answers questions from the documentation included in the input.
pub struct OnlyQa {
    inner: SinglePurpose,
}

impl OnlyQa {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    pub async fn generate_answers(&self, text: &str) -> Result<String, ElevateError> {
        require_text("text", text)?;
        self.inner.run("qa", &[], text, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::recording_llm::RecordingLlm;
    use crate::utilities::testing::single_purpose;

    #[tokio::test]
    async fn test_generate_answers() {
        let llm = RecordingLlm::replying("The device charges in two hours.");
        let answer = OnlyQa::new(single_purpose(&llm))
            .generate_answers("Docs: charging takes 2h. Q: how long to charge?")
            .await
            .unwrap();
        assert_eq!(answer, "The device charges in two hours.");
        assert_eq!(llm.requests().len(), 1);
    }
}
