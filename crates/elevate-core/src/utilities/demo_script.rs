use super::{require_text, SinglePurpose, MARKDOWN_FENCE};
use crate::errors::ElevateError;

pub struct OnlyDemoScript {
    inner: SinglePurpose,
}

impl OnlyDemoScript {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    pub async fn generate_demo_script(
        &self,
        text: &str,
        presentation_type: &str,
        minutes: u32,
    ) -> Result<String, ElevateError> {
        require_text("text", text)?;
        let minutes = minutes.to_string();
        self.inner
            .run(
                "demo_script",
                &[("presentation_type", presentation_type), ("demo_minutes", minutes.as_str())],
                text,
                Some(MARKDOWN_FENCE),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::recording_llm::RecordingLlm;
    use crate::utilities::testing::single_purpose;

    #[tokio::test]
    async fn test_generate_demo_script() {
        let llm = RecordingLlm::replying("```markdown\nPresenter: Welcome!\n```");
        let script = OnlyDemoScript::new(single_purpose(&llm))
            .generate_demo_script("Docs for the dashboard", "Sales Demo", 5)
            .await
            .unwrap();

        assert_eq!(script, "Presenter: Welcome!");
        let system_prompt = llm.last_system_prompt();
        assert!(system_prompt.contains("Presentation type: Sales Demo"));
        assert!(system_prompt.contains("Demo length: 5 minutes"));
    }
}
