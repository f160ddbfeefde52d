use super::{require_text, SinglePurpose};
use crate::errors::ElevateError;

/// Translates a task description into a single shell command.
pub struct OnlyShell {
    inner: SinglePurpose,
}

impl OnlyShell {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    /// The command is returned as text; it is never executed here.
    pub async fn generate_shell_command(&self, prompt: &str) -> Result<String, ElevateError> {
        require_text("prompt", prompt)?;
        let message = format!("\n<UserPrompt>{}</UserPrompt>\n\n", prompt);
        let command = self.inner.run("shell", &[], &message, None).await?;
        Ok(command.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::recording_llm::RecordingLlm;
    use crate::utilities::testing::single_purpose;

    #[tokio::test]
    async fn test_generate_shell_command() {
        let llm = RecordingLlm::replying("  find . -name '*.log' -mtime +7 -delete\n");
        let command = OnlyShell::new(single_purpose(&llm))
            .generate_shell_command("delete log files older than a week")
            .await
            .unwrap();

        assert_eq!(command, "find . -name '*.log' -mtime +7 -delete");
        assert_eq!(
            llm.last_user_message(),
            "\n<UserPrompt>delete log files older than a week</UserPrompt>\n\n"
        );
    }
}
