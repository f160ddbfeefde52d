use super::{require_text, SinglePurpose, MARKDOWN_FENCE};
use crate::errors::ElevateError;

const TEMPLATE_ID: &str = "markdown_conversion";

/// Converts plain text into GitHub Flavored Markdown.
pub struct OnlyMarkdown {
    inner: SinglePurpose,
}

impl OnlyMarkdown {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    pub async fn convert_to_markdown(&self, text: &str) -> Result<String, ElevateError> {
        require_text("text", text)?;
        self.inner
            .run(TEMPLATE_ID, &[], text, Some(MARKDOWN_FENCE))
            .await
    }

    /// Same conversion prompt as `convert_to_markdown`; kept as its own entry
    /// point for callers that summarize first.
    pub async fn summarize_and_convert_to_markdown(&self, text: &str) -> Result<String, ElevateError> {
        self.convert_to_markdown(text).await
    }
}
