use super::{require_text, SinglePurpose, MARKDOWN_FENCE};
use crate::errors::ElevateError;

pub struct OnlySummary {
    inner: SinglePurpose,
}

impl OnlySummary {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    /// TL;DR of `text`, formatted as Markdown.
    pub async fn summarize(&self, text: &str) -> Result<String, ElevateError> {
        require_text("text", text)?;
        self.inner.run("summary", &[], text, Some(MARKDOWN_FENCE)).await
    }

    /// Alias of [`summarize`](Self::summarize): the summary prompt already
    /// answers in Markdown.
    pub async fn summarize_and_convert_to_markdown(&self, text: &str) -> Result<String, ElevateError> {
        self.summarize(text).await
    }
}
