use super::{require_text, SinglePurpose, MARKDOWN_FENCE};
use crate::errors::ElevateError;

pub struct OnlySlides {
    inner: SinglePurpose,
}

impl OnlySlides {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    /// Markdown slide deck of `slide_count` slides for a `slide_type`
    /// audience (e.g. investor, technical).
    pub async fn generate_slides(
        &self,
        text: &str,
        slide_type: &str,
        slide_count: u32,
    ) -> Result<String, ElevateError> {
        require_text("text", text)?;
        if slide_count == 0 {
            return Err(ElevateError::Validation(
                "slide count must be at least 1".to_string(),
            ));
        }

        let count = slide_count.to_string();
        self.inner
            .run(
                "slides",
                &[("slide_type", slide_type), ("slide_count", count.as_str())],
                text,
                Some(MARKDOWN_FENCE),
            )
            .await
    }
}
