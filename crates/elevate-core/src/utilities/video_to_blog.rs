use super::{require_text, SinglePurpose};
use crate::errors::ElevateError;

pub struct OnlyVideoToBlog {
    inner: SinglePurpose,
}

impl OnlyVideoToBlog {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    /// Story-driven blog post from a video transcript.
    pub async fn generate_blog(&self, transcript: &str) -> Result<String, ElevateError> {
        require_text("transcript", transcript)?;
        self.inner.run("video_to_blog", &[], transcript, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::recording_llm::RecordingLlm;
    use crate::utilities::testing::single_purpose;

    #[tokio::test]
    async fn test_generate_blog() {
        let llm = RecordingLlm::replying("# When Maya met the cache\n...");
        let post = OnlyVideoToBlog::new(single_purpose(&llm))
            .generate_blog("[00:00] Today we talk about caching")
            .await
            .unwrap();
        assert!(post.starts_with("# When Maya met the cache"));
        assert_eq!(llm.last_user_message(), "[00:00] Today we talk about caching");
    }
}
