use super::{require_text, SinglePurpose};
use crate::errors::ElevateError;

pub struct OnlyRephrase {
    inner: SinglePurpose,
}

fn rephrase_message(message: &str, tone: &str, length: &str) -> String {
    format!(
        "\n<Message>{}</Message>\n\n<Tone> {} </Tone>\n\n<Length> {} </Length>",
        message, tone, length
    )
}

impl OnlyRephrase {
    pub fn new(inner: SinglePurpose) -> Self {
        Self { inner }
    }

    /// Rewrite `message` in the given tone (e.g. formal) and length
    /// (short, medium or long relative to the original).
    pub async fn rephrase_text(
        &self,
        message: &str,
        tone: &str,
        length: &str,
    ) -> Result<String, ElevateError> {
        require_text("message", message)?;
        self.inner
            .run("rephrase", &[], &rephrase_message(message, tone, length), None)
            .await
    }
}
