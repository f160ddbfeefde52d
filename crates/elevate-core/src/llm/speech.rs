//! Text-to-speech seam used by the audiocast utility.

use crate::errors::ElevateError;
use async_trait::async_trait;
use serde::Serialize;

/// Mono 16-bit PCM at 24 kHz, what OpenAI's `pcm` response format returns.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpeechRequest<'a> {
    pub voice: &'a str,
    pub input: &'a str,
    /// Voice direction (persona, tone, pacing); empty for none.
    pub instructions: &'a str,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `request.input`, returning mono samples at [`sample_rate`](Self::sample_rate).
    async fn synthesize(&self, request: &SpeechRequest<'_>) -> Result<Vec<i16>, ElevateError>;

    fn sample_rate(&self) -> u32 {
        SPEECH_SAMPLE_RATE
    }
}
