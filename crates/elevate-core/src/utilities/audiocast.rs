//! Article to spoken conversation.
//!
//! The model writes a script for the configured cast, a second prompt gives
//! each speaker voice direction, and every line is spoken through a
//! [`SpeechSynthesizer`] and joined with its pause into one mono WAV file.

use super::{require_text, OnlyJson, SinglePurpose};
use crate::config::{AudiocastConfig, ElevateConfig};
use crate::errors::ElevateError;
use crate::llm::{create_speech_client, SpeechRequest, SpeechSynthesizer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SCRIPT_TEMPLATE: &str = "audiocast";
const INSTRUCTIONS_TEMPLATE: &str = "audiocast_instructions";
const MAX_PAUSE_SECONDS: f32 = 2.0;
const TITLE_WORDS: usize = 10;
const TITLE_CHARS: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeakerConfig {
    pub name: String,
    pub background: String,
    pub expertise: String,
    pub speaking_style: String,
    pub level_of_expertise: String,
    pub focus_aspect: String,
    pub depth: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenerConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub expertise: String,
    pub summary_of_similar_content: Vec<String>,
    pub level_of_expertise: String,
    pub depth: String,
}

/// Who speaks, and who the conversation is pitched at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastConfiguration {
    pub speakers: Vec<SpeakerConfig>,
    pub listener: ListenerConfig,
}

impl Default for CastConfiguration {
    fn default() -> Self {
        Self {
            speakers: vec![SpeakerConfig {
                name: "Narrator".to_string(),
                background: "Technical background".to_string(),
                expertise: "medium".to_string(),
                speaking_style: "narrative".to_string(),
                level_of_expertise: "medium".to_string(),
                focus_aspect: "technical details".to_string(),
                depth: "medium".to_string(),
            }],
            listener: ListenerConfig {
                name: None,
                expertise: "medium".to_string(),
                summary_of_similar_content: vec!["Technical podcasts overview".to_string()],
                level_of_expertise: "medium".to_string(),
                depth: "medium".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationEntry {
    /// Seconds of silence before the line; 0 means the speaker cuts in.
    #[serde(default = "default_pause")]
    pub pause: f32,
    pub speaker: String,
    pub message: String,
}

fn default_pause() -> f32 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub entries: Vec<ConversationEntry>,
}

impl Conversation {
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "entries": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "pause": {"type": "number", "minimum": 0.0, "maximum": MAX_PAUSE_SECONDS},
                            "speaker": {"type": "string"},
                            "message": {"type": "string"}
                        },
                        "required": ["speaker", "message"]
                    }
                }
            },
            "required": ["entries"]
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Instructions {
    instructions: String,
}

impl Instructions {
    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {"instructions": {"type": "string"}},
            "required": ["instructions"]
        })
    }
}

/// File-name safe title taken from the start of the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct AudiocastTitle {
    pub generated_title: String,
}

impl AudiocastTitle {
    pub fn from_content(content: &str) -> Self {
        let title = content
            .split_whitespace()
            .take(TITLE_WORDS)
            .collect::<Vec<_>>()
            .join("_");
        let title: String = title
            .chars()
            .take(TITLE_CHARS)
            .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
            .collect();

        let generated_title = if title.is_empty() {
            "Audiocast".to_string()
        } else {
            title
        };
        Self { generated_title }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudiocastFile {
    pub file_name: String,
    pub path: PathBuf,
}

pub struct OnlyAudiocast {
    inner: SinglePurpose,
    json: OnlyJson,
    speech: Arc<dyn SpeechSynthesizer>,
    voices: Vec<String>,
    output_dir: PathBuf,
}

impl OnlyAudiocast {
    pub fn new(inner: SinglePurpose, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        let defaults = AudiocastConfig::default();
        Self {
            json: OnlyJson::new(inner.clone()),
            inner,
            speech,
            voices: defaults.voices,
            output_dir: defaults.output_dir,
        }
    }

    pub fn from_config(config: &ElevateConfig) -> Result<Self, ElevateError> {
        let inner = SinglePurpose::from_config(config)?;
        let speech = create_speech_client(&config.llm, &config.audiocast.speech_model)?;
        Ok(Self::new(inner, speech)
            .with_voices(config.audiocast.voices.clone())
            .with_output_dir(config.audiocast.output_dir.clone()))
    }

    pub fn with_voices(mut self, voices: Vec<String>) -> Self {
        self.voices = voices
            .into_iter()
            .filter(|voice| !voice.trim().is_empty())
            .collect();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Ask the model for a conversation about `content` between the cast's speakers.
    pub async fn write_script(
        &self,
        content: &str,
        cast: &CastConfiguration,
    ) -> Result<Conversation, ElevateError> {
        require_text("content", content)?;
        let cast_yaml = serde_yaml::to_string(cast).map_err(|e| {
            ElevateError::Validation(format!("cast configuration cannot be serialized: {}", e))
        })?;
        let system_prompt = self
            .inner
            .render(SCRIPT_TEMPLATE, &[("cast_configuration", cast_yaml.as_str())])?;

        let conversation: Conversation = self
            .json
            .parse(content, "conversation", &Conversation::schema(), Some(&system_prompt))
            .await?;
        if conversation.entries.is_empty() {
            return Err(ElevateError::InvalidStructuredResponse {
                schema: "conversation".to_string(),
                message: "conversation has no entries".to_string(),
            });
        }

        log::debug!("Script has {} entries", conversation.entries.len());
        Ok(conversation)
    }

    /// Voice direction for one speaker, starting with "You are ...".
    pub async fn speaker_instructions(&self, speaker: &SpeakerConfig) -> Result<String, ElevateError> {
        let prompt = self.inner.render(
            INSTRUCTIONS_TEMPLATE,
            &[
                ("speaker_name", speaker.name.as_str()),
                ("speaker_background", speaker.background.as_str()),
                ("speaker_expertise", speaker.expertise.as_str()),
            ],
        )?;
        let instructions: Instructions = self
            .json
            .parse(&prompt, "instructions", &Instructions::schema(), Some(&prompt))
            .await?;

        log::debug!("Voice direction for {}: {}", speaker.name, instructions.instructions);
        Ok(instructions.instructions)
    }

    /// Give each speaker the closest-named voice still unused.
    ///
    /// Names are compared lowercased; the earlier voice wins a tie. Once every
    /// voice is taken the pool starts over.
    pub fn assign_voices(&self, speakers: &[SpeakerConfig]) -> HashMap<String, String> {
        let mut pool: Vec<&str> = Vec::new();
        let mut assigned = HashMap::new();

        for speaker in speakers {
            if pool.is_empty() {
                pool = self.voices.iter().map(String::as_str).collect();
            }
            let name = speaker.name.to_lowercase();
            let mut best = 0;
            let mut best_score = f64::MIN;
            for (index, voice) in pool.iter().enumerate() {
                let score = strsim::normalized_levenshtein(&name, &voice.to_lowercase());
                if score > best_score {
                    best = index;
                    best_score = score;
                }
            }
            if let Some(voice) = (best < pool.len()).then(|| pool.remove(best)) {
                assigned.insert(speaker.name.clone(), voice.to_string());
            }
        }

        assigned
    }

    /// Turn `content` into a spoken conversation saved as WAV.
    ///
    /// The file lands in `output_dir` when given, else in the configured
    /// directory, as `{UTC timestamp}_{title}.wav`.
    pub async fn cast(
        &self,
        content: &str,
        cast: &CastConfiguration,
        output_dir: Option<&Path>,
    ) -> Result<AudiocastFile, ElevateError> {
        if cast.speakers.is_empty() {
            return Err(ElevateError::Validation("cast needs at least one speaker".to_string()));
        }
        let fallback_voice = self
            .voices
            .first()
            .cloned()
            .ok_or_else(|| ElevateError::Config("Audiocast needs at least one voice".to_string()))?;

        let conversation = self.write_script(content, cast).await?;
        let voices = self.assign_voices(&cast.speakers);
        let mut directions = HashMap::new();
        for speaker in &cast.speakers {
            directions.insert(speaker.name.clone(), self.speaker_instructions(speaker).await?);
        }

        let sample_rate = self.speech.sample_rate();
        let mut samples: Vec<i16> = Vec::new();
        for entry in &conversation.entries {
            samples.extend(silence(entry.pause, sample_rate));
            if entry.speaker.trim().is_empty() {
                continue;
            }

            let voice = voices.get(&entry.speaker).unwrap_or(&fallback_voice);
            let instructions = directions.get(&entry.speaker).map(String::as_str).unwrap_or("");
            let request = SpeechRequest {
                voice,
                input: &entry.message,
                instructions,
            };
            samples.extend(self.speech.synthesize(&request).await?);
            log::debug!("Audio segment added for {}", entry.speaker);
        }

        let title = AudiocastTitle::from_content(content);
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let file_name = format!("{}_{}.wav", timestamp, title.generated_title);
        let dir = output_dir.unwrap_or(&self.output_dir);
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&file_name);
        tokio::fs::write(&path, encode_wav(&samples, sample_rate)?).await?;

        log::info!("Audiocast saved to {}", path.display());
        Ok(AudiocastFile { file_name, path })
    }
}

fn silence(pause: f32, sample_rate: u32) -> Vec<i16> {
    let seconds = if pause.is_finite() {
        pause.clamp(0.0, MAX_PAUSE_SECONDS)
    } else {
        0.0
    };
    vec![0; (seconds * sample_rate as f32).round() as usize]
}

fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, ElevateError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wav_error = |e: hound::Error| ElevateError::Io(format!("WAV encoding failed: {}", e));

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(wav_error)?;
        for sample in samples {
            writer.write_sample(*sample).map_err(wav_error)?;
        }
        writer.finalize().map_err(wav_error)?;
    }
    Ok(cursor.into_inner())
}
