//! Single-purpose text utilities.
//!
//! Each utility is one prompt template plus one completion call: render the
//! system prompt, send the user's text, and optionally unwrap a fenced
//! markdown block from the reply. `SinglePurpose` carries the shared client,
//! templates and temperature so the utilities stay thin.

use crate::config::ElevateConfig;
use crate::errors::ElevateError;
use crate::extract::extract_or_raw;
use crate::llm::{create_completion_client, CompletionClient};
use crate::prompts::PromptRenderer;
use serde_json::Value;
use std::sync::Arc;

pub mod audiocast;
pub mod demo_script;
pub mod eli5;
pub mod email;
pub mod json;
pub mod judge;
pub mod markdown;
pub mod qa;
pub mod rephrase;
pub mod shell;
pub mod slides;
pub mod summary;
pub mod video_to_blog;

pub use audiocast::{
    AudiocastFile, AudiocastTitle, CastConfiguration, Conversation, ConversationEntry, ListenerConfig,
    OnlyAudiocast, SpeakerConfig,
};
pub use demo_script::OnlyDemoScript;
pub use eli5::OnlyEli5;
pub use email::{EmailKind, OnlyEmail};
pub use json::OnlyJson;
pub use judge::OnlyJudgeLlms;
pub use markdown::OnlyMarkdown;
pub use qa::OnlyQa;
pub use rephrase::OnlyRephrase;
pub use shell::OnlyShell;
pub use slides::OnlySlides;
pub use summary::OnlySummary;
pub use video_to_blog::OnlyVideoToBlog;

/// Language tag of the fenced block unwrapped from markdown replies.
pub const MARKDOWN_FENCE: &str = "markdown";

#[derive(Clone)]
pub struct SinglePurpose {
    llm: Arc<dyn CompletionClient>,
    prompts: Arc<PromptRenderer>,
    temperature: Option<f32>,
}

impl SinglePurpose {
    pub fn new(llm: Arc<dyn CompletionClient>, prompts: Arc<PromptRenderer>) -> Self {
        Self {
            llm,
            prompts,
            temperature: None,
        }
    }

    pub fn from_config(config: &ElevateConfig) -> Result<Self, ElevateError> {
        let llm = create_completion_client(&config.llm)?;
        let prompts = PromptRenderer::from_config(&config.prompts)?;
        Ok(Self::new(llm, Arc::new(prompts)).with_temperature(config.llm.parameters.temperature))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn render(&self, template: &str, params: &[(&str, &str)]) -> Result<String, ElevateError> {
        self.prompts.render(template, params)
    }

    /// Render `template`, send `user_message` and unwrap `fence` if present.
    pub async fn run(
        &self,
        template: &str,
        params: &[(&str, &str)],
        user_message: &str,
        fence: Option<&str>,
    ) -> Result<String, ElevateError> {
        let system_prompt = self.render(template, params)?;
        log::debug!("Running '{}' utility", template);

        let reply = self
            .llm
            .complete_text(&system_prompt, user_message, self.temperature)
            .await?;

        Ok(match fence {
            Some(tag) => extract_or_raw(&reply, tag).to_string(),
            None => reply,
        })
    }

    pub async fn run_structured(
        &self,
        system_prompt: &str,
        user_message: &str,
        schema_name: &str,
        schema: &Value,
    ) -> Result<Value, ElevateError> {
        log::debug!("Requesting structured '{}' response", schema_name);
        self.llm
            .complete_structured(system_prompt, user_message, schema_name, schema)
            .await
    }
}

/// Reject blank input before anything is sent to the model.
pub(crate) fn require_text(field: &str, text: &str) -> Result<(), ElevateError> {
    if text.trim().is_empty() {
        return Err(ElevateError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
