// src/test_utils/recording_llm.rs
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::core_types::{CompletionRequest, CompletionResponse};
use crate::errors::ElevateError;
use crate::llm::CompletionClient;

/// `CompletionClient` that answers with canned text and keeps the requests
/// for inspection.
pub struct RecordingLlm {
    replies: Vec<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl RecordingLlm {
    pub fn replying(reply: &str) -> Arc<Self> {
        Self::replying_in_turn(&[reply])
    }

    /// Answer the n-th request with `replies[n]`, repeating the last one.
    pub fn replying_in_turn(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.iter().map(|reply| reply.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_system_prompt(&self) -> String {
        self.requests().last().unwrap().messages[0].content.clone()
    }

    pub fn last_user_message(&self) -> String {
        self.requests().last().unwrap().messages[1].content.clone()
    }
}

#[async_trait]
impl CompletionClient for RecordingLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ElevateError> {
        let mut requests = self.requests.lock().unwrap();
        let turn = requests.len().min(self.replies.len().saturating_sub(1));
        requests.push(request);
        let reply = self.replies.get(turn).cloned().unwrap_or_default();
        Ok(CompletionResponse::from_text(reply))
    }
}
