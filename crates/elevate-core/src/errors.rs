//! Error types for every failure mode of the utilities
//!
//! `ElevateError` is the single discriminated error callers see. Failures that
//! happen before anything runs in a sandbox (templates, completions, parsing the
//! model's response) are generation failures; a failed sandboxed run is carried
//! as `ExecutionFailed` with its own kind, so callers branch on variants instead
//! of inspecting messages.

use crate::executors::{ExecutionFailure, FailureKind};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ElevateError {
    #[error("Prompt template '{template}' not found")]
    TemplateNotFound { template: String },
    #[error("Prompt template '{template}' is missing parameter '{parameter}'")]
    TemplateRender { template: String, parameter: String },
    #[error("LLM completion failed: {0}")]
    Completion(String),
    #[error("LLM completion timed out: {0}")]
    CompletionTimeout(String),
    #[error("LLM provider rate limit hit: {0}")]
    RateLimited(String),
    #[error("Structured response does not match schema '{schema}': {message}")]
    InvalidStructuredResponse { schema: String, message: String },
    #[error("Model output is missing the <{delimiter}> section")]
    MalformedModelOutput { delimiter: String },
    #[error("{0}")]
    ExecutionFailed(ExecutionFailure),
    #[error("Execution output is not valid JSON ({reason}): {output}")]
    MalformedJsonOutput { output: String, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Cancelled: {0}")]
    Cancelled(String),
    #[error("Speech synthesis failed: {0}")]
    Speech(String),
}

impl ElevateError {
    /// True when the request failed before or while talking to the model.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            ElevateError::TemplateNotFound { .. }
                | ElevateError::TemplateRender { .. }
                | ElevateError::Completion(_)
                | ElevateError::CompletionTimeout(_)
                | ElevateError::RateLimited(_)
                | ElevateError::InvalidStructuredResponse { .. }
                | ElevateError::MalformedModelOutput { .. }
        )
    }

    /// True when code was generated but running it did not produce a usable result.
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            ElevateError::ExecutionFailed(_) | ElevateError::MalformedJsonOutput { .. }
        )
    }

    /// True when the caller's cancellation token stopped the request, whether
    /// before the model answered or while the code was running.
    pub fn is_cancelled(&self) -> bool {
        match self {
            ElevateError::Cancelled(_) => true,
            ElevateError::ExecutionFailed(failure) => failure.kind == FailureKind::Cancelled,
            _ => false,
        }
    }
}

impl From<std::io::Error> for ElevateError {
    fn from(err: std::io::Error) -> Self {
        ElevateError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for ElevateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ElevateError::CompletionTimeout(err.to_string())
        } else {
            ElevateError::Completion(err.to_string())
        }
    }
}

impl From<serde_yaml::Error> for ElevateError {
    fn from(err: serde_yaml::Error) -> Self {
        ElevateError::Config(format!("Failed to parse YAML config: {}", err))
    }
}

// Errors raised by a sandbox backend
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Bollard (Docker client) error: {0}")]
    BollardError(#[from] bollard::errors::Error),
    #[error("I/O error during sandbox operation: {0}")]
    IoError(#[from] std::io::Error),
    #[error("File '{0}' not found in sandbox")]
    FileNotFound(String),
    #[error("Invalid sandbox path: {0}")]
    InvalidPath(String),
    #[error("Sandbox backend error: {0}")]
    Backend(String),
}
