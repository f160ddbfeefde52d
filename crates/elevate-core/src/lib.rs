//! Single-purpose LLM utilities with sandboxed Python execution.
//!
//! The centerpiece is [`OnlyPython`]: it asks a language model for Python
//! that solves a task, runs that code in an isolated sandbox and hands back
//! what the program printed (parsed JSON, plain text, or a saved chart).
//! Around it sit small text utilities that each pair one prompt template
//! with one completion call.
//!
//! # Architecture Overview
//!
//! - **Prompt templates**: built-in `{{param}}` templates, overridable from a directory
//! - **Completion clients**: provider-agnostic trait over OpenAI-compatible endpoints
//! - **Code extraction**: fenced block unwrapping of model output
//! - **Sandbox execution**: Docker-backed sandboxes with guaranteed teardown
//! - **Configuration**: YAML configuration with environment-based secrets

pub mod config;
pub mod core_types;
pub mod errors;
pub mod executors;
pub mod extract;
pub mod generation;
pub mod llm;
pub mod logging;
pub mod prompts;
pub mod utilities;

pub use config::*;
pub use errors::{ElevateError, SandboxError};
pub use executors::{
    DockerSandboxClient, ExecutionFailure, ExecutionOutcome, ExecutionRequest, ExecutionResult,
    FailureKind, SandboxClient, SandboxExecutor,
};
pub use generation::{GenerationOutput, GenerationRequest, OnlyPython, OutputShape};
pub use llm::{create_completion_client, create_speech_client, CompletionClient, SpeechSynthesizer};
pub use prompts::PromptRenderer;
pub use utilities::{OnlyAudiocast, SinglePurpose};

#[cfg(test)]
pub mod test_utils;
