//! Sandboxed execution of generated Python code.
//!
//! A `SandboxClient` is the seam to a remote or containerized sandbox
//! service. `SandboxExecutor` drives one run end to end: provision a sandbox,
//! install dependencies, upload and run the code, collect output and the
//! optional chart artifact, then tear everything down. Every run reports a
//! tagged `ExecutionOutcome` instead of an error value.

use crate::errors::SandboxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

pub mod docker;
pub mod executor;

pub use docker::DockerSandboxClient;
pub use executor::{normalize_dependency_spec, SandboxExecutor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
    /// Pip packages or a full install command; blank means nothing to install.
    pub dependency_spec: String,
    pub wants_artifact: bool,
    /// Local destination for this run's artifact; `sandbox.artifact_output`
    /// when unset. Concurrent chart runs should each set their own.
    #[serde(default)]
    pub artifact_output: Option<PathBuf>,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            dependency_spec: String::new(),
            wants_artifact: false,
            artifact_output: None,
        }
    }

    pub fn with_dependencies(mut self, dependency_spec: impl Into<String>) -> Self {
        self.dependency_spec = dependency_spec.into();
        self
    }

    pub fn with_artifact(mut self, wants_artifact: bool) -> Self {
        self.wants_artifact = wants_artifact;
        self
    }

    pub fn with_artifact_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_output = Some(path.into());
        self
    }
}

/// A file copied out of the sandbox onto the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedArtifact {
    pub path: PathBuf,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i64>,
    pub artifact: Option<SavedArtifact>,
}

impl ExecutionResult {
    /// What the run produced for the caller: the saved chart or trimmed stdout.
    pub fn output_text(&self) -> String {
        match &self.artifact {
            Some(artifact) => {
                let name = artifact
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| artifact.path.display().to_string());
                format!("Chart saved as {}", name)
            }
            None => self.stdout.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    DependencyInstall,
    Execution,
    Timeout,
    Cancelled,
    Sandbox,
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::DependencyInstall => "Dependency installation failed",
            FailureKind::Execution => "Code execution failed",
            FailureKind::Timeout => "Execution timed out",
            FailureKind::Cancelled => "Execution cancelled",
            FailureKind::Sandbox => "Sandbox error",
            FailureKind::Unexpected => "Unexpected execution error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    pub kind: FailureKind,
    pub message: String,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    pub(crate) fn sandbox(step: &str, err: SandboxError) -> Self {
        Self::new(FailureKind::Sandbox, format!("Failed to {}: {}", step, err))
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    Succeeded(ExecutionResult),
    Failed(ExecutionFailure),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Succeeded(_))
    }

    pub fn into_result(self) -> Result<ExecutionResult, ExecutionFailure> {
        match self {
            ExecutionOutcome::Succeeded(result) => Ok(result),
            ExecutionOutcome::Failed(failure) => Err(failure),
        }
    }
}

/// Identifier of one live sandbox. Deliberately not `Clone`: whoever holds
/// it is responsible for killing the sandbox.
#[derive(Debug, PartialEq, Eq)]
pub struct SandboxHandle {
    id: String,
}

impl SandboxHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i64>,
}

impl CommandOutput {
    /// A command failed if it exited non-zero. Without an exit code, any
    /// stderr output counts as failure.
    pub fn failed(&self) -> bool {
        match self.exit_code {
            Some(code) => code != 0,
            None => !self.stderr.trim().is_empty(),
        }
    }
}

#[async_trait]
pub trait SandboxClient: Send + Sync {
    async fn create(&self, envs: &HashMap<String, String>) -> Result<SandboxHandle, SandboxError>;

    /// Run a shell command inside the sandbox's working directory.
    async fn run_command(
        &self,
        sandbox: &SandboxHandle,
        command: &str,
    ) -> Result<CommandOutput, SandboxError>;

    async fn write_file(
        &self,
        sandbox: &SandboxHandle,
        path: &str,
        contents: &[u8],
    ) -> Result<(), SandboxError>;

    async fn read_file(&self, sandbox: &SandboxHandle, path: &str) -> Result<Vec<u8>, SandboxError>;

    async fn kill(&self, sandbox: &SandboxHandle) -> Result<(), SandboxError>;
}
