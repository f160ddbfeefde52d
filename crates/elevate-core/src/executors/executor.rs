use futures_util::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{
    ExecutionFailure, ExecutionOutcome, ExecutionRequest, ExecutionResult, FailureKind,
    SandboxClient, SandboxHandle, SavedArtifact,
};
use crate::config::SandboxConfig;
use crate::errors::SandboxError;

const INSTALL_PREFIXES: &[&str] = &[
    "pip install",
    "pip3 install",
    "python -m pip install",
    "python3 -m pip install",
    "uv pip install",
];

/// Turn model-provided dependency text into one install command.
///
/// Returns `None` when there is nothing to install.
pub fn normalize_dependency_spec(spec: &str) -> Option<String> {
    let spec = spec.trim();
    if spec.is_empty() {
        return None;
    }

    let already_command = INSTALL_PREFIXES.iter().any(|prefix| {
        spec.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    });
    if already_command {
        return Some(spec.to_string());
    }

    let packages: Vec<&str> = spec
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|package| !package.is_empty())
        .collect();
    if packages.is_empty() {
        return None;
    }
    Some(format!("pip install {}", packages.join(" ")))
}

type CreateTask = JoinHandle<Result<SandboxHandle, SandboxError>>;

/// Owns a sandbox handle until it is killed, exactly once.
///
/// Creation runs on its own task and the guard keeps that task until it
/// yields a handle, so a run that is cancelled or dropped mid-creation still
/// kills the sandbox once it exists.
struct SandboxGuard {
    client: Arc<dyn SandboxClient>,
    handle: Option<SandboxHandle>,
    pending: Option<CreateTask>,
}

impl SandboxGuard {
    fn new(client: Arc<dyn SandboxClient>) -> Self {
        Self {
            client,
            handle: None,
            pending: None,
        }
    }

    async fn create(&mut self, envs: HashMap<String, String>) -> Result<&SandboxHandle, ExecutionFailure> {
        let client = self.client.clone();
        let task = self
            .pending
            .insert(tokio::spawn(async move { client.create(&envs).await }));
        let created = task.await;
        self.pending = None;

        match created {
            Ok(Ok(handle)) => Ok(&*self.handle.insert(handle)),
            Ok(Err(e)) => Err(ExecutionFailure::sandbox("create sandbox", e)),
            Err(e) => Err(ExecutionFailure::new(
                FailureKind::Unexpected,
                format!("Sandbox creation task failed: {}", e),
            )),
        }
    }

    async fn release(&mut self) {
        if let Some(task) = self.pending.take() {
            tokio::spawn(kill_when_created(self.client.clone(), task));
        }
        if let Some(handle) = self.handle.take() {
            match self.client.kill(&handle).await {
                Ok(()) => log::debug!("Released sandbox {}", handle.id()),
                Err(e) => log::warn!("Failed to kill sandbox {}: {}", handle.id(), e),
            }
        }
    }
}

impl Drop for SandboxGuard {
    fn drop(&mut self) {
        if self.handle.is_none() && self.pending.is_none() {
            return;
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                log::warn!("No runtime available to release sandbox");
                return;
            }
        };
        if let Some(task) = self.pending.take() {
            runtime.spawn(kill_when_created(self.client.clone(), task));
        }
        if let Some(handle) = self.handle.take() {
            let client = self.client.clone();
            runtime.spawn(async move {
                if let Err(e) = client.kill(&handle).await {
                    log::warn!("Failed to kill abandoned sandbox {}: {}", handle.id(), e);
                }
            });
        }
    }
}

async fn kill_when_created(client: Arc<dyn SandboxClient>, task: CreateTask) {
    if let Ok(Ok(handle)) = task.await {
        log::info!("Killing sandbox {} created after its run ended", handle.id());
        if let Err(e) = client.kill(&handle).await {
            log::warn!("Failed to kill sandbox {}: {}", handle.id(), e);
        }
    }
}

/// Runs one piece of generated code in a fresh sandbox per call.
pub struct SandboxExecutor {
    client: Arc<dyn SandboxClient>,
    config: SandboxConfig,
    timeout: Duration,
}

impl SandboxExecutor {
    pub fn new(client: Arc<dyn SandboxClient>, config: SandboxConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_seconds);
        Self {
            client,
            config,
            timeout,
        }
    }

    /// Overall deadline for one run, replacing `sandbox.timeout_seconds`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Execute `request`, always tearing down the sandbox and temp file.
    pub async fn execute(
        &self,
        request: &ExecutionRequest,
        cancel: &CancellationToken,
    ) -> ExecutionOutcome {
        let mut guard = SandboxGuard::new(self.client.clone());
        let mut source_file: Option<NamedTempFile> = None;

        let steps = AssertUnwindSafe(self.run_steps(request, &mut guard, &mut source_file));
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::warn!("Execution cancelled by caller");
                Err(ExecutionFailure::new(FailureKind::Cancelled, "Execution was cancelled"))
            }
            finished = tokio::time::timeout(self.timeout, steps.catch_unwind()) => match finished {
                Err(_) => {
                    log::warn!("Execution exceeded {:?}", self.timeout);
                    Err(ExecutionFailure::new(
                        FailureKind::Timeout,
                        format!("Execution exceeded {} seconds", self.timeout.as_secs_f64()),
                    ))
                }
                Ok(Err(panic)) => {
                    let message = panic_message(panic.as_ref());
                    log::error!("Execution panicked: {}", message);
                    Err(ExecutionFailure::new(FailureKind::Unexpected, message))
                }
                Ok(Ok(result)) => result,
            }
        };

        guard.release().await;
        if let Some(file) = source_file.take() {
            let path = file.path().to_path_buf();
            if let Err(e) = file.close() {
                log::warn!("Failed to delete temp file {}: {}", path.display(), e);
            }
        }

        match outcome {
            Ok(result) => ExecutionOutcome::Succeeded(result),
            Err(failure) => {
                log::error!("{}", failure);
                ExecutionOutcome::Failed(failure)
            }
        }
    }

    async fn run_steps(
        &self,
        request: &ExecutionRequest,
        guard: &mut SandboxGuard,
        source_file: &mut Option<NamedTempFile>,
    ) -> Result<ExecutionResult, ExecutionFailure> {
        let sandbox = guard.create(self.sandbox_env()).await?;
        log::info!("Sandbox {} ready", sandbox.id());

        if let Some(install) = normalize_dependency_spec(&request.dependency_spec) {
            log::info!("Installing dependencies: {}", install);
            let output = self
                .client
                .run_command(sandbox, &install)
                .await
                .map_err(|e| ExecutionFailure::sandbox("install dependencies", e))?;
            if output.failed() {
                let message = if output.stderr.trim().is_empty() {
                    output.stdout.trim().to_string()
                } else {
                    output.stderr.trim().to_string()
                };
                return Err(ExecutionFailure::new(FailureKind::DependencyInstall, message)
                    .with_output(output.stdout, output.stderr));
            }
        }

        let remote_path = self.write_source(sandbox, &request.code, source_file).await?;

        log::debug!("Executing code:\n{}", request.code);
        let output = self
            .client
            .run_command(sandbox, &format!("python {}", remote_path))
            .await
            .map_err(|e| ExecutionFailure::sandbox("run code", e))?;
        log::debug!("stdout: {}", output.stdout);

        let exited_non_zero = output.exit_code.is_some_and(|code| code != 0);
        if !output.stderr.trim().is_empty() || exited_non_zero {
            let message = if output.stderr.trim().is_empty() {
                format!("Process exited with code {}", output.exit_code.unwrap_or_default())
            } else {
                output.stderr.trim().to_string()
            };
            return Err(ExecutionFailure::new(FailureKind::Execution, message)
                .with_output(output.stdout, output.stderr));
        }

        let artifact = if request.wants_artifact {
            match self.save_artifact(sandbox, request).await {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    log::warn!("Could not retrieve artifact {}: {}", self.config.artifact_path, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(ExecutionResult {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            artifact,
        })
    }

    /// Write the code locally and to the sandbox under the same file name.
    async fn write_source(
        &self,
        sandbox: &SandboxHandle,
        code: &str,
        source_file: &mut Option<NamedTempFile>,
    ) -> Result<String, ExecutionFailure> {
        let local_failure =
            |e: std::io::Error| ExecutionFailure::new(FailureKind::Unexpected, format!("Failed to write temp file: {}", e));

        let mut file = tempfile::Builder::new()
            .prefix("elevate-")
            .suffix(".py")
            .tempfile()
            .map_err(local_failure)?;
        file.write_all(code.as_bytes()).map_err(local_failure)?;
        file.flush().map_err(local_failure)?;

        let file_name = file
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = source_file.insert(file);
        log::debug!("Wrote source to {}", file.path().display());

        let remote_path = format!("{}/{}", self.config.work_dir.trim_end_matches('/'), file_name);
        self.client
            .write_file(sandbox, &remote_path, code.as_bytes())
            .await
            .map_err(|e| ExecutionFailure::sandbox("upload code", e))?;
        Ok(remote_path)
    }

    /// Copy the artifact out of the sandbox. The bytes are staged next to the
    /// destination and renamed into place, so readers never see a partial file.
    async fn save_artifact(
        &self,
        sandbox: &SandboxHandle,
        request: &ExecutionRequest,
    ) -> Result<SavedArtifact, String> {
        let bytes = self
            .client
            .read_file(sandbox, &self.artifact_remote_path())
            .await
            .map_err(|e| e.to_string())?;

        let path: PathBuf = request
            .artifact_output
            .clone()
            .unwrap_or_else(|| self.config.artifact_output.clone());
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(parent).await.map_err(|e| e.to_string())?;

        let mut staged = tempfile::Builder::new()
            .prefix(".elevate-artifact-")
            .tempfile_in(parent)
            .map_err(|e| e.to_string())?;
        staged.write_all(&bytes).map_err(|e| e.to_string())?;
        staged.flush().map_err(|e| e.to_string())?;
        staged.persist(&path).map_err(|e| e.error.to_string())?;
        log::info!("Saved artifact to {} ({} bytes)", path.display(), bytes.len());

        Ok(SavedArtifact {
            path,
            bytes: bytes.len(),
        })
    }

    fn artifact_remote_path(&self) -> String {
        let artifact = &self.config.artifact_path;
        if artifact.starts_with('/') {
            artifact.clone()
        } else {
            format!("{}/{}", self.config.work_dir.trim_end_matches('/'), artifact)
        }
    }

    /// Allow-listed process variables, then explicit pairs on top.
    fn sandbox_env(&self) -> HashMap<String, String> {
        let mut envs: HashMap<String, String> = self
            .config
            .env_passthrough
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|value| (name.clone(), value)))
            .collect();
        envs.extend(self.config.env.clone());
        envs
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Execution panicked".to_string()
    }
}
