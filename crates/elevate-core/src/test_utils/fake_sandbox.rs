// src/test_utils/fake_sandbox.rs
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::SandboxError;
use crate::executors::{CommandOutput, SandboxClient, SandboxHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum SandboxCall {
    Create(HashMap<String, String>),
    Run(String),
    WriteFile { path: String, contents: Vec<u8> },
    ReadFile(String),
    Kill(String),
}

/// Scriptable in-memory `SandboxClient` that records every call.
///
/// Commands of the form `python <file>.py` get the run output, anything else
/// is treated as a dependency install.
pub struct FakeSandboxClient {
    install_output: CommandOutput,
    run_output: CommandOutput,
    run_delay: Option<Duration>,
    create_delay: Option<Duration>,
    fail_create: bool,
    fail_write: bool,
    fail_read: bool,
    fail_kill: bool,
    panic_on_run: bool,
    files: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<Vec<SandboxCall>>,
    created: AtomicUsize,
}

fn output(stdout: &str, stderr: &str, exit_code: i64) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        exit_code: Some(exit_code),
    }
}

impl FakeSandboxClient {
    pub fn new() -> Self {
        Self {
            install_output: output("", "", 0),
            run_output: output("", "", 0),
            run_delay: None,
            create_delay: None,
            fail_create: false,
            fail_write: false,
            fail_read: false,
            fail_kill: false,
            panic_on_run: false,
            files: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            created: AtomicUsize::new(0),
        }
    }

    pub fn with_install_output(mut self, stdout: &str, stderr: &str, exit_code: i64) -> Self {
        self.install_output = output(stdout, stderr, exit_code);
        self
    }

    pub fn with_run_output(mut self, stdout: &str, stderr: &str, exit_code: i64) -> Self {
        self.run_output = output(stdout, stderr, exit_code);
        self
    }

    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = Some(delay);
        self
    }

    /// Seed a file the sandboxed code is assumed to have produced.
    pub fn with_file(self, path: &str, contents: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(path.to_string(), contents);
        self
    }

    /// Hold `create` open after the sandbox id is allocated, like a backend
    /// that has started the container but not yet answered.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_write(mut self) -> Self {
        self.fail_write = true;
        self
    }

    /// Every `read_file` fails with an I/O error rather than a missing file.
    pub fn failing_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    pub fn failing_kill(mut self) -> Self {
        self.fail_kill = true;
        self
    }

    pub fn panicking_run(mut self) -> Self {
        self.panic_on_run = true;
        self
    }

    pub fn calls(&self) -> Vec<SandboxCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SandboxCall::Run(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn written_paths(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SandboxCall::WriteFile { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn read_paths(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SandboxCall::ReadFile(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn created_envs(&self) -> Vec<HashMap<String, String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SandboxCall::Create(envs) => Some(envs),
                _ => None,
            })
            .collect()
    }

    pub fn kill_count(&self) -> usize {
        self.killed_ids().len()
    }

    pub fn killed_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SandboxCall::Kill(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Number of sandboxes that came into existence, including ones whose
    /// `create` call had not returned yet.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    fn record(&self, call: SandboxCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for FakeSandboxClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SandboxClient for FakeSandboxClient {
    async fn create(&self, envs: &HashMap<String, String>) -> Result<SandboxHandle, SandboxError> {
        self.record(SandboxCall::Create(envs.clone()));
        if self.fail_create {
            return Err(SandboxError::Backend("sandbox quota exceeded".to_string()));
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(SandboxHandle::new(format!("fake-sandbox-{}", n)))
    }

    async fn run_command(
        &self,
        _sandbox: &SandboxHandle,
        command: &str,
    ) -> Result<CommandOutput, SandboxError> {
        self.record(SandboxCall::Run(command.to_string()));
        let is_run = command.starts_with("python ") && command.ends_with(".py");
        if !is_run {
            return Ok(self.install_output.clone());
        }
        if self.panic_on_run {
            panic!("sandbox exploded");
        }
        if let Some(delay) = self.run_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.run_output.clone())
    }

    async fn write_file(
        &self,
        _sandbox: &SandboxHandle,
        path: &str,
        contents: &[u8],
    ) -> Result<(), SandboxError> {
        self.record(SandboxCall::WriteFile {
            path: path.to_string(),
            contents: contents.to_vec(),
        });
        if self.fail_write {
            return Err(SandboxError::Backend("upload rejected".to_string()));
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), contents.to_vec());
        Ok(())
    }

    async fn read_file(&self, _sandbox: &SandboxHandle, path: &str) -> Result<Vec<u8>, SandboxError> {
        self.record(SandboxCall::ReadFile(path.to_string()));
        if self.fail_read {
            return Err(SandboxError::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "download interrupted",
            )));
        }
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| SandboxError::FileNotFound(path.to_string()))
    }

    async fn kill(&self, sandbox: &SandboxHandle) -> Result<(), SandboxError> {
        self.record(SandboxCall::Kill(sandbox.id().to_string()));
        if self.fail_kill {
            return Err(SandboxError::Backend("sandbox already gone".to_string()));
        }
        Ok(())
    }
}
