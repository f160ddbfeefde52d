// src/executors/docker.rs
#![allow(deprecated)]

use async_trait::async_trait;
use bollard::container::LogOutput;
use bollard::exec::{StartExecOptions, StartExecResults};
use bollard::models::{ContainerCreateBody, ExecConfig};
use bollard::query_parameters::{
    CreateContainerOptions as BollardCreateContainerOptionsQuery,
    CreateImageOptions as BollardCreateImageOptionsQuery,
    DownloadFromContainerOptions as BollardDownloadFromContainerOptionsQuery,
    RemoveContainerOptions as BollardRemoveContainerOptionsQuery,
    StartContainerOptions as BollardStartContainerOptionsQuery,
    UploadToContainerOptions as BollardUploadToContainerOptionsQuery,
};
use bollard::Docker;
use futures_util::stream::StreamExt;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use uuid::Uuid;

use super::{CommandOutput, SandboxClient, SandboxHandle};
use crate::config::SandboxConfig;
use crate::errors::SandboxError;

/// Sandboxes backed by local Docker containers. Each sandbox is one
/// long-lived container idling on `sleep infinity`; commands run through exec
/// and files move as tar archives.
pub struct DockerSandboxClient {
    docker: Docker,
    image: String,
    work_dir: String,
}

impl DockerSandboxClient {
    pub fn new(config: &SandboxConfig) -> Result<Self, SandboxError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self {
            docker,
            image: config.image.clone(),
            work_dir: config.work_dir.clone(),
        })
    }

    async fn ensure_image(&self) -> Result<(), SandboxError> {
        if self.docker.inspect_image(&self.image).await.is_ok() {
            return Ok(());
        }

        log::info!("Pulling sandbox image {}", self.image);
        let pull_options = Some(BollardCreateImageOptionsQuery {
            from_image: Some(self.image.clone()),
            ..Default::default()
        });
        let mut pull_stream = self.docker.create_image(pull_options, None, None);
        while let Some(progress) = pull_stream.next().await {
            progress?;
        }
        Ok(())
    }

    fn resolve_path<'a>(&self, path: &'a str) -> std::borrow::Cow<'a, str> {
        if path.starts_with('/') {
            path.into()
        } else {
            format!("{}/{}", self.work_dir.trim_end_matches('/'), path).into()
        }
    }
}

#[async_trait]
impl SandboxClient for DockerSandboxClient {
    async fn create(&self, envs: &HashMap<String, String>) -> Result<SandboxHandle, SandboxError> {
        self.ensure_image().await?;

        let name = format!("elevate-sandbox-{}", Uuid::new_v4());
        let options = Some(BollardCreateContainerOptionsQuery {
            name: Some(name.clone()),
            ..Default::default()
        });

        let env: Vec<String> = envs.iter().map(|(key, value)| format!("{}={}", key, value)).collect();
        let config = ContainerCreateBody {
            image: Some(self.image.clone()),
            cmd: Some(vec!["sleep".to_string(), "infinity".to_string()]),
            env: Some(env),
            working_dir: Some(self.work_dir.clone()),
            ..Default::default()
        };

        let container = self.docker.create_container(options, config).await?;
        let handle = SandboxHandle::new(container.id);

        if let Err(e) = self
            .docker
            .start_container(handle.id(), None::<BollardStartContainerOptionsQuery>)
            .await
        {
            log::error!("Failed to start sandbox container {}: {}", name, e);
            let _ = self.kill(&handle).await;
            return Err(e.into());
        }

        // The working directory may not exist in the image.
        let prepared = self.run_command(&handle, &format!("mkdir -p {}", self.work_dir)).await;
        if let Err(e) = prepared {
            let _ = self.kill(&handle).await;
            return Err(e);
        }

        log::info!("Created sandbox container {} ({})", name, handle.id());
        Ok(handle)
    }

    async fn run_command(
        &self,
        sandbox: &SandboxHandle,
        command: &str,
    ) -> Result<CommandOutput, SandboxError> {
        log::debug!("Running in sandbox {}: {}", sandbox.id(), command);
        let exec = self
            .docker
            .create_exec(
                sandbox.id(),
                ExecConfig {
                    cmd: Some(vec!["sh".to_string(), "-c".to_string(), command.to_string()]),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    working_dir: Some(self.work_dir.clone()),
                    ..Default::default()
                },
            )
            .await?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        match self.docker.start_exec(&exec.id, None::<StartExecOptions>).await? {
            StartExecResults::Attached { mut output, .. } => {
                while let Some(msg) = output.next().await {
                    match msg? {
                        LogOutput::StdOut { message } => {
                            stdout.push_str(&String::from_utf8_lossy(&message))
                        }
                        LogOutput::StdErr { message } => {
                            stderr.push_str(&String::from_utf8_lossy(&message))
                        }
                        _ => {}
                    }
                }
            }
            StartExecResults::Detached => {
                return Err(SandboxError::Backend(format!(
                    "Exec in sandbox {} started detached",
                    sandbox.id()
                )));
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;
        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code: inspect.exit_code,
        })
    }

    async fn write_file(
        &self,
        sandbox: &SandboxHandle,
        path: &str,
        contents: &[u8],
    ) -> Result<(), SandboxError> {
        let full_path = self.resolve_path(path);
        let target = Path::new(full_path.as_ref());
        let file_name = target
            .file_name()
            .ok_or_else(|| SandboxError::InvalidPath(full_path.to_string()))?;
        let parent = target
            .parent()
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string());

        let mut archive = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        archive.append_data(&mut header, file_name, contents)?;
        let tar_data = archive.into_inner()?;

        self.docker
            .upload_to_container(
                sandbox.id(),
                Some(BollardUploadToContainerOptionsQuery {
                    path: parent,
                    ..Default::default()
                }),
                bollard::body_full(tar_data.into()),
            )
            .await?;

        log::debug!("Wrote {} bytes to {} in sandbox {}", contents.len(), full_path, sandbox.id());
        Ok(())
    }

    async fn read_file(&self, sandbox: &SandboxHandle, path: &str) -> Result<Vec<u8>, SandboxError> {
        let full_path = self.resolve_path(path).into_owned();
        let options = BollardDownloadFromContainerOptionsQuery {
            path: full_path.clone(),
        };
        let mut stream = self.docker.download_from_container(sandbox.id(), Some(options));

        let mut archive_data = Vec::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => archive_data.extend_from_slice(&bytes),
                Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                    return Err(SandboxError::FileNotFound(full_path));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut archive = tar::Archive::new(archive_data.as_slice());
        let mut entries = archive.entries()?;
        match entries.next() {
            Some(entry) => {
                let mut entry = entry?;
                let mut content = Vec::new();
                entry.read_to_end(&mut content)?;
                Ok(content)
            }
            None => Err(SandboxError::FileNotFound(full_path)),
        }
    }

    async fn kill(&self, sandbox: &SandboxHandle) -> Result<(), SandboxError> {
        self.docker
            .remove_container(
                sandbox.id(),
                Some(BollardRemoveContainerOptionsQuery {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;
        log::info!("Removed sandbox container {}", sandbox.id());
        Ok(())
    }
}
