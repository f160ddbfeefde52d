use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::assembly::AssembledSource;
use super::request::{GenerationOutput, GenerationRequest, OutputShape};
use super::sections::{CodeSections, SECTIONS_SCHEMA_NAME};
use crate::config::{ElevateConfig, ResponseContract};
use crate::errors::ElevateError;
use crate::executors::{DockerSandboxClient, ExecutionOutcome, ExecutionRequest, SandboxExecutor};
use crate::extract::extract_code;
use crate::llm::{create_completion_client, CompletionClient};
use crate::prompts::PromptRenderer;

const TEMPLATE_ID: &str = "python_code_generation";
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Generates Python for a task, runs it in a sandbox and returns what it printed.
pub struct OnlyPython {
    llm: Arc<dyn CompletionClient>,
    prompts: PromptRenderer,
    executor: SandboxExecutor,
    temperature: f32,
    contract: ResponseContract,
}

impl OnlyPython {
    pub fn new(llm: Arc<dyn CompletionClient>, prompts: PromptRenderer, executor: SandboxExecutor) -> Self {
        Self {
            llm,
            prompts,
            executor,
            temperature: DEFAULT_TEMPERATURE,
            contract: ResponseContract::default(),
        }
    }

    /// Build the full stack from configuration: provider client, prompt
    /// templates and a Docker-backed sandbox.
    pub fn from_config(config: &ElevateConfig) -> Result<Self, ElevateError> {
        let llm = create_completion_client(&config.llm)?;
        let prompts = PromptRenderer::from_config(&config.prompts)?;
        let sandbox = DockerSandboxClient::new(&config.sandbox)
            .map_err(|e| ElevateError::Config(format!("Failed to connect to Docker: {}", e)))?;
        let executor = SandboxExecutor::new(Arc::new(sandbox), config.sandbox.clone());

        Ok(Self::new(llm, prompts, executor)
            .with_temperature(config.llm.parameters.temperature)
            .with_response_contract(config.generation.response_contract))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_response_contract(mut self, contract: ResponseContract) -> Self {
        self.contract = contract;
        self
    }

    pub async fn generate_code(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutput, ElevateError> {
        request.validate()?;

        let sections = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::warn!("Generation cancelled by caller");
                return Err(ElevateError::Cancelled(
                    "Cancelled before the model responded".to_string(),
                ));
            }
            sections = self.generate_sections(request) => sections?,
        };

        let source = AssembledSource::new(
            sections.imports,
            request.existing_code.clone().unwrap_or_default(),
            sections.code_completion,
        )
        .render();
        log::debug!("Pip installs: {}", sections.pip_installs);
        log::debug!("Full code with imports:\n{}", source);

        let mut execution = ExecutionRequest::new(source)
            .with_dependencies(sections.pip_installs)
            .with_artifact(request.wants_artifact);
        if let Some(path) = &request.artifact_output {
            execution = execution.with_artifact_output(path.clone());
        }

        let result = match self.executor.execute(&execution, cancel).await {
            ExecutionOutcome::Succeeded(result) => result,
            ExecutionOutcome::Failed(failure) => return Err(ElevateError::ExecutionFailed(failure)),
        };

        if let Some(artifact) = result.artifact {
            return Ok(GenerationOutput::ArtifactSaved(artifact.path));
        }

        let output = result.output_text();
        log::debug!("Output of execution:\n{}", output);
        match request.output_shape {
            OutputShape::StructuredJson => serde_json::from_str(&output)
                .map(GenerationOutput::Json)
                .map_err(|e| ElevateError::MalformedJsonOutput {
                    output,
                    reason: e.to_string(),
                }),
            OutputShape::PlainText => Ok(GenerationOutput::Text(output)),
        }
    }

    /// Ask the model for the pip installs, imports and completion of a request.
    pub async fn generate_sections(&self, request: &GenerationRequest) -> Result<CodeSections, ElevateError> {
        let artifact_name = Path::new(&self.executor.config().artifact_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.executor.config().artifact_path.clone());
        let system_prompt = self
            .prompts
            .render(TEMPLATE_ID, &[("artifact_name", artifact_name.as_str())])?;
        let user_message = request.user_message();

        log::info!("Generating Python code ({:?} contract)", self.contract);
        match self.contract {
            ResponseContract::Delimited => {
                let raw = self
                    .llm
                    .complete_text(&system_prompt, &user_message, Some(self.temperature))
                    .await?;
                log::debug!("Generated code and installs:\n{}", raw);

                let extracted = extract_code(&raw);
                match CodeSections::parse_delimited(extracted) {
                    Err(_) if extracted != raw => CodeSections::parse_delimited(&raw),
                    parsed => parsed,
                }
            }
            ResponseContract::Structured => {
                let value = self
                    .llm
                    .complete_structured(
                        &system_prompt,
                        &user_message,
                        SECTIONS_SCHEMA_NAME,
                        &CodeSections::schema(),
                    )
                    .await?;
                CodeSections::from_structured(value)
            }
        }
    }
}
