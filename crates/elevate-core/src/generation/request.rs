use crate::errors::ElevateError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// What the generated program is asked to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    #[default]
    StructuredJson,
    PlainText,
}

impl OutputShape {
    fn tag(&self) -> &'static str {
        match self {
            OutputShape::StructuredJson => "json",
            OutputShape::PlainText => "str",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub task: String,
    #[serde(default)]
    pub framework: Option<String>,
    /// Code prepended verbatim to the generated completion.
    #[serde(default)]
    pub existing_code: Option<String>,
    #[serde(default)]
    pub output_shape: OutputShape,
    #[serde(default)]
    pub preferred_libraries: Option<String>,
    #[serde(default)]
    pub wants_artifact: bool,
    /// Where this request's chart is saved instead of `sandbox.artifact_output`.
    #[serde(default)]
    pub artifact_output: Option<PathBuf>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl GenerationRequest {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            framework: None,
            existing_code: None,
            output_shape: OutputShape::default(),
            preferred_libraries: None,
            wants_artifact: false,
            artifact_output: None,
        }
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn with_existing_code(mut self, code: impl Into<String>) -> Self {
        self.existing_code = Some(code.into());
        self
    }

    pub fn with_output_shape(mut self, shape: OutputShape) -> Self {
        self.output_shape = shape;
        self
    }

    pub fn with_preferred_libraries(mut self, libraries: impl Into<String>) -> Self {
        self.preferred_libraries = Some(libraries.into());
        self
    }

    pub fn with_artifact(mut self, wants_artifact: bool) -> Self {
        self.wants_artifact = wants_artifact;
        self
    }

    /// Save the chart to `path`, implying `wants_artifact`.
    pub fn with_artifact_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.wants_artifact = true;
        self.artifact_output = Some(path.into());
        self
    }

    pub fn validate(&self) -> Result<(), ElevateError> {
        if self.task.trim().is_empty() {
            return Err(ElevateError::Validation(
                "Generation task must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The tagged user message the code generation prompt expects.
    pub fn user_message(&self) -> String {
        let mut message = format!("\n<Prompt>{}</Prompt>\n\n", self.task);
        if let Some(framework) = non_empty(&self.framework) {
            message.push_str(&format!("<Framework> {} </Framework>", framework));
        }
        if let Some(libraries) = non_empty(&self.preferred_libraries) {
            message.push_str(&format!("<PreferredLibraries> {} </PreferredLibraries>", libraries));
        }
        if let Some(code) = non_empty(&self.existing_code) {
            message.push_str(&format!("<Code>{} </Code>", code));
        }
        message.push_str(&format!("\n<OutputFormat>{}</OutputFormat>", self.output_shape.tag()));
        message
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutput {
    Json(Value),
    Text(String),
    ArtifactSaved(PathBuf),
}
