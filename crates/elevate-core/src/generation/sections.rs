use crate::errors::ElevateError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const PIP_INSTALLS: &str = "PipInstalls";
pub const IMPORTS: &str = "Imports";
pub const CODE_COMPLETION: &str = "CodeCompletion";

/// Schema name used when the sections are requested as structured output.
pub const SECTIONS_SCHEMA_NAME: &str = "python_code_sections";

/// The three parts of a code generation response, each trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSections {
    pub pip_installs: String,
    pub imports: String,
    pub code_completion: String,
}

fn delimited<'a>(text: &'a str, name: &str) -> Result<&'a str, ElevateError> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let missing = || ElevateError::MalformedModelOutput {
        delimiter: name.to_string(),
    };

    let start = text.find(&open).ok_or_else(missing)? + open.len();
    let len = text[start..].find(&close).ok_or_else(missing)?;
    Ok(text[start..start + len].trim())
}

impl CodeSections {
    /// Parse `<PipInstalls>`, `<Imports>` and `<CodeCompletion>` out of free text.
    pub fn parse_delimited(text: &str) -> Result<Self, ElevateError> {
        Ok(Self {
            pip_installs: delimited(text, PIP_INSTALLS)?.to_string(),
            imports: delimited(text, IMPORTS)?.to_string(),
            code_completion: delimited(text, CODE_COMPLETION)?.to_string(),
        })
    }

    pub fn from_structured(value: Value) -> Result<Self, ElevateError> {
        let sections: CodeSections = serde_json::from_value(value).map_err(|e| {
            ElevateError::InvalidStructuredResponse {
                schema: SECTIONS_SCHEMA_NAME.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            pip_installs: sections.pip_installs.trim().to_string(),
            imports: sections.imports.trim().to_string(),
            code_completion: sections.code_completion.trim().to_string(),
        })
    }

    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "pip_installs": {
                    "type": "string",
                    "description": "Space separated packages to pip install, empty when none are needed"
                },
                "imports": {
                    "type": "string",
                    "description": "Every import statement the completion needs"
                },
                "code_completion": {
                    "type": "string",
                    "description": "The code that runs after the imports and the existing code"
                }
            },
            "required": ["pip_installs", "imports", "code_completion"],
            "additionalProperties": false
        })
    }
}
