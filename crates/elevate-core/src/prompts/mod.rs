//! Prompt templates and rendering
//!
//! Templates are plain text with `{{name}}` placeholders. The built-in set is
//! compiled into the crate; a configured directory of `*.md` files can add
//! templates or replace built-ins by file stem. Values are resolved from the
//! caller's parameters first, then from default template variables
//! (configuration, `ELEVATE_TPL_*` environment variables and runtime values).

use crate::config::PromptConfig;
use crate::errors::ElevateError;
use regex::Regex;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("python_code_generation", include_str!("../../prompts/python_code_generation.md")),
    ("markdown_conversion", include_str!("../../prompts/markdown_conversion.md")),
    ("summary", include_str!("../../prompts/summary.md")),
    ("eli5", include_str!("../../prompts/eli5.md")),
    ("qa", include_str!("../../prompts/qa.md")),
    ("rephrase", include_str!("../../prompts/rephrase.md")),
    ("email_personal", include_str!("../../prompts/email_personal.md")),
    ("email_professional", include_str!("../../prompts/email_professional.md")),
    ("email_marketing", include_str!("../../prompts/email_marketing.md")),
    ("shell", include_str!("../../prompts/shell.md")),
    ("slides", include_str!("../../prompts/slides.md")),
    ("demo_script", include_str!("../../prompts/demo_script.md")),
    ("video_to_blog", include_str!("../../prompts/video_to_blog.md")),
    ("judge", include_str!("../../prompts/judge.md")),
    ("json_extraction", include_str!("../../prompts/json_extraction.md")),
    ("audiocast", include_str!("../../prompts/audiocast.md")),
    ("audiocast_instructions", include_str!("../../prompts/audiocast_instructions.md")),
];

const ENV_VAR_PREFIX: &str = "ELEVATE_TPL_";

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("placeholder pattern is valid")
    })
}

#[derive(Debug, Clone, Default)]
pub struct PromptRenderer {
    templates: HashMap<String, String>,
    defaults: HashMap<String, String>,
}

impl PromptRenderer {
    /// Renderer with no templates registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer holding the compiled-in templates and no default variables.
    pub fn builtin() -> Self {
        let mut renderer = Self::new();
        for (id, template) in BUILTIN_TEMPLATES {
            renderer.register(*id, *template);
        }
        renderer
    }

    /// Built-in templates plus configured overrides and default variables.
    pub fn from_config(config: &PromptConfig) -> Result<Self, ElevateError> {
        let mut defaults = config.template_vars.clone();

        for (key, value) in env::vars() {
            if let Some(stripped_key) = key.strip_prefix(ENV_VAR_PREFIX) {
                defaults.insert(stripped_key.to_lowercase(), value);
            }
        }

        defaults.insert("elevate.runtime.date".to_string(), chrono::Utc::now().to_rfc3339());
        defaults.insert("elevate.runtime.os".to_string(), env::consts::OS.to_string());

        let mut renderer = Self::builtin().with_defaults(defaults);
        if let Some(dir) = &config.directory {
            let loaded = renderer.load_dir(dir)?;
            log::info!("Loaded {} prompt templates from {}", loaded, dir.display());
        }
        Ok(renderer)
    }

    pub fn with_defaults(mut self, defaults: HashMap<String, String>) -> Self {
        self.defaults.extend(defaults);
        self
    }

    pub fn register(&mut self, id: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(id.into(), template.into());
    }

    /// Register every `*.md` file in `dir` under its file stem.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, ElevateError> {
        let entries = fs::read_dir(dir).map_err(|e| {
            ElevateError::Config(format!(
                "Failed to read prompt directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut loaded = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path).map_err(|e| {
                ElevateError::Config(format!(
                    "Failed to read prompt file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            log::debug!("Registered prompt template '{}' from {}", id, path.display());
            self.register(id, content);
            loaded += 1;
        }
        Ok(loaded)
    }

    pub fn has_template(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn template_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Render template `id`, substituting every placeholder.
    pub fn render(&self, id: &str, params: &[(&str, &str)]) -> Result<String, ElevateError> {
        let template = self
            .templates
            .get(id)
            .ok_or_else(|| ElevateError::TemplateNotFound {
                template: id.to_string(),
            })?;

        let lookup = |name: &str| -> Option<&str> {
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
                .or_else(|| self.defaults.get(name).map(String::as_str))
        };

        let pattern = placeholder_pattern();
        for captures in pattern.captures_iter(template) {
            let name = &captures[1];
            if lookup(name).is_none() {
                return Err(ElevateError::TemplateRender {
                    template: id.to_string(),
                    parameter: name.to_string(),
                });
            }
        }

        let rendered = pattern.replace_all(template, |captures: &regex::Captures| {
            lookup(&captures[1]).unwrap_or_default().to_string()
        });
        Ok(rendered.trim().to_string())
    }
}
