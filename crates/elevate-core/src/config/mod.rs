//! Configuration module
//!
//! YAML configuration for the LLM provider, the code sandbox, prompt templates,
//! the code-generation contract and logging.

pub mod types;
pub mod loader;

pub use types::*;
pub use loader::*;

use crate::errors::ElevateError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<ElevateConfig, ElevateError> {
    ConfigLoader::from_file(path).await
}
