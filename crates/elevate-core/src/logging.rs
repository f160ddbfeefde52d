//! Console or file logging through `env_logger`.

use crate::config::LoggingConfig;
use crate::errors::ElevateError;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::str::FromStr;

/// Install the global logger. `RUST_LOG` takes precedence over the configured
/// level; calling this again after a logger is installed is a no-op.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ElevateError> {
    let level = LevelFilter::from_str(&config.level).map_err(|_| {
        ElevateError::Config(format!("Unknown log level '{}'", config.level))
    })?;

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .filter_module("hyper", LevelFilter::Warn)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("bollard", LevelFilter::Warn)
        .parse_default_env();

    if let Some(path) = &config.file {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                ElevateError::Config(format!(
                    "Failed to open log file {}: {}",
                    path.display(),
                    e
                ))
            })?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }

    if builder.try_init().is_err() {
        log::debug!("Logger already initialised; keeping the existing one");
    }
    Ok(())
}
