//! Logging System
//!
//! Structured logging built on the `tracing` crate, with configurable
//! level, output format, and destination.

use crate::error::ShelfError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output is file; None means use runtime default
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
        }
    }
}

/// Resolve the log file path with precedence: SHELF_LOG_FILE env, config
/// file, platform state directory default.
pub fn resolve_log_file_path(config_file: Option<PathBuf>) -> Result<PathBuf, ShelfError> {
    if let Ok(env_path) = std::env::var("SHELF_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    let project_dirs = directories::ProjectDirs::from("", "shelf", "shelf").ok_or_else(|| {
        ShelfError::Logging("Could not determine platform state directory for log file".to_string())
    })?;
    let dir = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_dir())
        .to_path_buf();
    Ok(dir.join("shelf.log"))
}

/// Initialize the logging system.
///
/// The `SHELF_LOG` environment variable overrides the configured level
/// with a full `EnvFilter` directive string.
pub fn init(config: Option<&LoggingConfig>) -> Result<(), ShelfError> {
    let filter = build_env_filter(config);
    let format = determine_format(config)?;
    let to_file = determine_output(config)?;

    let base_subscriber = Registry::default().with(filter);

    if format == "json" {
        if to_file {
            let file_writer = open_log_file(config)?;
            base_subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(file_writer),
                )
                .init();
        } else {
            base_subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    } else if to_file {
        let file_writer = open_log_file(config)?;
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(file_writer),
            )
            .init();
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}

fn open_log_file(config: Option<&LoggingConfig>) -> Result<std::fs::File, ShelfError> {
    let log_file = resolve_log_file_path(config.and_then(|c| c.file.clone()))?;
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ShelfError::Logging(format!("Failed to create log directory: {}", e)))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| ShelfError::Logging(format!("Failed to open log file {:?}: {}", log_file, e)))
}

fn build_env_filter(config: Option<&LoggingConfig>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env("SHELF_LOG") {
        return filter;
    }
    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    EnvFilter::new(level)
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<String, ShelfError> {
    let format = config.map(|c| c.format.as_str()).unwrap_or("text");
    if format != "json" && format != "text" {
        return Err(ShelfError::Logging(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            format
        )));
    }
    Ok(format.to_string())
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<bool, ShelfError> {
    match config.map(|c| c.output.as_str()).unwrap_or("stderr") {
        "stderr" => Ok(false),
        "file" => Ok(true),
        other => Err(ShelfError::Logging(format!(
            "Invalid log output: {} (must be 'stderr' or 'file')",
            other
        ))),
    }
}
