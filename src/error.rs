//! Error types for the shelf library.
//!
//! Source plugins are external collaborators whose failures travel as
//! `anyhow::Error` and are always degraded at the tree boundary (logged,
//! empty result). `ShelfError` covers the library's own setup failures.

use thiserror::Error;

/// Library-level errors
#[derive(Debug, Error)]
pub enum ShelfError {
    /// Configuration loading or validation failure
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed version string
    #[error("malformed version: {0}")]
    Version(String),

    /// Background fetch runtime could not be constructed
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Logging initialization failure
    #[error("logging error: {0}")]
    Logging(String),
}
