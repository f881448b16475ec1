use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Operational failures. Findings about artifacts are never errors; they
/// travel as [`crate::core::diagnostic::Diagnostic`] values instead.
#[derive(Error, Debug)]
pub enum SddError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Target not found: {}", .0.display())]
    TargetNotFound(PathBuf),
    #[error("Invalid configuration in {path}: {message}")]
    ConfigError { path: String, message: String },
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Unknown diagnostic code: {0}")]
    UnknownCode(String),
    #[error("Run interrupted before completion")]
    Interrupted,
}
