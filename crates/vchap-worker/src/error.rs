//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(#[from] vchap_models::ConfigError),

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Input directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("No files matching '{pattern}' in {dir}")]
    NoInputFiles { dir: PathBuf, pattern: String },

    #[error("Media error: {0}")]
    Media(#[from] vchap_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl WorkerError {
    pub fn no_input_files(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self::NoInputFiles {
            dir: dir.into(),
            pattern: pattern.into(),
        }
    }

    /// Check if the error only affects the file being processed.
    ///
    /// Everything else (bad configuration, missing input directory, missing
    /// FFmpeg) ends the whole run.
    pub fn is_per_file(&self) -> bool {
        match self {
            WorkerError::Media(e) => !e.is_missing_tool(),
            WorkerError::Io(_) | WorkerError::Json(_) | WorkerError::TaskFailed(_) => true,
            WorkerError::Config(_)
            | WorkerError::ConfigNotFound(_)
            | WorkerError::DirectoryNotFound(_)
            | WorkerError::NoInputFiles { .. } => false,
        }
    }
}
