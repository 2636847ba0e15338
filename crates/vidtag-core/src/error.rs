use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidtagError {
    #[error("Missing API key: {env_var} is not set in the environment or a config file")]
    MissingApiKey { env_var: String },

    #[error("Input path not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Unsupported video file: {path}")]
    UnsupportedExtension { path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Transfer failed for {path}: {reason}")]
    TransferFailed { path: PathBuf, reason: String },

    #[error("{path} is {size} bytes, above the {limit} byte upload limit")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Processing of {name} did not finish within {waited:?}")]
    ProcessingTimeout { name: String, waited: Duration },

    #[error("Remote processing failed for {name}: {reason}")]
    RemoteProcessingFailed { name: String, reason: String },

    #[error("Analysis failed: {reason}")]
    AnalysisFailed { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl VidtagError {
    /// Configuration errors abort the run before any video is processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VidtagError::MissingApiKey { .. }
                | VidtagError::InputNotFound { .. }
                | VidtagError::UnsupportedExtension { .. }
                | VidtagError::InvalidConfig { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, VidtagError>;
