use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One row of batch output: a described video or an error placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub filename: String,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VideoRecord {
    pub fn new(filename: impl Into<String>, analysis: Analysis) -> Self {
        Self {
            filename: filename.into(),
            description: analysis.description,
            tags: analysis.tags,
            error: None,
        }
    }

    pub fn failed(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            description: String::new(),
            tags: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Fields extracted from a model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStatus {
    Uploading,
    Processing,
    Ready,
    Failed,
}

impl HandleStatus {
    /// Map a provider file state (`ACTIVE`, `PROCESSING`, ...) onto a handle status.
    pub fn from_provider_state(state: Option<&str>) -> Self {
        match state {
            None | Some("STATE_UNSPECIFIED") => HandleStatus::Uploading,
            Some("ACTIVE") => HandleStatus::Ready,
            Some("FAILED") => HandleStatus::Failed,
            Some(_) => HandleStatus::Processing,
        }
    }
}

/// Reference to an uploaded video tracked by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHandle {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub status: HandleStatus,
    pub failure: Option<String>,
}

/// A local video that passed validation and is ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    pub path: PathBuf,
    pub size: u64,
    pub mime_type: &'static str,
}

impl VideoFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
