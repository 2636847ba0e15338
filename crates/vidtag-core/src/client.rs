//! Gemini File API and `generateContent` client.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::Config,
    error::{Result, VidtagError},
    types::{HandleStatus, RemoteHandle, VideoFile},
};

/// Remote operations the pipeline needs from a provider.
#[async_trait]
pub trait VideoService: Send + Sync {
    async fn upload(&self, video: &VideoFile) -> Result<RemoteHandle>;
    async fn get_file(&self, name: &str) -> Result<RemoteHandle>;
    async fn generate(&self, handle: &RemoteHandle, prompt: &str) -> Result<String>;
}

pub struct GeminiClient {
    api_key: String,
    api_base: String,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct StartUploadRequest<'a> {
    file: UploadMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct UploadMetadata<'a> {
    display_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: String,
    state: Option<String>,
    error: Option<FileError>,
}

#[derive(Debug, Deserialize)]
struct FileError {
    message: Option<String>,
}

impl From<FileResource> for RemoteHandle {
    fn from(file: FileResource) -> Self {
        RemoteHandle {
            status: HandleStatus::from_provider_state(file.state.as_deref()),
            failure: file.error.and_then(|e| e.message),
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    File { file_data: FileData<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct FileData<'a> {
    file_uri: &'a str,
    mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            client: Client::new(),
        }
    }

    async fn start_upload(&self, video: &VideoFile, display_name: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/upload/v1beta/files", self.api_base))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", video.size)
            .header("X-Goog-Upload-Header-Content-Type", video.mime_type)
            .json(&StartUploadRequest {
                file: UploadMetadata { display_name },
            })
            .send()
            .await
            .map_err(|e| transfer_error(video, e.to_string()))?;

        let response = check_status(response)
            .await
            .map_err(|reason| transfer_error(video, reason))?;

        response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| transfer_error(video, "response carried no upload URL".to_string()))
    }
}

#[async_trait]
impl VideoService for GeminiClient {
    async fn upload(&self, video: &VideoFile) -> Result<RemoteHandle> {
        let display_name = video.file_name();
        let upload_url = self.start_upload(video, &display_name).await?;
        debug!("Upload session opened for {}", display_name);

        let body = tokio::fs::File::open(&video.path)
            .await
            .map_err(|e| transfer_error(video, e.to_string()))?;
        let response = self
            .client
            .post(&upload_url)
            .header("Content-Length", video.size)
            .header("X-Goog-Upload-Offset", 0)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(body)
            .send()
            .await
            .map_err(|e| transfer_error(video, e.to_string()))?;

        let response = check_status(response)
            .await
            .map_err(|reason| transfer_error(video, reason))?;

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| transfer_error(video, format!("unreadable upload response: {e}")))?;

        info!("Uploaded {} as {}", display_name, uploaded.file.name);
        let mut handle = RemoteHandle::from(uploaded.file);
        if handle.mime_type.is_empty() {
            handle.mime_type = video.mime_type.to_string();
        }
        Ok(handle)
    }

    async fn get_file(&self, name: &str) -> Result<RemoteHandle> {
        let status_error = |reason: String| VidtagError::TransferFailed {
            path: name.into(),
            reason: format!("status check failed: {reason}"),
        };

        let response = self
            .client
            .get(format!("{}/v1beta/{}", self.api_base, name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| status_error(e.to_string()))?;

        let file: FileResource = check_status(response)
            .await
            .map_err(status_error)?
            .json()
            .await
            .map_err(|e| status_error(e.to_string()))?;

        Ok(file.into())
    }

    async fn generate(&self, handle: &RemoteHandle, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::File {
                        file_data: FileData {
                            file_uri: &handle.uri,
                            mime_type: &handle.mime_type,
                        },
                    },
                    Part::Text { text: prompt },
                ],
            }],
        };

        let analysis_error = |reason: String| VidtagError::AnalysisFailed { reason };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.api_base, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| analysis_error(format!("request failed: {e}")))?;

        let generated: GenerateResponse = check_status(response)
            .await
            .map_err(analysis_error)?
            .json()
            .await
            .map_err(|e| analysis_error(format!("unreadable response: {e}")))?;

        let text = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(analysis_error(format!(
                "empty response for {}",
                handle.name
            )));
        }

        Ok(text)
    }
}

/// Pass 2xx responses through, turn anything else into `"<status>: <body>"`.
async fn check_status(response: Response) -> std::result::Result<Response, String> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(format!("{status}: {}", body.trim()))
}

fn transfer_error(video: &VideoFile, reason: String) -> VidtagError {
    VidtagError::TransferFailed {
        path: video.path.clone(),
        reason,
    }
}
