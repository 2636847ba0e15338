use std::path::Path;

use tracing::{info, warn};

use crate::{
    client::VideoService,
    error::{Result, VidtagError},
    grammar::ResponseGrammar,
    source::validate_video,
    types::{Analysis, RemoteHandle, VideoFile},
    waiter::{PollPolicy, wait_until_ready},
};

/// Stages a single video moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uploading,
    Processing,
    Analyzing,
}

/// Validate a local file and send it to the provider.
pub async fn upload_video<S>(
    service: &S,
    path: &Path,
    max_bytes: u64,
) -> Result<(VideoFile, RemoteHandle)>
where
    S: VideoService + ?Sized,
{
    let video = validate_video(path, max_bytes)?;
    info!(
        "Uploading {} ({:.2} MB)",
        video.path.display(),
        video.size as f64 / (1024.0 * 1024.0)
    );
    let handle = service.upload(&video).await?;
    Ok((video, handle))
}

/// Ask the model about a ready file and return its raw reply.
pub async fn analyze_video<S, G>(
    service: &S,
    handle: &RemoteHandle,
    grammar: &G,
) -> Result<String>
where
    S: VideoService + ?Sized,
    G: ResponseGrammar + ?Sized,
{
    let text = service.generate(handle, grammar.prompt()).await?;
    if text.trim().is_empty() {
        return Err(VidtagError::AnalysisFailed {
            reason: format!("empty response for {}", handle.name),
        });
    }
    Ok(text)
}

/// Upload, wait, analyze. `on_stage` is called as each stage begins.
pub async fn describe_video<S, G, F>(
    service: &S,
    grammar: &G,
    path: &Path,
    poll: &PollPolicy,
    max_bytes: u64,
    mut on_stage: F,
) -> Result<Analysis>
where
    S: VideoService + ?Sized,
    G: ResponseGrammar + ?Sized,
    F: FnMut(Stage),
{
    on_stage(Stage::Uploading);
    let (video, handle) = upload_video(service, path, max_bytes).await?;

    on_stage(Stage::Processing);
    let ready = wait_until_ready(service, handle, poll).await?;

    on_stage(Stage::Analyzing);
    let text = analyze_video(service, &ready, grammar).await?;

    let analysis = grammar.parse(&text);
    if analysis.description.is_empty() && analysis.tags.is_empty() {
        warn!(
            "No description or tags found in reply for {}: {:.100}",
            video.file_name(),
            text
        );
    }
    Ok(analysis)
}
