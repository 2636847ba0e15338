use std::{fs, path::Path, time::Duration};

use async_trait::async_trait;
use vidtag_core::{
    BatchRunner, HandleStatus, NoProgress, PollPolicy, PreviousResults, Progress, RemoteHandle,
    Result, Stage, VideoFile, VideoRecord, VideoService, VidtagError, collect_videos,
};

/// Succeeds for every file except those named in `fail_upload`.
#[derive(Default)]
struct FakeService {
    fail_upload: Vec<&'static str>,
    empty_reply: Vec<&'static str>,
}

#[async_trait]
impl VideoService for FakeService {
    async fn upload(&self, video: &VideoFile) -> Result<RemoteHandle> {
        let name = video.file_name();
        if self.fail_upload.iter().any(|n| *n == name) {
            return Err(VidtagError::TransferFailed {
                path: video.path.clone(),
                reason: "connection reset".to_string(),
            });
        }
        Ok(RemoteHandle {
            name: format!("files/{name}"),
            uri: format!("https://example.invalid/files/{name}"),
            mime_type: video.mime_type.to_string(),
            status: HandleStatus::Processing,
            failure: None,
        })
    }

    async fn get_file(&self, name: &str) -> Result<RemoteHandle> {
        Ok(RemoteHandle {
            name: name.to_string(),
            uri: format!("https://example.invalid/{name}"),
            mime_type: "video/mp4".to_string(),
            status: HandleStatus::Ready,
            failure: None,
        })
    }

    async fn generate(&self, handle: &RemoteHandle, _prompt: &str) -> Result<String> {
        let name = handle.name.trim_start_matches("files/");
        if self.empty_reply.iter().any(|n| *n == name) {
            return Ok("   ".to_string());
        }
        Ok(format!(
            "- Description: A short clip called {name}.\n- Tags: [{name}, test]"
        ))
    }
}

fn write_video(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"not really a video, but long enough").unwrap();
}

fn runner(service: FakeService) -> BatchRunner<FakeService> {
    BatchRunner::new(service)
        .with_item_delay(Duration::ZERO)
        .with_poll_policy(PollPolicy::fixed(
            Duration::from_millis(1),
            Duration::from_secs(1),
        ))
}

#[tokio::test]
async fn test_failed_upload_becomes_placeholder_and_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["one.mp4", "two.mp4", "three.mp4"] {
        write_video(dir.path(), name);
    }
    let videos = collect_videos(dir.path(), None).unwrap();
    // lexicographic: one, three, two
    let failing = FakeService {
        fail_upload: vec!["three.mp4"],
        ..Default::default()
    };

    let records = runner(failing).run(&videos, None, &mut NoProgress).await;

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].filename, "one.mp4");
    assert_eq!(records[0].description, "A short clip called one.mp4.");
    assert_eq!(records[0].tags, vec!["one.mp4", "test"]);
    assert!(!records[0].is_error());

    assert_eq!(records[1].filename, "three.mp4");
    assert!(records[1].is_error());
    assert!(records[1].description.is_empty());
    assert!(records[1].tags.is_empty());
    assert!(records[1].error.as_deref().unwrap().contains("connection reset"));

    assert_eq!(records[2].filename, "two.mp4");
    assert!(!records[2].is_error());
}

#[tokio::test]
async fn test_unsupported_files_are_not_part_of_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    write_video(dir.path(), "clip.webm");
    fs::write(dir.path().join("notes.txt"), b"some text here").unwrap();
    fs::write(dir.path().join("cover.jpg"), b"jpeg bytes here").unwrap();

    let videos = collect_videos(dir.path(), None).unwrap();
    let records = runner(FakeService::default())
        .run(&videos, None, &mut NoProgress)
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].filename, "clip.webm");
}

#[tokio::test]
async fn test_empty_reply_and_tiny_file_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    write_video(dir.path(), "a.mp4");
    write_video(dir.path(), "b.mp4");
    fs::write(dir.path().join("c.mp4"), b"x").unwrap();

    let service = FakeService {
        empty_reply: vec!["a.mp4"],
        ..Default::default()
    };
    let videos = collect_videos(dir.path(), None).unwrap();
    let runner = runner(service);
    let records = runner.run(&videos, None, &mut NoProgress).await;

    assert_eq!(records.len(), 3);
    assert!(records[0].error.as_deref().unwrap().contains("Analysis failed"));
    assert!(!records[1].is_error());
    assert!(records[2].is_error());
}

#[tokio::test]
async fn test_previous_results_are_skipped_and_appended() {
    let dir = tempfile::tempdir().unwrap();
    write_video(dir.path(), "a.mp4");
    write_video(dir.path(), "b.mp4");

    let previous = PreviousResults::from_csv(
        "Filename,Description,Tags\na.mp4,Earlier description,\"[old]\"\n",
    );
    let service = FakeService::default();
    let videos = collect_videos(dir.path(), None).unwrap();
    let runner = runner(service);
    let records = runner.run(&videos, Some(&previous), &mut NoProgress).await;

    assert_eq!(
        records,
        vec![
            VideoRecord {
                filename: "b.mp4".to_string(),
                description: "A short clip called b.mp4.".to_string(),
                tags: vec!["b.mp4".to_string(), "test".to_string()],
                error: None,
            },
            VideoRecord {
                filename: "a.mp4".to_string(),
                description: "Earlier description".to_string(),
                tags: vec!["old".to_string()],
                error: None,
            },
        ]
    );
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl Progress for Recorder {
    fn batch_started(&mut self, total: usize, skipped: usize) {
        self.events.push(format!("batch {total} {skipped}"));
    }

    fn file_started(&mut self, index: usize, _total: usize, path: &Path) {
        let name = path.file_name().unwrap().to_string_lossy();
        self.events.push(format!("start {index} {name}"));
    }

    fn stage(&mut self, stage: Stage) {
        self.events.push(format!("{stage:?}"));
    }

    fn file_finished(&mut self, record: &VideoRecord) {
        self.events
            .push(format!("done {} {}", record.filename, record.is_error()));
    }

    fn pausing(&mut self, _delay: Duration) {
        self.events.push("pause".to_string());
    }
}

#[tokio::test]
async fn test_progress_reports_stages_and_pauses_between_files() {
    let dir = tempfile::tempdir().unwrap();
    write_video(dir.path(), "a.mp4");
    write_video(dir.path(), "b.mp4");

    let service = FakeService {
        fail_upload: vec!["b.mp4"],
        ..Default::default()
    };
    let videos = collect_videos(dir.path(), None).unwrap();
    let runner = runner(service).with_item_delay(Duration::from_millis(1));
    let mut recorder = Recorder::default();
    runner.run(&videos, None, &mut recorder).await;

    assert_eq!(
        recorder.events,
        vec![
            "batch 2 0",
            "start 0 a.mp4",
            "Uploading",
            "Processing",
            "Analyzing",
            "done a.mp4 false",
            "pause",
            "start 1 b.mp4",
            "Uploading",
            "done b.mp4 true",
        ]
    );
}
