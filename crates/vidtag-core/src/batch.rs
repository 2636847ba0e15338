use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::{info, warn};

use crate::{
    client::VideoService,
    grammar::{MarkerGrammar, ResponseGrammar},
    pipeline::{Stage, describe_video},
    resume::PreviousResults,
    types::VideoRecord,
    waiter::PollPolicy,
};

pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_secs(5);

/// Observer for batch progress. All methods default to no-ops.
pub trait Progress {
    fn batch_started(&mut self, _total: usize, _skipped: usize) {}
    fn file_started(&mut self, _index: usize, _total: usize, _path: &Path) {}
    fn stage(&mut self, _stage: Stage) {}
    fn file_finished(&mut self, _record: &VideoRecord) {}
    fn pausing(&mut self, _delay: Duration) {}
}

/// Discards every event.
pub struct NoProgress;

impl Progress for NoProgress {}

/// Runs videos through the pipeline one at a time.
pub struct BatchRunner<S, G = MarkerGrammar> {
    service: S,
    grammar: G,
    poll: PollPolicy,
    item_delay: Duration,
    max_upload_bytes: u64,
}

impl<S: VideoService> BatchRunner<S, MarkerGrammar> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            grammar: MarkerGrammar::default(),
            poll: PollPolicy::default(),
            item_delay: DEFAULT_ITEM_DELAY,
            max_upload_bytes: crate::config::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl<S: VideoService, G: ResponseGrammar> BatchRunner<S, G> {
    pub fn with_grammar<H: ResponseGrammar>(self, grammar: H) -> BatchRunner<S, H> {
        BatchRunner {
            service: self.service,
            grammar,
            poll: self.poll,
            item_delay: self.item_delay,
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Process `videos` in order. A failing video yields an error placeholder
    /// and the batch moves on. Videos already present in `previous` are
    /// skipped and the carried-over records are appended at the end.
    pub async fn run(
        &self,
        videos: &[PathBuf],
        previous: Option<&PreviousResults>,
        progress: &mut dyn Progress,
    ) -> Vec<VideoRecord> {
        let done = previous.map(|p| p.filenames()).unwrap_or_default();
        let pending: Vec<&PathBuf> = videos
            .iter()
            .filter(|path| !done.contains(display_name(path).as_str()))
            .collect();

        let skipped = videos.len() - pending.len();
        if skipped > 0 {
            info!("Skipping {} already processed videos", skipped);
        }
        progress.batch_started(pending.len(), skipped);

        let mut records = Vec::with_capacity(pending.len());
        for (index, path) in pending.iter().enumerate() {
            progress.file_started(index, pending.len(), path);
            let record = self.process(path, progress).await;
            progress.file_finished(&record);
            records.push(record);

            if index + 1 < pending.len() && !self.item_delay.is_zero() {
                progress.pausing(self.item_delay);
                tokio::time::sleep(self.item_delay).await;
            }
        }

        if let Some(previous) = previous {
            records.extend(previous.records.iter().cloned());
        }
        records
    }

    async fn process(&self, path: &Path, progress: &mut dyn Progress) -> VideoRecord {
        let filename = display_name(path);
        let result = describe_video(
            &self.service,
            &self.grammar,
            path,
            &self.poll,
            self.max_upload_bytes,
            |stage| progress.stage(stage),
        )
        .await;

        match result {
            Ok(analysis) => {
                info!("Described {}", filename);
                VideoRecord::new(filename, analysis)
            }
            Err(e) => {
                warn!("Failed to process {}: {}", filename, e);
                VideoRecord::failed(filename, e.to_string())
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
