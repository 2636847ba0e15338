use std::{
    path::Path,
    time::{Duration, Instant},
};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use vidtag_core::{Progress, Stage, VideoRecord};

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(spinner_style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Uploading => "uploading...",
        Stage::Processing => "waiting for processing...",
        Stage::Analyzing => "generating description...",
    }
}

/// Renders batch progress as one spinner per video on stderr.
#[derive(Default)]
pub struct CliProgress {
    spinner: Option<ProgressBar>,
    label: String,
    started: Option<Instant>,
    pub succeeded: usize,
    pub failed: usize,
}

impl Progress for CliProgress {
    fn batch_started(&mut self, total: usize, skipped: usize) {
        let skipped = if skipped > 0 {
            format!(" ({} already processed)", skipped)
        } else {
            String::new()
        };
        eprintln!(
            "{} Found {} videos to process{}",
            style("✓").green().bold(),
            total,
            style(skipped).dim()
        );
        eprintln!("{}", style("─".repeat(60)).dim());
    }

    fn file_started(&mut self, index: usize, total: usize, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.label = format!("[{}/{}] {}", index + 1, total, name);
        self.started = Some(Instant::now());
        self.spinner = Some(create_spinner(&self.label));
    }

    fn stage(&mut self, stage: Stage) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format!("{} {}", self.label, style(stage_label(stage)).dim()));
        }
    }

    fn file_finished(&mut self, record: &VideoRecord) {
        let elapsed = self
            .started
            .take()
            .map(|s| format_duration(s.elapsed()))
            .unwrap_or_default();

        let message = match &record.error {
            Some(error) => {
                self.failed += 1;
                format!(
                    "{} {} {} {}",
                    style("✗").red().bold(),
                    self.label,
                    style(error).red(),
                    style(format!("[{}]", elapsed)).dim()
                )
            }
            None => {
                self.succeeded += 1;
                format!(
                    "{} {} {} {}",
                    style("✓").green().bold(),
                    self.label,
                    style(&record.description).dim(),
                    style(format!("[{}]", elapsed)).dim()
                )
            }
        };

        match self.spinner.take() {
            Some(spinner) => spinner.finish_with_message(message),
            None => eprintln!("{}", message),
        }
    }

    fn pausing(&mut self, delay: Duration) {
        eprintln!(
            "{}",
            style(format!(
                "  waiting {} before the next video",
                format_duration(delay)
            ))
            .dim()
        );
    }
}
