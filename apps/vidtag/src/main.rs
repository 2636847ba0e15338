use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use tokio::fs;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use vidtag_core::{
    BatchRunner, Config, GeminiClient, OutputFormat, PreviousResults, VidtagError,
    collect_videos, output_path_for, render,
};

use crate::progress::{CliProgress, format_duration};

mod progress;

/// CLI wrapper for OutputFormat (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliFormat {
    #[default]
    Json,
    Txt,
    Csv,
}

impl From<CliFormat> for OutputFormat {
    fn from(cli: CliFormat) -> Self {
        match cli {
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Txt => OutputFormat::Txt,
            CliFormat::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Parser)]
#[command(name = "vidtag")]
#[command(about = "Generate descriptions and tags for video files using the Gemini API")]
struct Cli {
    /// Path to a video file or a directory of video files
    #[arg(short, long)]
    video: PathBuf,

    /// Output file (prints to the console when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: CliFormat,

    /// Seconds to wait between videos
    #[arg(short, long, default_value_t = 5)]
    wait: u64,

    /// Reprocess videos that already have results in the resume file
    #[arg(short, long)]
    retry: bool,

    /// Only process the file with this name inside the video directory
    #[arg(short, long)]
    specific: Option<String>,

    /// Earlier CSV results used to skip already processed videos
    #[arg(long, default_value = "results.csv")]
    resume_file: PathBuf,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(env_filter)
            .init();
    }
}

fn exit_with(error: VidtagError) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), error);
    std::process::exit(1);
}

/// Configuration errors end the run with a short message; anything else is
/// passed up to `main`.
fn or_exit<T>(result: vidtag_core::Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_fatal() => exit_with(e),
        Err(e) => Err(e.into()),
    }
}

async fn load_previous(cli: &Cli) -> Option<PreviousResults> {
    if cli.retry || !cli.video.is_dir() || !cli.resume_file.is_file() {
        return None;
    }
    match PreviousResults::load(&cli.resume_file).await {
        Ok(previous) if !previous.is_empty() => Some(previous),
        Ok(_) => None,
        Err(e) => {
            warn!("Ignoring {}: {}", cli.resume_file.display(), e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Validate configuration and input before touching the network
    let config = or_exit(Config::load())?;
    let videos = or_exit(collect_videos(&cli.video, cli.specific.as_deref()))?;

    eprintln!(
        "\n{}  {}\n",
        style("vidtag").cyan().bold(),
        style(format!("Video Tagger ({})", config.model)).dim()
    );

    let previous = load_previous(&cli).await;
    let format: OutputFormat = cli.format.into();

    let runner = BatchRunner::new(GeminiClient::new(&config))
        .with_poll_policy(config.poll.clone())
        .with_item_delay(Duration::from_secs(cli.wait))
        .with_max_upload_bytes(config.max_upload_bytes);

    let total_start = Instant::now();
    let mut progress = CliProgress::default();
    let records = runner.run(&videos, previous.as_ref(), &mut progress).await;

    eprintln!("{}", style("─".repeat(60)).dim());
    eprintln!(
        "{} {} described, {} failed {}\n",
        style("Done:").dim(),
        style(progress.succeeded).green().bold(),
        style(progress.failed).red().bold(),
        style(format!("[{}]", format_duration(total_start.elapsed()))).dim()
    );

    if records.is_empty() {
        eprintln!("No results to display.");
        return Ok(());
    }

    let rendered = render(&records, format)?;

    match cli.output {
        Some(output) => {
            let output = output_path_for(&output, format);
            fs::write(&output, rendered).await?;
            eprintln!(
                "{} {}",
                style("Saved:").dim(),
                style(output.display()).cyan()
            );
        }
        None => print!("{}", rendered),
    }

    Ok(())
}
