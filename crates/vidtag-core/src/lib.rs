//! vidtag core library
//!
//! Uploads videos to the Gemini File API, waits for processing, asks the model
//! for a short description and tags, and renders the results.

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod grammar;
pub mod pipeline;
pub mod resume;
pub mod source;
pub mod types;
pub mod waiter;

// Re-export commonly used items at crate root
pub use batch::{BatchRunner, NoProgress, Progress};
pub use client::{GeminiClient, VideoService};
pub use config::Config;
pub use error::{Result, VidtagError};
pub use format::{OutputFormat, output_path_for, render};
pub use grammar::{MarkerGrammar, ResponseGrammar};
pub use pipeline::{Stage, analyze_video, describe_video, upload_video};
pub use resume::PreviousResults;
pub use source::{collect_videos, validate_video};
pub use types::{Analysis, HandleStatus, RemoteHandle, VideoFile, VideoRecord};
pub use waiter::{PollPolicy, wait_until_ready};
