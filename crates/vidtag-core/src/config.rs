use std::{path::PathBuf, str::FromStr, time::Duration};

use tracing::debug;

use crate::{
    error::{Result, VidtagError},
    waiter::PollPolicy,
};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "VIDTAG_MODEL";
pub const API_BASE_ENV: &str = "VIDTAG_API_BASE";
pub const POLL_INTERVAL_ENV: &str = "VIDTAG_POLL_INTERVAL_SECS";
pub const POLL_MAX_INTERVAL_ENV: &str = "VIDTAG_POLL_MAX_INTERVAL_SECS";
pub const PROCESSING_TIMEOUT_ENV: &str = "VIDTAG_PROCESSING_TIMEOUT_SECS";
pub const MAX_UPLOAD_BYTES_ENV: &str = "VIDTAG_MAX_UPLOAD_BYTES";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// Gemini File API per-file ceiling.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub poll: PollPolicy,
    pub max_upload_bytes: u64,
}

impl Config {
    /// Load configuration from the process environment, `./.env`, and the
    /// per-user config file, in that order of precedence.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded {}", path.display());
        }
        if let Some(path) = user_config_file().filter(|p| p.is_file()) {
            if dotenvy::from_path(&path).is_ok() {
                debug!("Loaded {}", path.display());
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| VidtagError::MissingApiKey {
                env_var: API_KEY_ENV.to_string(),
            })?;

        let defaults = PollPolicy::default();
        let poll = PollPolicy {
            interval: parse_secs(&lookup, POLL_INTERVAL_ENV)?.unwrap_or(defaults.interval),
            max_interval: parse_secs(&lookup, POLL_MAX_INTERVAL_ENV)?
                .unwrap_or(defaults.max_interval),
            timeout: parse_secs(&lookup, PROCESSING_TIMEOUT_ENV)?.unwrap_or(defaults.timeout),
            ..defaults
        };
        poll.validate()?;

        Ok(Self {
            api_key,
            api_base: lookup(API_BASE_ENV)
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: lookup(MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            poll,
            max_upload_bytes: parse_var(&lookup, MAX_UPLOAD_BYTES_ENV)?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }
}

/// `<config_dir>/vidtag/config.env`, e.g. `~/.config/vidtag/config.env` on Linux.
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vidtag").join("config.env"))
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| VidtagError::InvalidConfig {
                reason: format!("{key}={raw:?} is not a valid number"),
            }),
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_var::<F, u64>(lookup, key)?.map(Duration::from_secs))
}
