use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::{
    client::VideoService,
    error::{Result, VidtagError},
    types::{HandleStatus, RemoteHandle},
};

/// How often to re-check an uploaded file and how long to wait overall.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(30),
            multiplier: 1.5,
            timeout: Duration::from_secs(600),
        }
    }
}

impl PollPolicy {
    pub fn fixed(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            multiplier: 1.0,
            timeout,
        }
    }

    /// Grow `current` by the multiplier, never past `max_interval`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let cap = self.max_interval.max(self.interval);
        Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier.max(1.0))
            .unwrap_or(cap)
            .min(cap)
    }

    /// Reject policies that would poll in a tight loop or never back off.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(VidtagError::InvalidConfig {
                reason: "poll interval must be greater than zero".to_string(),
            });
        }
        if self.max_interval < self.interval {
            return Err(VidtagError::InvalidConfig {
                reason: format!(
                    "max poll interval {:?} is shorter than the poll interval {:?}",
                    self.max_interval, self.interval
                ),
            });
        }
        Ok(())
    }
}

/// Poll `handle` until the provider reports it ready.
pub async fn wait_until_ready<S>(
    service: &S,
    mut handle: RemoteHandle,
    policy: &PollPolicy,
) -> Result<RemoteHandle>
where
    S: VideoService + ?Sized,
{
    let started = Instant::now();
    let mut delay = policy.interval;

    loop {
        match handle.status {
            HandleStatus::Ready => return Ok(handle),
            HandleStatus::Failed => {
                return Err(VidtagError::RemoteProcessingFailed {
                    reason: handle
                        .failure
                        .unwrap_or_else(|| "provider reported FAILED".to_string()),
                    name: handle.name,
                });
            }
            HandleStatus::Uploading | HandleStatus::Processing => {}
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.timeout {
            return Err(VidtagError::ProcessingTimeout {
                name: handle.name,
                waited: elapsed,
            });
        }

        debug!(
            "{} still {:?} after {:.1}s",
            handle.name,
            handle.status,
            elapsed.as_secs_f64()
        );
        sleep(delay.min(policy.timeout - elapsed)).await;
        delay = policy.next_delay(delay);

        handle = service.get_file(&handle.name).await?;
    }
}
