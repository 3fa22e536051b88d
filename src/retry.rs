//! Throttle-aware retry
//!
//! Only rate limiting is retried. Every other failure, including validation
//! and authorization errors, propagates on the first occurrence.

use crate::config::UploadSettings;
use crate::error::{Result, UploadError};
use log::warn;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for every following one
    pub base_delay: Duration,
    /// Cap on any single delay, including one requested by the remote
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&UploadSettings::default())
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn from_settings(settings: &UploadSettings) -> Self {
        Self {
            max_retries: settings.retry_throttled_request_max_times,
            base_delay: settings.retry_base_delay_duration(),
            max_delay: settings.retry_max_delay_duration(),
        }
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `retry` (zero based)
    pub fn delay_for(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let delay = retry_after.unwrap_or_else(|| {
            self.base_delay
                .saturating_mul(2u32.saturating_pow(retry.min(16)))
        });
        delay.min(self.max_delay)
    }

    /// Runs `attempt`, retrying while it fails with a throttled error and
    /// retries remain
    ///
    /// `cancel` aborts a pending backoff with `UploadError::Cancelled`.
    pub async fn retry_if_throttled<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0u32;

        loop {
            let error = match attempt().await {
                Err(UploadError::Throttled(error)) if retries < self.max_retries => error,
                other => return other,
            };

            let delay = self.delay_for(retries, error.retry_after());
            retries += 1;
            warn!(
                "Request {} throttled, retry {}/{} in {:?}",
                error.request, retries, self.max_retries, delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(UploadError::cancelled(format!("retry of {}", error.request)));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
