use std::error::Error;
use std::future::Future;
use std::time::Duration;

use orderflow_core::{CollaboratorResult, CoreError};
use orderflow_store::app_config::RetrySettings;
use tokio::time::sleep;

// Collaborator calls are bounded by `with_timeout`. Reads are repeated by
// `retry_on_transient` while the failure looks like an outage; an error that
// is an answer (unknown id, conflicting write) is returned at once. Writes
// never come through here.

/// Backoff schedule for idempotent reads
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Calls made in total, counting the first
    pub max_attempts: u32,
    /// Pause after the first failure
    pub initial_delay: Duration,
    /// Upper bound for any single pause
    pub max_delay: Duration,
    /// Growth factor applied to the pause after each failure
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            multiplier: settings.multiplier,
        }
    }
}

impl RetryConfig {
    /// One attempt, no backoff
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        let next = Duration::from_millis(((delay.as_millis() as f64) * self.multiplier) as u64);
        next.min(self.max_delay)
    }
}

/// Run `call`, failing with [`CoreError::Timeout`] if it takes longer than `limit`.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> CollaboratorResult<T>
where
    F: Future<Output = CollaboratorResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::Timeout(limit).into()),
    }
}

/// Whether repeating the failed call can change the outcome
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

impl IsTransient for CoreError {
    fn is_transient(&self) -> bool {
        CoreError::is_transient(self)
    }
}

/// Errors raised outside this workspace (driver, I/O) count as outages.
impl IsTransient for Box<dyn Error + Send + Sync> {
    fn is_transient(&self) -> bool {
        self.downcast_ref::<CoreError>()
            .map(CoreError::is_transient)
            .unwrap_or(true)
    }
}

/// Call `operation` until it succeeds, fails with a non-transient error, or
/// `max_attempts` calls have been made. The last error is returned.
pub async fn retry_on_transient<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display + IsTransient,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempt = attempt, "Call succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) if !error.is_transient() => {
                tracing::debug!(attempt = attempt, error = %error, "Permanent failure, not retrying");
                return Err(error);
            }
            Err(error) => {
                if attempt >= config.max_attempts {
                    tracing::error!(attempt = attempt, error = %error, "Giving up on call");
                    return Err(error);
                }

                tracing::warn!(
                    attempt = attempt,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "Call failed, backing off"
                );

                sleep(delay).await;
                delay = config.next_delay(delay);
            }
        }
    }
}
