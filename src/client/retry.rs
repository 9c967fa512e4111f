//! Bounded retry with capped exponential backoff.

use super::error::{MemosError, Result};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// First backoff step.
const BASE_DELAY: Duration = Duration::from_secs(4);
/// Upper bound for any single backoff.
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Backoff before retrying after the zero-based attempt `attempt_index`: `min(4 * 2^i, 10)` s.
pub fn backoff_delay(attempt_index: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
    BASE_DELAY.saturating_mul(factor).min(MAX_DELAY)
}

/// Suspends the retry loop between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `delay`.
    async fn sleep(&self, delay: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

enum RetryState {
    Attempting {
        attempt: u32,
    },
    Waiting {
        attempt: u32,
        delay: Duration,
        error: MemosError,
    },
}

/// Run `attempt_fn` until it succeeds, fails permanently or `max_attempts` are spent.
///
/// Only [transient](MemosError::is_transient) errors are retried. On exhaustion the last error
/// is returned unchanged. `attempt_fn` receives the zero-based attempt index.
pub(crate) async fn run_with_retry<T, F, Fut>(
    max_attempts: u32,
    sleeper: &dyn Sleeper,
    label: &str,
    mut attempt_fn: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut state = RetryState::Attempting { attempt: 0 };
    loop {
        state = match state {
            RetryState::Attempting { attempt } => match attempt_fn(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_transient() => return Err(error),
                Err(error) if attempt + 1 >= max_attempts => {
                    tracing::warn!(
                        request = label,
                        attempts = max_attempts,
                        error = %error,
                        "Request failed after all attempts"
                    );
                    return Err(error);
                }
                Err(error) => RetryState::Waiting {
                    attempt,
                    delay: backoff_delay(attempt),
                    error,
                },
            },
            RetryState::Waiting {
                attempt,
                delay,
                error,
            } => {
                tracing::warn!(
                    request = label,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient failure; retrying"
                );
                sleeper.sleep(delay).await;
                RetryState::Attempting {
                    attempt: attempt + 1,
                }
            }
        };
    }
}
