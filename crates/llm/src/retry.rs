//! Timeout and bounded retry for backend calls.

use nucrag_core::config::HttpConfig;
use nucrag_core::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;

/// Per-call timeout plus a bounded number of attempts with exponential backoff.
///
/// Only retryable errors (network failures, error statuses other than
/// 401/403) trigger another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(http: &HttpConfig) -> Self {
        Self {
            timeout: Duration::from_secs(http.timeout_secs),
            max_attempts: http.max_attempts.max(1),
            backoff: Duration::from_millis(http.backoff_ms),
        }
    }

    /// Delay before the attempt following `attempt` (1-based).
    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Run `op` under the policy.
    ///
    /// `label` names the call in logs and timeout errors.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 1;

        loop {
            let error = match tokio::time::timeout(self.timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => e,
                Err(_) => AppError::BackendNetwork(format!(
                    "{} timed out after {}s",
                    label,
                    self.timeout.as_secs_f64()
                )),
            };

            if attempt >= self.max_attempts || !error.is_retryable() {
                return Err(error);
            }

            let delay = self.delay_after(attempt);
            tracing::warn!(
                "{} failed (attempt {}/{}), retrying in {}ms: {}",
                label,
                attempt,
                self.max_attempts,
                delay.as_millis(),
                error
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
