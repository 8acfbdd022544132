//! Retry helper for transient provider errors. Grounded in
//! the teacher's `services/rate_limiter.rs::retry_async`, unchanged in shape:
//! exponential backoff via the `backoff` crate, bounded by both an attempt
//! count and a total elapsed-time ceiling.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tracing::warn;

use crate::error::CuratorError;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    fn to_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: self.multiplier,
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        }
    }
}

/// Retries `operation` while it returns a retriable `CuratorError`, giving up
/// once `config.max_retries` attempts are spent or the backoff's elapsed-time
/// ceiling is hit.
pub async fn retry_async<T, Fut, F>(operation: F, config: &RetryConfig, operation_name: &str) -> Result<T, CuratorError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, CuratorError>>,
{
    let mut attempts = 0u32;
    let mut backoff = config.to_backoff();

    loop {
        attempts += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retriable() || attempts >= config.max_retries => return Err(e),
            Err(e) => {
                if let Some(duration) = backoff.next_backoff() {
                    warn!(operation = operation_name, attempt = attempts, error = %e, "provider call failed, retrying");
                    tokio::time::sleep(duration).await;
                } else {
                    return Err(e);
                }
            }
        }
    }
}
