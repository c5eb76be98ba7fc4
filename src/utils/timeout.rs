//! Timeout utilities for startup I/O
//!
//! The secret fetch is the only network call made while loading settings,
//! so it is the only operation that needs a bound.

use std::time::Duration;

/// Default bound on the Secrets Manager round-trip
pub const DEFAULT_SECRET_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout configuration for the settings loader
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for the Secrets Manager fetch (default: 10s)
    pub secret_fetch_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            secret_fetch_timeout: DEFAULT_SECRET_FETCH_TIMEOUT,
        }
    }
}

impl TimeoutConfig {
    /// Parse a timeout expressed in whole seconds, e.g. `SETTINGS_SECRET_TIMEOUT_SECS`
    pub fn parse_secs(raw: &str) -> Option<Duration> {
        raw.trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Apply timeout to an async operation
pub async fn with_timeout<T, E>(
    timeout: Duration,
    future: impl std::future::Future<Output = Result<T, E>>,
) -> Result<T, TimeoutError<E>> {
    match tokio::time::timeout(timeout, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(TimeoutError::Inner(err)),
        Err(_) => Err(TimeoutError::Timeout(timeout)),
    }
}

/// Error type for timeout operations
#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Inner(E),
}
