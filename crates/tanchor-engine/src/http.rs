//! Outbound HTTP plumbing shared by every adapter
//!
//! One `reqwest::Client` with a bounded timeout. Requests go through
//! [`HttpPolicy::send_with_retry`], which retries timeouts, connect failures
//! and 502/503/504 with clamped exponential backoff.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tanchor_core::errors::{Result, TaError, TaErrorKind};

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based), doubled each time and
    /// capped at `max_backoff`
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone)]
pub struct HttpPolicy {
    client: Client,
    retry: RetryPolicy,
}

impl HttpPolicy {
    /// # Errors
    /// `ERR_CONFIGURATION` if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            TaError::new(TaErrorKind::Configuration)
                .with_op("http_client")
                .with_message(e.to_string())
        })?;
        Ok(Self { client, retry })
    }

    /// # Errors
    /// See [`HttpPolicy::new`].
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(
            config.http_timeout(),
            RetryPolicy {
                max_retries: config.http_max_retries,
                initial_backoff: Duration::from_millis(config.http_initial_backoff_ms),
                max_backoff: Duration::from_millis(config.http_max_backoff_ms),
            },
        )
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send the request built by `build`, rebuilding it for each retry.
    ///
    /// A transient status on the final attempt is returned as a response,
    /// not an error; callers inspect the status themselves.
    pub async fn send_with_retry<F>(
        &self,
        endpoint: &str,
        build: F,
    ) -> std::result::Result<Response, reqwest::Error>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let retries_left = attempt < self.retry.max_retries;
            match build(&self.client).send().await {
                Ok(response) if retries_left && is_transient_status(response.status()) => {
                    tracing::debug!(
                        endpoint,
                        attempt,
                        status = response.status().as_u16(),
                        "retrying transient status"
                    );
                }
                Ok(response) => return Ok(response),
                Err(err) if retries_left && is_transient_error(&err) => {
                    tracing::debug!(endpoint, attempt, error = %err, "retrying transport error");
                }
                Err(err) => return Err(err),
            }
            tokio::time::sleep(self.retry.backoff_for_attempt(attempt)).await;
            attempt += 1;
        }
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_transient_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Adapt a transport error into the canonical error
pub fn from_http(op: &str, err: &reqwest::Error) -> TaError {
    let kind = if err.is_timeout() {
        TaErrorKind::Timeout
    } else {
        TaErrorKind::ExternalService
    };
    TaError::new(kind).with_op(op).with_message(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_clamps() {
        let retry = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(1_000),
        };
        assert_eq!(retry.backoff_for_attempt(0), Duration::from_millis(200));
        assert_eq!(retry.backoff_for_attempt(1), Duration::from_millis(400));
        assert_eq!(retry.backoff_for_attempt(2), Duration::from_millis(800));
        assert_eq!(retry.backoff_for_attempt(3), Duration::from_millis(1_000));
        assert_eq!(retry.backoff_for_attempt(40), Duration::from_millis(1_000));
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
