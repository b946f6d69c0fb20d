//! Retry executor
//!
//! Wraps every authenticated request. Gateway errors and transport
//! timeouts are retried with exponential backoff; a 401 on the first
//! attempt triggers one re-authentication that does not count against the
//! retry budget. Everything else is surfaced immediately.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::auth::{TokenProvider, TOKEN_PARAM};
use crate::error::ErpError;
use crate::transport::{ErpRequest, ErpResponse, HttpTransport};

/// Status codes treated as transient
pub const RETRYABLE_STATUS_CODES: [u16; 3] = [502, 503, 504];

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&status)
}

/// Retry budget and backoff curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before retry `n` (0-based) is `backoff_factor^n` seconds
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            backoff_factor,
        }
    }

    /// Delay after the given failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        Duration::try_from_secs_f64(self.backoff_factor.powi(exponent)).unwrap_or(Duration::MAX)
    }

    /// Rejects a backoff factor that cannot produce a delay
    pub fn validate(&self) -> Result<(), ErpError> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            return Err(ErpError::Configuration(format!(
                "backoff factor must be a non-negative number, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }

    /// Total transport attempts allowed, excluding a re-authentication replay
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Executes requests against the ERP under a `RetryPolicy`
pub struct RetryExecutor {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenProvider>,
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenProvider>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            tokens,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Sends an authenticated request
    ///
    /// `request` must already carry the session token. On success the
    /// response has a 2xx status.
    ///
    /// # Errors
    ///
    /// - `Auth` if a 401 persists after the one re-authentication
    /// - `Http` for any non-retryable non-2xx status
    /// - `Network` for non-transient transport faults
    /// - `RetryExhausted` once `max_retries + 1` attempts have failed transiently
    pub async fn execute(&self, mut request: ErpRequest) -> Result<ErpResponse, ErpError> {
        let mut attempt: u32 = 0;
        let mut reauthenticated = false;

        loop {
            let failure = match self.transport.send(&request).await {
                Ok(response) if response.status == 401 => {
                    if attempt == 0 && !reauthenticated {
                        warn!(path = %request.path, "Token rejected, re-authenticating");
                        match request.query_value(TOKEN_PARAM) {
                            Some(rejected) => self.tokens.invalidate_if(rejected).await,
                            None => self.tokens.invalidate().await,
                        }
                        let token = self.tokens.get_token().await?;
                        request.set_query(TOKEN_PARAM, token);
                        reauthenticated = true;
                        continue;
                    }
                    return Err(ErpError::Auth(format!(
                        "request to {} rejected with HTTP 401",
                        request.path
                    )));
                }
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) if is_retryable_status(response.status) => {
                    http_error(&response)
                }
                Ok(response) => return Err(http_error(&response)),
                Err(err) if err.is_transient() => ErpError::Network(err),
                Err(err) => return Err(ErpError::Network(err)),
            };

            if attempt >= self.policy.max_retries {
                error!(
                    path = %request.path,
                    attempts = attempt + 1,
                    error = %failure,
                    "Retry attempts exhausted"
                );
                return Err(ErpError::RetryExhausted {
                    attempts: attempt + 1,
                    cause: Box::new(failure),
                });
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                path = %request.path,
                attempt = attempt + 1,
                status = failure.status(),
                delay_secs = delay.as_secs_f64(),
                "Transient ERP failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Builds the `Http` error for a non-2xx response, citing the ERP request id
pub(crate) fn http_error(response: &ErpResponse) -> ErpError {
    let excerpt: String = response.body.trim().chars().take(200).collect();
    let request_id = response.request_id().unwrap_or("unknown");
    ErpError::http(
        response.status,
        format!("{} (Request-ID: {})", excerpt, request_id),
    )
}
