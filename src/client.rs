//! Entry Store / User Directory client seam.
//!
//! The aggregation core never performs I/O; this module is where the remote
//! REST backend is fetched from, and the payloads it returns are handed to
//! the pure core as immutable snapshots. The retry behavior that used to be
//! an ad-hoc wrapper around every request is an explicit [`RetryPolicy`]
//! here: bounded attempts, exponential backoff with a cap and jitter,
//! Retry-After honored, and 401 surfaced as [`ApiError::AuthExpired`] so the
//! session layer can re-authenticate.

use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::types::{Entry, User};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Session expired or revoked")]
    AuthExpired,
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Request exhausted {0} retry attempts")]
    RetriesExhausted(u32),
}

/// Explicit retry behavior for backend requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Transient: retry after a backoff delay.
    Retryable,
    /// Terminal for this request.
    NonRetryable,
    /// The session token is no longer accepted; re-authenticate, don't retry.
    Reauthenticate,
}

pub fn retry_decision_for_status(status: StatusCode) -> RetryDecision {
    if status == StatusCode::UNAUTHORIZED {
        RetryDecision::Reauthenticate
    } else if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        RetryDecision::Retryable
    } else {
        RetryDecision::NonRetryable
    }
}

/// Delay before the next attempt. A server-sent Retry-After wins (capped at
/// 30s); otherwise exponential backoff from the policy plus small jitter.
pub fn retry_delay(
    attempt: u32,
    policy: &RetryPolicy,
    retry_after: Option<&reqwest::header::HeaderValue>,
) -> Duration {
    if let Some(value) = retry_after.and_then(|v| v.to_str().ok()) {
        if let Ok(secs) = value.parse::<u64>() {
            return Duration::from_secs(secs.min(30));
        }
    }

    let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
    let base = policy
        .initial_backoff_ms
        .saturating_mul(exponent)
        .min(policy.max_backoff_ms);
    let jitter = (std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0))
        % 150;
    Duration::from_millis(base.saturating_add(jitter))
}

/// Send a request under the retry policy. Transient statuses and transport
/// errors are retried with backoff; 401 short-circuits to `AuthExpired`.
pub async fn send_with_retry(
    request: reqwest::RequestBuilder,
    policy: &RetryPolicy,
) -> Result<reqwest::Response, ApiError> {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        let Some(cloned) = request.try_clone() else {
            // Streaming bodies can't be cloned for a retry; send once.
            return request.send().await.map_err(ApiError::Http);
        };

        match cloned.send().await {
            Ok(response) => {
                let status = response.status();
                match retry_decision_for_status(status) {
                    RetryDecision::Reauthenticate => return Err(ApiError::AuthExpired),
                    RetryDecision::Retryable if attempt < attempts => {
                        let delay = retry_delay(
                            attempt,
                            policy,
                            response.headers().get(reqwest::header::RETRY_AFTER),
                        );
                        log::warn!(
                            "backend retry {}/{} after status {} (sleep {:?})",
                            attempt,
                            attempts,
                            status,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    _ => return Ok(response),
                }
            }
            Err(err) => {
                let retryable_transport = err.is_timeout() || err.is_connect();
                if retryable_transport && attempt < attempts {
                    let delay = retry_delay(attempt, policy, None);
                    log::warn!(
                        "backend retry {}/{} after transport error: {} (sleep {:?})",
                        attempt,
                        attempts,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    return Err(ApiError::Http(err));
                }
            }
        }
    }

    Err(ApiError::RetriesExhausted(attempts))
}

/// Client for the remote entry store and user directory.
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    policy: RetryPolicy,
}

impl DirectoryClient {
    pub fn new(base_url: &str, policy: RetryPolicy) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            token: None,
            policy,
        })
    }

    /// Set the bearer token from the session layer.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// All entries visible to the authenticated user.
    pub async fn fetch_entries(&self) -> Result<Vec<Entry>, ApiError> {
        self.get_json("api/entries").await
    }

    /// The full user roster.
    pub async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        self.get_json("api/users").await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = send_with_retry(request, &self.policy).await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}
