//! Rate-limited HTTP GET with retry logic
//!
//! Every request waits on a shared token bucket first. Transport errors and
//! the server's "slow down" answers (429, 503) are retried with exponential
//! backoff; any other non-success status is returned as `ServerError`.
//!
//! Request URLs may carry credentials in their path, so logs only ever show
//! the caller-supplied label and errors are stripped of their URL.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::constants::limits;
use crate::errors::{FetchError, FetchResult};

type DirectRateLimiter = RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>;

/// HTTP operations handler with rate limiting and backoff
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: DirectRateLimiter,
}

impl HttpHandler {
    /// # Errors
    ///
    /// Returns `FetchError::Other` if `rate_limit_rps` is zero
    pub fn new(client: Client, rate_limit_rps: u32) -> FetchResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(rate_limit_rps: u32) -> FetchResult<DirectRateLimiter> {
        let rps = NonZeroU32::new(rate_limit_rps)
            .ok_or_else(|| FetchError::Other("Rate limit must be non-zero".to_string()))?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    fn backoff_delay(attempt: u32) -> Duration {
        Duration::from_millis(limits::RETRY_BASE_DELAY_MS * 2_u64.pow(attempt))
    }

    /// GET `url`, retrying transient failures
    ///
    /// `label` names the request in logs in place of the URL.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitExceeded`/`ServerOverloaded` when the server keeps
    /// pushing back, `MaxRetriesExceeded` when the transport keeps failing and
    /// `ServerError` for any other non-success status.
    pub async fn get_response(&self, url: &Url, label: &str) -> FetchResult<reqwest::Response> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let mut retries = 0;
        loop {
            match self.client.get(url.as_str()).send().await {
                Ok(response) => {
                    let status = response.status();
                    let pushback = match status {
                        StatusCode::TOO_MANY_REQUESTS => Some(FetchError::RateLimitExceeded),
                        StatusCode::SERVICE_UNAVAILABLE => Some(FetchError::ServerOverloaded),
                        _ => None,
                    };

                    if let Some(err) = pushback {
                        if retries >= limits::MAX_RETRIES {
                            return Err(err);
                        }
                        retries += 1;
                        let delay = Self::backoff_delay(retries);
                        tracing::warn!(
                            "{} answered {}. Backing off for {}ms",
                            label,
                            status.as_u16(),
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(FetchError::ServerError {
                            status: status.as_u16(),
                        });
                    }

                    tracing::debug!("Successfully fetched response: {}", label);
                    return Ok(response);
                }
                Err(e) if retries < limits::MAX_RETRIES => {
                    retries += 1;
                    let delay = Self::backoff_delay(retries);
                    tracing::warn!(
                        "Request to {} failed (attempt {}/{}): {}. Retrying in {}ms",
                        label,
                        retries,
                        limits::MAX_RETRIES,
                        e.without_url(),
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        "Request to {} failed after {} retries: {}",
                        label,
                        limits::MAX_RETRIES,
                        e.without_url()
                    );
                    return Err(FetchError::MaxRetriesExceeded {
                        max_retries: limits::MAX_RETRIES,
                    });
                }
            }
        }
    }

    /// GET `url` and parse the body as JSON
    pub async fn get_json(&self, url: &Url, label: &str) -> FetchResult<Value> {
        let response = self.get_response(url, label).await?;
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.without_url()))?;
        let value = serde_json::from_str(&body)?;
        Ok(value)
    }
}
