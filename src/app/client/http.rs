//! Core HTTP operations with rate limiting and retry logic
//!
//! Every request made by the crate goes through [`HttpHandler::get_response`],
//! which paces requests and retries transient failures (connection errors,
//! HTTP 429 and 5xx) with exponential backoff. Callers only ever see the final
//! outcome.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::app::client::config::ClientConfig;
use crate::constants::limits;
use crate::errors::{DownloadError, DownloadResult};

/// HTTP operations handler with resilience patterns
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl HttpHandler {
    /// Creates a new HttpHandler from a client configuration
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::ClientSetup` if the client cannot be built or the
    /// rate limit is zero
    pub fn new(config: &ClientConfig) -> DownloadResult<Self> {
        let client = config.build_http_client()?;
        Self::with_client(client, config)
    }

    /// Creates a new HttpHandler around an existing client
    pub fn with_client(client: Client, config: &ClientConfig) -> DownloadResult<Self> {
        let rate_limiter = Self::build_rate_limiter(config.rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    /// Builds the rate limiter with the specified rate limit
    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> DownloadResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let quota = Quota::per_second(NonZeroU32::new(rate_limit_rps).ok_or_else(|| {
            DownloadError::ClientSetup {
                reason: "Rate limit must be non-zero".to_string(),
            }
        })?);
        Ok(RateLimiter::direct(quota))
    }

    /// Delay before retry number `attempt` (1-based), capped at `MAX_RETRY_DELAY`
    fn backoff_delay(&self, attempt: u32) -> Duration {
        2_u32
            .checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.retry_base_delay.checked_mul(factor))
            .map_or(limits::MAX_RETRY_DELAY, |delay| delay.min(limits::MAX_RETRY_DELAY))
    }

    /// Fetches the HTTP response with rate limiting and retry logic
    ///
    /// Client errors (4xx other than 429) are returned as responses so the caller
    /// can interpret them; only transient failures are retried.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` once retries are exhausted:
    /// `RateLimitExceeded` for 429, `ServerError` for 5xx and
    /// `MaxRetriesExceeded` for connection failures
    pub async fn get_response(&self, url: &Url) -> DownloadResult<reqwest::Response> {
        let mut retries = 0;
        loop {
            // Apply rate limiting with jitter
            self.rate_limiter
                .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
                .await;

            match self.client.get(url.as_str()).send().await {
                Ok(response) => {
                    let status = response.status();
                    let transient =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if !transient {
                        tracing::debug!("Fetched {} ({})", url, status);
                        return Ok(response);
                    }

                    if retries < self.max_retries {
                        retries += 1;
                        let delay = self.backoff_delay(retries);
                        tracing::warn!(
                            "HTTP {} from {} (attempt {}/{}). Backing off for {}ms",
                            status.as_u16(),
                            url,
                            retries,
                            self.max_retries,
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                        DownloadError::RateLimitExceeded
                    } else {
                        DownloadError::ServerError {
                            status: status.as_u16(),
                        }
                    });
                }
                Err(e) if retries < self.max_retries => {
                    retries += 1;
                    let delay = self.backoff_delay(retries);
                    tracing::warn!(
                        "Request to {} failed (attempt {}/{}): {}. Retrying in {}ms",
                        url,
                        retries,
                        self.max_retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        "Request to {} failed after {} retries: {}",
                        url,
                        self.max_retries,
                        e
                    );
                    return Err(DownloadError::MaxRetriesExceeded {
                        max_retries: self.max_retries,
                    });
                }
            }
        }
    }

    /// Fetches a successful response body as text
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::ServerError` for any non-success status
    pub async fn get_text(&self, url: &Url) -> DownloadResult<String> {
        let response = self.get_response(url).await?;
        if !response.status().is_success() {
            return Err(DownloadError::ServerError {
                status: response.status().as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}
