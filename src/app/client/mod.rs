//! HTTP client for the media APIs and content delivery network
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: Core HTTP operations with rate limiting and retries
//! - `download`: Streaming downloads with atomic writes and progress

use url::Url;

use crate::errors::DownloadResult;

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;
pub use download::Downloader;
pub use http::HttpHandler;

/// Shared HTTP client for one run
///
/// Owns the rate-limited, retrying [`HttpHandler`]; lookups and downloads borrow it.
#[derive(Debug)]
pub struct MediaClient {
    http_handler: HttpHandler,
}

impl MediaClient {
    /// Creates a client with default settings
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::ClientSetup` if HTTP client creation fails
    pub fn new() -> DownloadResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::ClientSetup` if HTTP client creation fails
    pub fn with_config(config: ClientConfig) -> DownloadResult<Self> {
        let http_handler = HttpHandler::new(&config)?;
        tracing::debug!(
            "Created media client ({} req/s, {} retries)",
            config.rate_limit_rps,
            config.max_retries
        );
        Ok(Self { http_handler })
    }

    /// Fetches the HTTP response with rate limiting and retry logic
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the HTTP request fails after retries
    pub async fn get_response(&self, url: &Url) -> DownloadResult<reqwest::Response> {
        self.http_handler.get_response(url).await
    }

    /// Fetches a successful response body as text
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the request fails or the status is not a success
    pub async fn get_text(&self, url: &Url) -> DownloadResult<String> {
        self.http_handler.get_text(url).await
    }

    /// Downloader borrowing this client
    pub fn downloader(&self, dry_run: bool) -> Downloader<'_> {
        Downloader::new(&self.http_handler).with_dry_run(dry_run)
    }

    pub fn http_handler(&self) -> &HttpHandler {
        &self.http_handler
    }
}
