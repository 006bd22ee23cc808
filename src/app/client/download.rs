//! File download operations with atomic writes and streaming
//!
//! Response bodies are streamed chunk by chunk; after every chunk the cumulative
//! number of bytes written is pushed to the progress sink. Files are written to a
//! temporary sibling and renamed into place once complete, so an interrupted
//! download never leaves a truncated file under the final name.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::app::progress::ProgressSink;
use crate::constants::{files, limits};
use crate::errors::{DownloadError, DownloadResult};

/// Streaming downloader on top of the retrying HTTP handler
pub struct Downloader<'a> {
    http_handler: &'a HttpHandler,
    dry_run: bool,
}

impl<'a> Downloader<'a> {
    /// Creates a new Downloader with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler) -> Self {
        Self {
            http_handler,
            dry_run: false,
        }
    }

    /// In dry-run mode `fetch` neither touches the network nor the disk
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Downloads `url` to `destination`, returning the number of bytes written
    ///
    /// `expected_size` is only used as the progress total; the server's
    /// content length is used when it is absent.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails after retries or answers a non-success status
    /// - Writing or renaming the file fails
    pub async fn fetch(
        &self,
        url: &str,
        expected_size: Option<u64>,
        destination: &Path,
        progress: &dyn ProgressSink,
    ) -> DownloadResult<u64> {
        if self.dry_run {
            tracing::info!("[dry-run] would download {} to {}", url, destination.display());
            return Ok(0);
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = temp_path_for(destination);
        let title = destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());

        let result = self
            .stream_to_file(url, expected_size, &temp_path, &title, progress)
            .await;
        progress.finish();

        match result {
            Ok(written) => {
                tokio::fs::rename(&temp_path, destination)
                    .await
                    .map_err(|_e| DownloadError::AtomicOperationFailed {
                        temp_path: temp_path.clone(),
                        final_path: destination.to_path_buf(),
                    })?;
                tracing::info!(
                    "Downloaded {} ({} bytes)",
                    destination.display(),
                    written
                );
                Ok(written)
            }
            Err(e) => {
                // Clean up temp file on failure
                if temp_path.exists() {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                }
                tracing::error!("Download of {} failed: {}", url, e);
                Err(e)
            }
        }
    }

    async fn stream_to_file(
        &self,
        url: &str,
        expected_size: Option<u64>,
        temp_path: &Path,
        title: &str,
        progress: &dyn ProgressSink,
    ) -> DownloadResult<u64> {
        let response = self.successful_response(url).await?;
        progress.start(title, expected_size.or(response.content_length()));

        let mut file = File::create(temp_path).await?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            progress.update(written);
        }
        file.flush().await?;

        Ok(written)
    }

    /// Download content into memory
    ///
    /// Always performs the request, dry-run or not: the publication archive is
    /// needed to work out what a real run would download.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the HTTP request fails or content cannot be read
    pub async fn fetch_bytes(
        &self,
        url: &str,
        expected_size: Option<u64>,
        progress: &dyn ProgressSink,
    ) -> DownloadResult<Vec<u8>> {
        let response = self.successful_response(url).await?;
        let total = expected_size.or(response.content_length());
        progress.start(url_file_name(url).unwrap_or(url), total);

        // Advertised sizes come from remote JSON; only a bounded hint is reserved
        let hint = total.map(|t| t.min(limits::MAX_PREALLOC_BYTES)).unwrap_or(0);
        let mut content = Vec::with_capacity(hint as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => {
                    content.extend_from_slice(&chunk);
                    progress.update(content.len() as u64);
                }
                Err(e) => {
                    progress.finish();
                    return Err(e.into());
                }
            }
        }
        progress.finish();

        tracing::debug!("Fetched {} bytes from {}", content.len(), url);
        Ok(content)
    }

    async fn successful_response(&self, url: &str) -> DownloadResult<reqwest::Response> {
        let parsed_url = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            error: e.to_string(),
        })?;

        let response = self.http_handler.get_response(&parsed_url).await?;
        if !response.status().is_success() {
            return Err(DownloadError::ServerError {
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

/// Sibling path a download is written to before being renamed into place
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(files::TEMP_FILE_SUFFIX);
    destination.with_file_name(name)
}

/// Last path segment of a URL, if any
pub fn url_file_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    path.rsplit('/').next().filter(|name| !name.is_empty())
}
