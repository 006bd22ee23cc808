//! Application constants for Meeting Media
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("Meeting-Media/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout (covers whole video downloads)
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 4;
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for API and CDN requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 10;

    /// Maximum retry attempts for failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 500;

    /// Upper bound accepted for `client.max_retries`
    pub const MAX_RETRIES_LIMIT: u32 = 10;

    /// Longest wait between two attempts
    pub const MAX_RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(60);

    /// Most memory reserved up front from an advertised size (bytes)
    pub const MAX_PREALLOC_BYTES: u64 = 64 * 1024 * 1024;
}

/// Remote media endpoints
pub mod api {
    /// Catalog lookup returning publication archives and MP4 variants
    pub const MEDIA_LINKS_URL: &str = "https://pubmedia.jw-api.org/GETPUBMEDIALINKS";

    /// Dated-issue video lookup; `{lang}/pub-{symbol}_{issue}_{track}_VIDEO` is appended
    pub const MEDIA_ITEMS_URL: &str = "https://b.jw-cdn.org/apis/mediator/v1/media-items";

    /// Publication symbol of the song book videos
    pub const SONGBOOK_SYMBOL: &str = "sjjm";

    /// File format requested for publication archives
    pub const ARCHIVE_FORMAT: &str = "JWPUB";

    /// File format requested for videos
    pub const VIDEO_FORMAT: &str = "mp4";
}

/// Publication archive layout
pub mod archive {
    /// Name of the nested archive inside every publication archive
    pub const CONTENTS_ENTRY: &str = "contents";

    /// File name given to the materialised metadata database
    pub const DATABASE_FILE_NAME: &str = "publication.db";

    /// Prefix of the scoped extraction directory
    pub const TEMP_DIR_PREFIX: &str = "jwpub_fetcher_";
}

/// Publication metadata schema values
pub mod schema {
    /// `Document.Class` of weekly study articles
    pub const STUDY_ARTICLE_CLASS: i64 = 40;

    /// `Multimedia.CategoryType` of cover art, never shown at meetings
    pub const COVER_IMAGE_CATEGORY: i64 = 9;

    /// `Multimedia.MimeType` of videos
    pub const VIDEO_MIME_TYPE: &str = "video/mp4";
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Playlist file written into the save location
    pub const PLAYLIST_FILE_NAME: &str = "playlist.m3u";

    /// Extension of downloaded song videos
    pub const SONG_EXTENSION: &str = "mp4";

    /// Date format used for input and `MeetingData::date`
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file
    pub const LOCAL_CONFIG_FILE: &str = "meeting-media.toml";

    /// Directory under the user configuration directory
    pub const CONFIG_DIR_NAME: &str = "meeting-media";

    /// File name inside `CONFIG_DIR_NAME`
    pub const CONFIG_FILE_NAME: &str = "config.toml";

    /// Default MEPS language symbol
    pub const DEFAULT_LANGUAGE: &str = "E";

    /// Default save directory name under the user's video directory
    pub const DEFAULT_SAVE_DIR: &str = "meeting-media";
}

// Re-export commonly used constants for convenience
pub use files::{PLAYLIST_FILE_NAME, TEMP_FILE_SUFFIX};
pub use http::USER_AGENT;
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_RETRIES, RETRY_BASE_DELAY_MS};
