//! Error types for Meeting Media
//!
//! Each pipeline stage has its own error enum. They all fold into [`AppError`],
//! which can report the broad [`ErrorKind`] of a failure (network, not found,
//! parse, I/O, configuration) so the front end can decide how to present it.

use std::path::PathBuf;

use thiserror::Error;

/// Broad classification shared by every error in the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request or transport failure after retries were exhausted
    Network,
    /// No document for the target date, no archive entry for a pattern, empty API result
    NotFound,
    /// Malformed JSON, archive structure or database
    Parse,
    /// Local file read or write failure
    Io,
    /// Invalid or missing settings
    Config,
}

/// Archive extraction errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// No entry in the archive matched the pattern
    #[error("No archive entry matches '{pattern}'")]
    EntryNotFound { pattern: String },

    /// The archive (outer or nested) could not be read
    #[error("Malformed archive")]
    Malformed(#[from] zip::result::ZipError),

    /// The entry pattern could not be compiled
    #[error("Invalid entry pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// An entry's data failed to decompress or its checksum did not match
    #[error("Corrupt archive entry '{entry}'")]
    Corrupt {
        entry: String,
        #[source]
        source: std::io::Error,
    },
}

/// Publication metadata database errors
#[derive(Error, Debug)]
pub enum MetadataError {
    /// No document is dated for the requested week
    #[error("No publication document found for week of {date}")]
    NoDocumentForDate { date: String },

    /// The study article did not reference the expected opening and closing songs
    #[error("Expected 2 songs for {date}, found {found}")]
    MissingSongs { date: String, found: usize },

    /// A date offset column did not hold a YYYYMMDD value
    #[error("Invalid date offset in publication database: {value}")]
    InvalidDate { value: i64 },

    /// A multimedia row could not be mapped to a video address
    #[error("Unaddressable video: {reason}")]
    InvalidVideo { reason: String },

    /// Query or connection failure
    #[error("Publication database error")]
    Database(#[from] sqlx::Error),

    /// Materialising the database to disk failed
    #[error("Failed to materialise publication database")]
    Io(#[from] std::io::Error),
}

/// Media lookup errors
#[derive(Error, Debug)]
pub enum MediaError {
    /// HTTP transport failure
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Retries exhausted
    #[error("Maximum retry attempts ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    /// Lookup URL could not be built
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Response body was not the expected JSON shape
    #[error("Malformed media API response")]
    Json(#[from] serde_json::Error),

    /// Response was well-formed but held nothing usable
    #[error("No media available: {reason}")]
    NoMedia { reason: String },

    /// The publication is not (yet) available for that issue
    #[error("Publication '{symbol}' is not available for issue {issue}")]
    PublicationUnavailable { symbol: String, issue: String },

    /// Wraps a failure with the song, video or publication being resolved
    #[error("Failed to resolve {subject}: {source}")]
    Subject {
        subject: String,
        #[source]
        source: Box<MediaError>,
    },
}

impl MediaError {
    /// Attach the subject being resolved to an error
    pub fn for_subject(self, subject: impl Into<String>) -> Self {
        Self::Subject {
            subject: subject.into(),
            source: Box::new(self),
        }
    }

    /// Broad kind of this error, looking through subject wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_)
            | Self::ServerError { .. }
            | Self::MaxRetriesExceeded { .. }
            | Self::InvalidUrl { .. } => ErrorKind::Network,
            Self::Json(_) => ErrorKind::Parse,
            Self::NoMedia { .. } | Self::PublicationUnavailable { .. } => ErrorKind::NotFound,
            Self::Subject { source, .. } => source.kind(),
        }
    }
}

/// Download and HTTP client errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error")]
    Io(#[from] std::io::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Server returned error status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded for download")]
    MaxRetriesExceeded { max_retries: u32 },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {reason}")]
    ClientSetup { reason: String },
}

impl DownloadError {
    /// Broad kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::AtomicOperationFailed { .. } => ErrorKind::Io,
            Self::ClientSetup { .. } => ErrorKind::Config,
            _ => ErrorKind::Network,
        }
    }
}

impl From<DownloadError> for MediaError {
    fn from(error: DownloadError) -> Self {
        match error {
            DownloadError::Http(e) => MediaError::Http(e),
            DownloadError::InvalidUrl { url, error } => MediaError::InvalidUrl { url, error },
            DownloadError::ServerError { status } => MediaError::ServerError { status },
            DownloadError::RateLimitExceeded => MediaError::ServerError { status: 429 },
            DownloadError::MaxRetriesExceeded { max_retries } => {
                MediaError::MaxRetriesExceeded { max_retries }
            }
            other => MediaError::NoMedia {
                reason: other.to_string(),
            },
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Missing required configuration field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// I/O error reading or writing the configuration file
    #[error("Configuration file I/O error: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Archive extraction error
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Metadata database error
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Media lookup error
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Map the error onto its broad kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Archive(ArchiveError::EntryNotFound { .. }) => ErrorKind::NotFound,
            AppError::Archive(_) => ErrorKind::Parse,

            AppError::Metadata(MetadataError::NoDocumentForDate { .. })
            | AppError::Metadata(MetadataError::MissingSongs { .. }) => ErrorKind::NotFound,
            AppError::Metadata(MetadataError::Io(_)) => ErrorKind::Io,
            AppError::Metadata(_) => ErrorKind::Parse,

            AppError::Media(e) => e.kind(),
            AppError::Download(e) => e.kind(),
            AppError::Config(_) => ErrorKind::Config,
            AppError::Io(_) => ErrorKind::Io,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Archive(_) => "archive",
            AppError::Metadata(_) => "metadata",
            AppError::Media(_) => "media",
            AppError::Download(_) => "download",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Archive result type alias
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// Metadata result type alias
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

/// Media lookup result type alias
pub type MediaResult<T> = std::result::Result<T, MediaError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
