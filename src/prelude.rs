//! Prelude module for Meeting Media Library
//!
//! Re-exports the items needed for a typical fetch with a single
//! `use meeting_media::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use meeting_media::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = MediaClient::new()?;
//!     let progress = NoopProgress;
//!     let fetcher = MeetingFetcher::new(&client, LocatorConfig::default(), &progress);
//!
//!     let date = chrono::Local::now().date_naive();
//!     let mut session = Session::new(date, "meeting-media").with_songs(vec!["10".into()]);
//!     fetcher.fetch(&mut session, MeetingKind::Weekend).await?;
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, ErrorKind, Result};

// Pipeline components
pub use crate::app::{
    ClientConfig, FetchStats, LocatorConfig, MediaClient, MediaLocator, MeetingFetcher,
    MeetingKind, NoopProgress, ProgressSink, Resolution, Session, VideoRef,
};

// Configuration
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_RATE_LIMIT_RPS, PLAYLIST_FILE_NAME, USER_AGENT};

pub use std::path::{Path, PathBuf};

pub use tokio;
