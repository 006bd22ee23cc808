//! Core application logic for Meeting Media
//!
//! This module contains the fetch pipeline: publication issue arithmetic, archive
//! extraction, the metadata database, media lookups, the HTTP client and
//! downloader, and the orchestration tying them together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use meeting_media::app::{
//!     issue_for, LocatorConfig, MediaClient, MediaLocator, NoopProgress, PublicationKind,
//! };
//! use chrono::NaiveDate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MediaClient::new()?;
//! let locator = MediaLocator::new(&client, LocatorConfig::default());
//!
//! // Which workbook covers the week of 2024-03-04?
//! let week = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//! let issue = issue_for(week, PublicationKind::Midweek);
//! let archive = locator
//!     .publication_archive(PublicationKind::Midweek, issue, "E")
//!     .await?;
//!
//! let bytes = client
//!     .downloader(false)
//!     .fetch_bytes(&archive.url, Some(archive.size), &NoopProgress)
//!     .await?;
//! println!("{} is {} bytes", archive.file_name, bytes.len());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod client;
pub mod coordinator;
pub mod locator;
pub mod metadata;
pub mod models;
pub mod output;
pub mod progress;
pub mod publication;

// Re-export main public API
pub use archive::{extract, extract_entry, extract_named, EntryPattern, PublicationArchive};
pub use client::{ClientConfig, Downloader, HttpHandler, MediaClient};
pub use coordinator::{FetchStats, MeetingFetcher, Session};
pub use locator::{LocatorConfig, MediaLocator, ResolvedAsset};
pub use metadata::MetadataStore;
pub use models::{
    weekend_songs, Asset, Document, MeetingData, MeetingKind, Resolution, VideoAddress, VideoRef,
};
pub use output::build_playlist;
pub use progress::{NoopProgress, ProgressSink, RecordingProgress};
pub use publication::{issue_for, week_of, Issue, PublicationKind};
