//! Run context for one fetch
//!
//! A `Session` carries the user's settings and collects the songs, pictures and
//! videos gathered by the pipeline. The caller owns it and passes it by `&mut` to
//! [`MeetingFetcher::fetch`](super::MeetingFetcher::fetch); the front end calls
//! [`Session::reset_collected`] between runs.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::app::models::{Asset, Resolution, VideoRef};
use crate::app::publication::week_of;
use crate::constants::config as defaults;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Monday of the target week
    pub week: NaiveDate,
    /// MEPS language symbol, e.g. "E"
    pub language: String,
    /// Resolution label, e.g. "720p"
    pub resolution: String,
    pub save_location: PathBuf,
    /// Also fetch videos and pictures
    pub fetch_other_media: bool,
    /// Read songs and media from the publication instead of the manual list
    pub auto_fetch: bool,
    pub create_playlist: bool,
    /// Empty the save location before fetching
    pub purge_dir: bool,
    /// Resolve everything but write nothing
    pub dry_run: bool,
    /// When non-empty, only videos of these publications are fetched
    pub pub_symbols: Vec<String>,
    pub songs: Vec<String>,
    pub pictures: Vec<Asset>,
    pub videos: Vec<VideoRef>,
}

impl Session {
    /// New session for the week containing `date`
    pub fn new(date: NaiveDate, save_location: impl Into<PathBuf>) -> Self {
        Self {
            week: week_of(date),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            resolution: Resolution::P720.label().to_string(),
            save_location: save_location.into(),
            fetch_other_media: false,
            auto_fetch: true,
            create_playlist: false,
            purge_dir: false,
            dry_run: false,
            pub_symbols: Vec::new(),
            songs: Vec::new(),
            pictures: Vec::new(),
            videos: Vec::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = resolution.into();
        self
    }

    pub fn with_other_media(mut self, enabled: bool) -> Self {
        self.fetch_other_media = enabled;
        self
    }

    pub fn with_auto_fetch(mut self, enabled: bool) -> Self {
        self.auto_fetch = enabled;
        self
    }

    pub fn with_playlist(mut self, enabled: bool) -> Self {
        self.create_playlist = enabled;
        self
    }

    pub fn with_purge(mut self, enabled: bool) -> Self {
        self.purge_dir = enabled;
        self
    }

    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn with_pub_symbols(mut self, symbols: Vec<String>) -> Self {
        self.pub_symbols = symbols;
        self
    }

    pub fn with_songs(mut self, songs: Vec<String>) -> Self {
        self.songs = songs;
        self
    }

    /// Whether a video of publication `key_symbol` passes the linked-symbol filter
    ///
    /// Videos without a symbol (addressed by document id) always pass.
    pub fn allows_publication(&self, key_symbol: Option<&str>) -> bool {
        match key_symbol {
            Some(symbol) if !self.pub_symbols.is_empty() => {
                self.pub_symbols.iter().any(|s| s == symbol)
            }
            _ => true,
        }
    }

    /// Forget songs, pictures and videos collected by a previous run
    pub fn reset_collected(&mut self) {
        self.songs.clear();
        self.pictures.clear();
        self.videos.clear();
    }
}
