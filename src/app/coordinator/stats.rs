//! Outcome of a fetch

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::app::models::MeetingKind;

/// What a fetch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchStats {
    pub kind: MeetingKind,
    pub week: NaiveDate,
    pub songs: usize,
    pub videos: usize,
    pub pictures: usize,
    /// Bytes written by downloads; zero in dry-run
    pub bytes_downloaded: u64,
    pub playlist: Option<PathBuf>,
    pub dry_run: bool,
}

impl FetchStats {
    pub fn new(kind: MeetingKind, week: NaiveDate, dry_run: bool) -> Self {
        Self {
            kind,
            week,
            songs: 0,
            videos: 0,
            pictures: 0,
            bytes_downloaded: 0,
            playlist: None,
            dry_run,
        }
    }

    /// Total number of files fetched or written
    pub fn files(&self) -> usize {
        self.songs + self.videos + self.pictures + usize::from(self.playlist.is_some())
    }
}

impl fmt::Display for FetchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} meeting {}: {} song(s), {} video(s), {} picture(s), {:.1} MB",
            self.kind,
            self.week,
            self.songs,
            self.videos,
            self.pictures,
            self.bytes_downloaded as f64 / 1_048_576.0
        )?;
        if self.dry_run {
            write!(f, " (dry run)")?;
        }
        Ok(())
    }
}
