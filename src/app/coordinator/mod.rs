//! Meeting fetch orchestration
//!
//! This module sequences the pipeline for one meeting: locate and fetch the
//! publication archive for the week, query its metadata database, resolve every
//! song and video, download them, write pictures and the playlist.
//!
//! # Key Features
//!
//! - **Strictly sequential**: every stage is awaited in turn, one request at a time
//! - **Fail fast**: the first error aborts the run; files already written stay
//! - **Dry run**: everything is resolved, nothing is written
//! - **Scoped temporaries**: the extracted database lives only while it is queried
//!
//! # Architecture
//!
//! - [`session`] - Run settings and the media collected for the meeting
//! - [`stats`] - Summary of what a run produced
//!
//! # Examples
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use meeting_media::app::{
//!     LocatorConfig, MediaClient, MeetingFetcher, MeetingKind, NoopProgress, Session,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MediaClient::new()?;
//! let progress = NoopProgress;
//! let fetcher = MeetingFetcher::new(&client, LocatorConfig::default(), &progress);
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
//! let mut session = Session::new(date, "meeting-media").with_playlist(true);
//!
//! let stats = fetcher.fetch(&mut session, MeetingKind::Midweek).await?;
//! println!("{}", stats);
//! # Ok(())
//! # }
//! ```

pub mod session;
pub mod stats;

#[cfg(test)]
pub mod tests;

use tracing::{debug, error, info, warn};

use crate::app::archive::PublicationArchive;
use crate::app::client::MediaClient;
use crate::app::locator::{LocatorConfig, MediaLocator};
use crate::app::metadata::MetadataStore;
use crate::app::models::{weekend_songs, Asset, Document, MeetingData, MeetingKind};
use crate::app::output;
use crate::app::progress::ProgressSink;
use crate::app::publication::{issue_for, PublicationKind};
use crate::constants::files;
use crate::errors::{ConfigError, MetadataError, Result};

pub use session::Session;
pub use stats::FetchStats;

/// Runs the fetch pipeline for a session
pub struct MeetingFetcher<'a> {
    client: &'a MediaClient,
    locator: MediaLocator<'a>,
    progress: &'a dyn ProgressSink,
}

impl<'a> MeetingFetcher<'a> {
    pub fn new(
        client: &'a MediaClient,
        locator_config: LocatorConfig,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            client,
            locator: MediaLocator::new(client, locator_config),
            progress,
        }
    }

    /// Fetch everything for `kind` into the session's save location
    ///
    /// With `auto_fetch` the session's songs, pictures (and, for the midweek
    /// meeting, videos) are replaced by what the publication lists for the week.
    /// Resolved video file names are recorded on the session's videos.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage. The error is logged before it is
    /// returned.
    pub async fn fetch(&self, session: &mut Session, kind: MeetingKind) -> Result<FetchStats> {
        info!(
            "Fetching {} meeting media for week of {}{}",
            kind,
            session.week,
            if session.dry_run { " (dry run)" } else { "" }
        );

        match self.run(session, kind).await {
            Ok(stats) => {
                info!("Finished {}", stats);
                Ok(stats)
            }
            Err(e) => {
                error!("{} meeting fetch failed [{}]: {}", kind, e.category(), e);
                Err(e)
            }
        }
    }

    async fn run(&self, session: &mut Session, kind: MeetingKind) -> Result<FetchStats> {
        let mut stats = FetchStats::new(kind, session.week, session.dry_run);
        let save = session.save_location.clone();
        let downloader = self.client.downloader(session.dry_run);

        if session.dry_run {
            if session.purge_dir {
                info!("[dry-run] would empty {}", save.display());
            }
        } else {
            if session.purge_dir {
                info!("Deleting all files in {}", save.display());
                match output::purge_directory(&save).await {
                    Ok(removed) => debug!("Removed {} entries", removed),
                    Err(e) => warn!("Could not empty {}: {}", save.display(), e),
                }
            }
            output::ensure_directory(&save).await?;
        }

        if session.auto_fetch {
            let data = match kind {
                MeetingKind::Midweek => self.midweek_data(session).await?,
                MeetingKind::Weekend => self.weekend_data(session).await?,
            };
            session.songs = data.songs;
            if kind == MeetingKind::Midweek {
                session.videos = data.videos;
            }
            session.pictures = data.pictures;
        }

        for song in &session.songs {
            info!("Downloading song {}", song);
            let asset = self
                .locator
                .resolve_song(song, &session.language, &session.resolution)
                .await?;
            stats.bytes_downloaded += downloader
                .fetch(&asset.url, Some(asset.size), &save.join(&asset.file_name), self.progress)
                .await?;
            stats.songs += 1;
        }

        if session.fetch_other_media {
            for video in session.videos.iter_mut() {
                let asset = self
                    .locator
                    .resolve_video(video, &session.language, &session.resolution)
                    .await?;
                info!("Downloading {} as {}", video, asset.file_name);
                stats.bytes_downloaded += downloader
                    .fetch(&asset.url, Some(asset.size), &save.join(&asset.file_name), self.progress)
                    .await?;
                video.name = asset.file_name;
                stats.videos += 1;
            }

            if session.dry_run {
                for picture in &session.pictures {
                    info!("[dry-run] would save picture {}", picture.name);
                }
            } else {
                output::write_pictures(&save, &session.pictures).await?;
            }
            stats.pictures = session.pictures.len();
        }

        if session.create_playlist {
            if session.dry_run {
                info!(
                    "[dry-run] would write {}",
                    save.join(files::PLAYLIST_FILE_NAME).display()
                );
            } else {
                let path = output::write_playlist(
                    &save,
                    &session.songs,
                    &session.videos,
                    &session.pictures,
                )
                .await?;
                stats.playlist = Some(path);
            }
        }

        Ok(stats)
    }

    /// Songs, pictures and videos listed by the workbook for the session's week
    ///
    /// # Errors
    ///
    /// `MetadataError::NoDocumentForDate` when the workbook has nothing for the week
    pub async fn midweek_data(&self, session: &Session) -> Result<MeetingData> {
        let kind = PublicationKind::Midweek;
        let archive = self.fetch_archive(kind, session).await?;
        let store = MetadataStore::open(&archive.extract(kind.database_pattern())?).await?;

        let result = self.query_midweek(&store, &archive, session).await;
        let closed = store.close().await;
        let data = result?;
        closed?;
        Ok(data)
    }

    async fn query_midweek(
        &self,
        store: &MetadataStore,
        archive: &PublicationArchive,
        session: &Session,
    ) -> Result<MeetingData> {
        let docs: Vec<_> = store
            .documents_for_midweek()
            .await?
            .into_iter()
            .filter(|doc| doc.date == session.week)
            .collect();
        debug!("documents for {}: {:?}", session.week, docs);

        let Some(first) = docs.first() else {
            return Err(MetadataError::NoDocumentForDate {
                date: session.week.to_string(),
            }
            .into());
        };

        let mut data = MeetingData {
            date: first.date.format(files::DATE_FORMAT).to_string(),
            songs: store.songs_for_midweek(&docs).await?,
            ..Default::default()
        };

        if session.fetch_other_media {
            let names = store.image_names(&docs).await?;
            data.pictures = extract_pictures(archive, &names)?;

            let videos = store.videos_for_midweek(&docs).await?;
            let total = videos.len();
            data.videos = videos
                .into_iter()
                .filter(|video| {
                    let allowed = session.allows_publication(video.address.key_symbol());
                    if !allowed {
                        info!("Skipping {} (publication not linked)", video);
                    }
                    allowed
                })
                .collect();
            debug!("kept {} of {} video(s)", data.videos.len(), total);
        }

        Ok(data)
    }

    /// Songs and pictures for the weekend meeting of the session's week
    ///
    /// Songs are the first manually supplied song followed by the study article's
    /// opening and closing songs.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingField` without a manual song, and
    /// `MetadataError::NoDocumentForDate` when no study article is dated for the week
    pub async fn weekend_data(&self, session: &Session) -> Result<MeetingData> {
        let manual = session
            .songs
            .first()
            .cloned()
            .ok_or_else(|| ConfigError::MissingField {
                field: "song".to_string(),
            })?;

        let kind = PublicationKind::Weekly;
        let archive = self.fetch_archive(kind, session).await?;
        let store = MetadataStore::open(&archive.extract(kind.database_pattern())?).await?;

        let result = self.query_weekend(&store, &archive, session, &manual).await;
        let closed = store.close().await;
        let data = result?;
        closed?;
        Ok(data)
    }

    async fn query_weekend(
        &self,
        store: &MetadataStore,
        archive: &PublicationArchive,
        session: &Session,
        manual: &str,
    ) -> Result<MeetingData> {
        let (ids, dates) = store.documents_for_weekend().await?;
        debug!("study articles {:?} dated {:?}", ids, dates);

        let Some(index) = dates.iter().position(|date| *date == session.week) else {
            return Err(MetadataError::NoDocumentForDate {
                date: session.week.to_string(),
            }
            .into());
        };

        let resolved = store.songs_for_weekend(session.week).await?;
        let mut data = MeetingData {
            date: session.week.format(files::DATE_FORMAT).to_string(),
            songs: weekend_songs(manual, resolved),
            ..Default::default()
        };

        if session.fetch_other_media {
            let article = Document {
                id: ids[index],
                date: dates[index],
            };
            let names = store.image_names(&[article]).await?;
            data.pictures = extract_pictures(archive, &names)?;
        }

        Ok(data)
    }

    async fn fetch_archive(
        &self,
        kind: PublicationKind,
        session: &Session,
    ) -> Result<PublicationArchive> {
        let issue = issue_for(session.week, kind);
        info!("Using {} issue {}", kind.symbol(), issue);

        let asset = self
            .locator
            .publication_archive(kind, issue, &session.language)
            .await?;
        let bytes = self
            .client
            .downloader(session.dry_run)
            .fetch_bytes(&asset.url, Some(asset.size), self.progress)
            .await?;

        Ok(PublicationArchive::open(&bytes)?)
    }
}

fn extract_pictures(archive: &PublicationArchive, names: &[String]) -> Result<Vec<Asset>> {
    names
        .iter()
        .map(|name| -> Result<Asset> {
            Ok(Asset {
                name: name.clone(),
                payload: archive.extract_named(name)?,
            })
        })
        .collect()
}
