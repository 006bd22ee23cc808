//! Publication metadata database
//!
//! Every publication archive carries a SQLite database describing its documents and
//! the multimedia they reference. SQLite needs a real file, so [`MetadataStore`]
//! writes the extracted bytes into a scoped temporary directory and opens a
//! read-only connection to it. The directory lives exactly as long as the store:
//! [`MetadataStore::close`] releases both explicitly, and dropping the store on an
//! error path removes the directory as well.
//!
//! Schema subset used here:
//!
//! ```text
//! Document(DocumentId, Class, ...)
//! DatedText(DocumentId, FirstDateOffset /* YYYYMMDD */, ...)
//! Multimedia(MultimediaId, KeySymbol, Track, IssueTagNumber, MepsDocumentId,
//!            MimeType, FilePath, CategoryType, ...)
//! DocumentMultimedia(DocumentId, MultimediaId, BeginParagraphOrdinal, ...)
//! ```

pub mod queries;

#[cfg(test)]
pub mod tests;

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tempfile::TempDir;
use tracing::debug;

use crate::app::models::{Document, VideoRef};
use crate::constants::archive::{DATABASE_FILE_NAME, TEMP_DIR_PREFIX};
use crate::constants::{api, schema};
use crate::errors::{MetadataError, MetadataResult};

/// Read-only handle on an extracted publication database
pub struct MetadataStore {
    // Declared before `dir` so the connection closes before the directory goes
    pool: SqlitePool,
    dir: TempDir,
}

impl MetadataStore {
    /// Materialise `db_bytes` in a fresh temporary directory and open it read-only
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::Io` if the file cannot be written and
    /// `MetadataError::Database` if SQLite refuses to open it
    pub async fn open(db_bytes: &[u8]) -> MetadataResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir()?;
        let path = dir.path().join(DATABASE_FILE_NAME);
        tokio::fs::write(&path, db_bytes).await?;

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        debug!(
            "opened publication database at {} ({} bytes)",
            path.display(),
            db_bytes.len()
        );
        Ok(Self { pool, dir })
    }

    /// Scoped directory holding the materialised database
    pub fn directory(&self) -> &Path {
        self.dir.path()
    }

    /// Close the connection and remove the temporary directory
    pub async fn close(self) -> MetadataResult<()> {
        let Self { pool, dir } = self;
        pool.close().await;
        dir.close()?;
        Ok(())
    }

    /// Every dated workbook document, ordered by id
    pub async fn documents_for_midweek(&self) -> MetadataResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, (i64, i64)>(queries::MIDWEEK_DOCUMENTS)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|(id, offset)| {
                Ok(Document {
                    id,
                    date: parse_date_offset(offset)?,
                })
            })
            .collect()
    }

    /// Study article ids and their dates as parallel sequences, ordered by id
    pub async fn documents_for_weekend(&self) -> MetadataResult<(Vec<i64>, Vec<NaiveDate>)> {
        let rows = sqlx::query_as::<_, (i64, i64)>(queries::WEEKEND_DOCUMENTS)
            .bind(schema::STUDY_ARTICLE_CLASS)
            .fetch_all(&self.pool)
            .await?;

        let mut ids = Vec::with_capacity(rows.len());
        let mut dates = Vec::with_capacity(rows.len());
        for (id, offset) in rows {
            ids.push(id);
            dates.push(parse_date_offset(offset)?);
        }
        Ok((ids, dates))
    }

    /// Song numbers referenced by `documents`, in document then paragraph order
    pub async fn songs_for_midweek(&self, documents: &[Document]) -> MetadataResult<Vec<String>> {
        let mut songs = Vec::new();
        for doc in documents {
            let tracks = sqlx::query_scalar::<_, i64>(queries::DOCUMENT_SONGS)
                .bind(doc.id)
                .bind(api::SONGBOOK_SYMBOL)
                .fetch_all(&self.pool)
                .await?;
            songs.extend(tracks.into_iter().map(|t| t.to_string()));
        }
        debug!("songs for {} document(s): {:?}", documents.len(), songs);
        Ok(songs)
    }

    /// Opening and closing song of the study article dated `date`
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::NoDocumentForDate` if no article is dated `date` and
    /// `MetadataError::MissingSongs` if the article references fewer than two songs
    pub async fn songs_for_weekend(&self, date: NaiveDate) -> MetadataResult<[String; 2]> {
        let offset = date_offset(date);

        let articles = sqlx::query_scalar::<_, i64>(queries::ARTICLES_FOR_DATE)
            .bind(offset)
            .bind(schema::STUDY_ARTICLE_CLASS)
            .fetch_one(&self.pool)
            .await?;
        if articles == 0 {
            return Err(MetadataError::NoDocumentForDate {
                date: date.to_string(),
            });
        }

        let tracks = sqlx::query_scalar::<_, i64>(queries::ARTICLE_SONGS)
            .bind(offset)
            .bind(schema::STUDY_ARTICLE_CLASS)
            .bind(api::SONGBOOK_SYMBOL)
            .fetch_all(&self.pool)
            .await?;

        match (tracks.first(), tracks.last()) {
            (Some(opening), Some(closing)) if tracks.len() >= 2 => {
                Ok([opening.to_string(), closing.to_string()])
            }
            _ => Err(MetadataError::MissingSongs {
                date: date.to_string(),
                found: tracks.len(),
            }),
        }
    }

    /// Archive entry names of the images shown with `documents`
    ///
    /// Cover art is skipped; an image used by several documents is listed once.
    pub async fn image_names(&self, documents: &[Document]) -> MetadataResult<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for doc in documents {
            let paths = sqlx::query_scalar::<_, String>(queries::DOCUMENT_IMAGES)
                .bind(doc.id)
                .bind(schema::COVER_IMAGE_CATEGORY)
                .fetch_all(&self.pool)
                .await?;
            for path in paths {
                if !names.contains(&path) {
                    names.push(path);
                }
            }
        }
        debug!("images for {} document(s): {:?}", documents.len(), names);
        Ok(names)
    }

    /// Videos (other than songs) referenced by `documents`
    pub async fn videos_for_midweek(&self, documents: &[Document]) -> MetadataResult<Vec<VideoRef>> {
        let mut videos = Vec::new();
        for doc in documents {
            let rows =
                sqlx::query_as::<_, (Option<String>, Option<i64>, i64, Option<i64>)>(
                    queries::DOCUMENT_VIDEOS,
                )
                .bind(doc.id)
                .bind(schema::VIDEO_MIME_TYPE)
                .bind(api::SONGBOOK_SYMBOL)
                .fetch_all(&self.pool)
                .await?;

            for (key_symbol, track, issue_tag_number, meps_document_id) in rows {
                videos.push(VideoRef::from_columns(
                    key_symbol,
                    track,
                    issue_tag_number,
                    meps_document_id,
                )?);
            }
        }
        debug!("videos for {} document(s): {:?}", documents.len(), videos);
        Ok(videos)
    }
}

/// Decode a `YYYYMMDD` date offset column
pub fn parse_date_offset(value: i64) -> MetadataResult<NaiveDate> {
    let year = i32::try_from(value / 10_000).map_err(|_| MetadataError::InvalidDate { value })?;
    let month = ((value / 100) % 100) as u32;
    let day = (value % 100) as u32;
    NaiveDate::from_ymd_opt(year, month, day).ok_or(MetadataError::InvalidDate { value })
}

/// Encode a date as a `YYYYMMDD` date offset
pub fn date_offset(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}
