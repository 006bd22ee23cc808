//! Media location via the publisher's APIs
//!
//! Turns metadata references into concrete download locations. Two APIs are used:
//!
//! - the catalog lookup (`GETPUBMEDIALINKS`), queried by song number, document id,
//!   publication symbol and track, or publication issue (for the archive itself);
//! - the dated-issue lookup (`media-items`), for videos belonging to a periodical
//!   issue.
//!
//! Every failure is wrapped with the subject being resolved, e.g. `song 101` or
//! `archive mwb 202403`.

pub mod selection;
pub mod types;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::client::download::url_file_name;
use crate::app::client::MediaClient;
use crate::app::models::{VideoAddress, VideoRef};
use crate::app::publication::{Issue, PublicationKind};
use crate::constants::{api, files};
use crate::errors::{MediaError, MediaResult};

pub use selection::{select_mp4, select_pub_video_file};
pub use types::{LanguageFiles, MediaInfoResult, PubVideoResult};

/// API endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorConfig {
    pub media_links_url: String,
    pub media_items_url: String,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            media_links_url: api::MEDIA_LINKS_URL.to_string(),
            media_items_url: api::MEDIA_ITEMS_URL.to_string(),
        }
    }
}

impl LocatorConfig {
    /// Both endpoints on one base URL, as served by a test server
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            media_links_url: format!("{}/GETPUBMEDIALINKS", base),
            media_items_url: format!("{}/apis/mediator/v1/media-items", base),
        }
    }
}

/// Where to download an asset from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub url: String,
    pub size: u64,
    /// File name to store the asset under
    pub file_name: String,
}

/// Resolves songs, videos and publication archives to download URLs
pub struct MediaLocator<'a> {
    client: &'a MediaClient,
    config: LocatorConfig,
}

impl<'a> MediaLocator<'a> {
    pub fn new(client: &'a MediaClient, config: LocatorConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Locate the publication archive for an issue
    ///
    /// # Errors
    ///
    /// Returns `MediaError::PublicationUnavailable` when the API answers 4xx (the
    /// issue is not published yet, or not in that language)
    pub async fn publication_archive(
        &self,
        kind: PublicationKind,
        issue: Issue,
        language: &str,
    ) -> MediaResult<ResolvedAsset> {
        let subject = format!("archive {} {}", kind.symbol(), issue.code());
        self.locate_archive(kind, issue, language)
            .await
            .map_err(|e| e.for_subject(subject))
    }

    async fn locate_archive(
        &self,
        kind: PublicationKind,
        issue: Issue,
        language: &str,
    ) -> MediaResult<ResolvedAsset> {
        let url = self.media_links_url(&[
            ("issue", issue.code()),
            ("output", "json".to_string()),
            ("pub", kind.symbol().to_string()),
            ("fileformat", api::ARCHIVE_FORMAT.to_string()),
            ("alllangs", "0".to_string()),
            ("langwritten", language.to_string()),
            ("txtCMSLang", language.to_string()),
        ])?;

        let info: MediaInfoResult = match self.get_json(&url).await {
            Err(MediaError::ServerError { status }) if (400..500).contains(&status) => {
                return Err(MediaError::PublicationUnavailable {
                    symbol: kind.symbol().to_string(),
                    issue: issue.code(),
                });
            }
            other => other?,
        };

        let item = language_files(&info, language)?
            .jwpub
            .first()
            .ok_or_else(|| MediaError::NoMedia {
                reason: "no JWPUB file listed".to_string(),
            })?;

        info!("located {} {} archive ({} bytes)", kind.symbol(), issue, item.filesize);
        Ok(ResolvedAsset {
            url: item.file.url.clone(),
            size: item.filesize,
            file_name: asset_file_name(&item.file.url)?,
        })
    }

    /// Resolve a song number to its video at the requested resolution
    ///
    /// The asset is stored as `<number>.mp4`.
    pub async fn resolve_song(
        &self,
        number: &str,
        language: &str,
        resolution_label: &str,
    ) -> MediaResult<ResolvedAsset> {
        self.locate_song(number, language, resolution_label)
            .await
            .map_err(|e| e.for_subject(format!("song {}", number)))
    }

    async fn locate_song(
        &self,
        number: &str,
        language: &str,
        resolution_label: &str,
    ) -> MediaResult<ResolvedAsset> {
        let url = self.media_links_url(&[
            ("output", "json".to_string()),
            ("pub", api::SONGBOOK_SYMBOL.to_string()),
            ("fileformat", api::VIDEO_FORMAT.to_string()),
            ("alllangs", "0".to_string()),
            ("track", number.to_string()),
            ("langwritten", language.to_string()),
            ("txtCMSLang", language.to_string()),
        ])?;

        let info: MediaInfoResult = self.get_json(&url).await?;
        let item = select_mp4(&language_files(&info, language)?.mp4, resolution_label)
            .ok_or_else(|| MediaError::NoMedia {
                reason: "no MP4 variants listed".to_string(),
            })?;

        Ok(ResolvedAsset {
            url: item.file.url.clone(),
            size: item.filesize,
            file_name: format!("{}.{}", number, files::SONG_EXTENSION),
        })
    }

    /// Resolve a video reference using the lookup its addressing scheme calls for
    ///
    /// The asset is stored under the base name of its download URL.
    pub async fn resolve_video(
        &self,
        video: &VideoRef,
        language: &str,
        resolution_label: &str,
    ) -> MediaResult<ResolvedAsset> {
        let result = match &video.address {
            VideoAddress::DatedIssue {
                key_symbol,
                issue_tag_number,
                track,
            } => {
                self.locate_issue_video(key_symbol, *issue_tag_number, *track, language, resolution_label)
                    .await
            }
            address => {
                self.locate_catalog_video(address, language, resolution_label)
                    .await
            }
        };
        result.map_err(|e| e.for_subject(video.to_string()))
    }

    async fn locate_catalog_video(
        &self,
        address: &VideoAddress,
        language: &str,
        resolution_label: &str,
    ) -> MediaResult<ResolvedAsset> {
        let (key, value, track) = match address {
            VideoAddress::Document {
                meps_document_id,
                track,
            } => ("docid", meps_document_id.to_string(), *track),
            VideoAddress::Publication { key_symbol, track } => ("pub", key_symbol.clone(), *track),
            VideoAddress::DatedIssue { .. } => {
                return Err(MediaError::NoMedia {
                    reason: "dated-issue videos are not in the catalog".to_string(),
                })
            }
        };

        let url = self.media_links_url(&[
            (key, value),
            ("output", "json".to_string()),
            ("fileformat", api::VIDEO_FORMAT.to_string()),
            ("alllangs", "0".to_string()),
            ("track", track.to_string()),
            ("langwritten", language.to_string()),
            ("txtCMSLang", language.to_string()),
        ])?;

        let info: MediaInfoResult = self.get_json(&url).await?;
        let item = select_mp4(&language_files(&info, language)?.mp4, resolution_label)
            .ok_or_else(|| MediaError::NoMedia {
                reason: "no MP4 variants listed".to_string(),
            })?;

        Ok(ResolvedAsset {
            url: item.file.url.clone(),
            size: item.filesize,
            file_name: asset_file_name(&item.file.url)?,
        })
    }

    async fn locate_issue_video(
        &self,
        key_symbol: &str,
        issue_tag_number: i64,
        track: i64,
        language: &str,
        resolution_label: &str,
    ) -> MediaResult<ResolvedAsset> {
        let url = self.media_items_url(key_symbol, issue_tag_number, track, language)?;

        let info: PubVideoResult = self.get_json(&url).await?;
        let group = info.media.first().ok_or_else(|| MediaError::NoMedia {
            reason: "no media group listed".to_string(),
        })?;
        let file = select_pub_video_file(&group.files, resolution_label).ok_or_else(|| {
            MediaError::NoMedia {
                reason: "no video files listed".to_string(),
            }
        })?;

        Ok(ResolvedAsset {
            url: file.progressive_download_url.clone(),
            size: file.filesize,
            file_name: asset_file_name(&file.progressive_download_url)?,
        })
    }

    fn media_links_url(&self, params: &[(&str, String)]) -> MediaResult<Url> {
        Url::parse_with_params(&self.config.media_links_url, params).map_err(|e| {
            MediaError::InvalidUrl {
                url: self.config.media_links_url.clone(),
                error: e.to_string(),
            }
        })
    }

    /// `<base>/<lang>/pub-<symbol>_<issue tag / 100>_<track>_VIDEO`
    fn media_items_url(
        &self,
        key_symbol: &str,
        issue_tag_number: i64,
        track: i64,
        language: &str,
    ) -> MediaResult<Url> {
        let raw = format!(
            "{}/{}/pub-{}_{}_{}_VIDEO",
            self.config.media_items_url.trim_end_matches('/'),
            language,
            key_symbol,
            issue_tag_number / 100,
            track
        );
        Url::parse(&raw).map_err(|e| MediaError::InvalidUrl {
            url: raw,
            error: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> MediaResult<T> {
        debug!("media lookup {}", url);
        let body = self.client.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn language_files<'i>(info: &'i MediaInfoResult, language: &str) -> MediaResult<&'i LanguageFiles> {
    info.files.get(language).ok_or_else(|| MediaError::NoMedia {
        reason: format!("nothing listed for language '{}'", language),
    })
}

fn asset_file_name(url: &str) -> MediaResult<String> {
    url_file_name(url)
        .map(str::to_string)
        .ok_or_else(|| MediaError::InvalidUrl {
            url: url.to_string(),
            error: "no file name in URL".to_string(),
        })
}
