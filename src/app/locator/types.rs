//! Response shapes of the media APIs
//!
//! Only the fields the crate reads are modelled; everything else in the payloads is
//! ignored. Missing lists deserialize as empty so that "nothing available" surfaces
//! as a lookup error rather than a parse error.

use std::collections::HashMap;

use serde::Deserialize;

/// Catalog lookup response (`GETPUBMEDIALINKS`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaInfoResult {
    /// Files keyed by language symbol
    #[serde(rename = "files", alias = "Files", default)]
    pub files: HashMap<String, LanguageFiles>,
}

/// Files of one language, grouped by format
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageFiles {
    #[serde(rename = "JWPUB", default)]
    pub jwpub: Vec<JwpubItem>,
    /// Video variants, sorted by ascending resolution
    #[serde(rename = "MP4", default)]
    pub mp4: Vec<Mp4Item>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileLink {
    pub url: String,
}

/// A publication archive
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JwpubItem {
    pub file: FileLink,
    #[serde(default)]
    pub filesize: u64,
}

/// One resolution variant of a catalog video
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mp4Item {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub track: i64,
    #[serde(default)]
    pub label: String,
    pub file: FileLink,
    #[serde(default)]
    pub filesize: u64,
}

/// Dated-issue lookup response (`media-items`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PubVideoResult {
    #[serde(default)]
    pub media: Vec<MediaGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaGroup {
    #[serde(default)]
    pub files: Vec<PubVideoFile>,
}

/// One variant of a dated-issue video
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PubVideoFile {
    #[serde(rename = "progressiveDownloadURL")]
    pub progressive_download_url: String,
    #[serde(default)]
    pub filesize: u64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub subtitled: bool,
}
