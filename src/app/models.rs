//! Data models for Meeting Media
//!
//! This module defines the core data structures passed between pipeline stages:
//! dated publication documents, video references, in-memory assets and the
//! aggregated per-meeting result.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{MetadataError, MetadataResult};

/// Which meeting of the week media is fetched for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeetingKind {
    /// Midweek meeting, driven by the workbook
    Midweek,
    /// Weekend meeting, driven by the study edition
    Weekend,
}

impl fmt::Display for MeetingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Midweek => write!(f, "midweek"),
            Self::Weekend => write!(f, "weekend"),
        }
    }
}

/// Video quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "240p")]
    P240,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
}

impl Resolution {
    /// All tiers, lowest first
    pub const ALL: [Resolution; 4] = [Self::P240, Self::P360, Self::P480, Self::P720];

    /// Label as used by the media APIs (e.g. "720p")
    pub fn label(&self) -> &'static str {
        match self {
            Self::P240 => "240p",
            Self::P360 => "360p",
            Self::P480 => "480p",
            Self::P720 => "720p",
        }
    }

    /// Position of this tier in a variant list sorted by ascending resolution
    pub fn index(&self) -> usize {
        match self {
            Self::P240 => 0,
            Self::P360 => 1,
            Self::P480 => 2,
            Self::P720 => 3,
        }
    }

    /// Parse a label, `None` for anything outside the fixed set
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }

    /// Variant index for a free-form label; empty or unknown labels select the lowest
    pub fn index_for_label(label: &str) -> usize {
        Self::from_label(label).map(|r| r.index()).unwrap_or(0)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| {
            format!(
                "unknown resolution '{}', expected one of 240p, 360p, 480p, 720p",
                s
            )
        })
    }
}

/// One dated unit of publication content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document {
    pub id: i64,
    pub date: NaiveDate,
}

/// How a video asset is addressed by the media APIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoAddress {
    /// Catalog lookup by MEPS document id
    Document { meps_document_id: i64, track: i64 },
    /// Catalog lookup by publication symbol and track
    Publication { key_symbol: String, track: i64 },
    /// Dated-issue lookup by publication symbol, issue tag and track
    DatedIssue {
        key_symbol: String,
        issue_tag_number: i64,
        track: i64,
    },
}

impl VideoAddress {
    /// Publication symbol, if the address carries one
    pub fn key_symbol(&self) -> Option<&str> {
        match self {
            Self::Document { .. } => None,
            Self::Publication { key_symbol, .. } | Self::DatedIssue { key_symbol, .. } => {
                Some(key_symbol)
            }
        }
    }
}

impl fmt::Display for VideoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document {
                meps_document_id,
                track,
            } => write!(f, "docid {} track {}", meps_document_id, track),
            Self::Publication { key_symbol, track } => {
                write!(f, "pub {} track {}", key_symbol, track)
            }
            Self::DatedIssue {
                key_symbol,
                issue_tag_number,
                track,
            } => write!(f, "pub {} issue {} track {}", key_symbol, issue_tag_number, track),
        }
    }
}

/// A video referenced by the meeting content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    /// Base file name, empty until the video has been resolved
    pub name: String,
    pub address: VideoAddress,
}

impl VideoRef {
    pub fn new(address: VideoAddress) -> Self {
        Self {
            name: String::new(),
            address,
        }
    }

    /// Build a reference from the nullable multimedia columns
    ///
    /// A non-zero issue tag selects the dated-issue scheme (symbol and track required).
    /// Otherwise a document id selects the document scheme, and a bare symbol the
    /// publication scheme.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::InvalidVideo` when the columns fit none of the schemes
    pub fn from_columns(
        key_symbol: Option<String>,
        track: Option<i64>,
        issue_tag_number: i64,
        meps_document_id: Option<i64>,
    ) -> MetadataResult<Self> {
        let address = match (issue_tag_number, meps_document_id, key_symbol, track) {
            (tag, _, Some(key_symbol), Some(track)) if tag != 0 => VideoAddress::DatedIssue {
                key_symbol,
                issue_tag_number: tag,
                track,
            },
            (tag, _, symbol, track) if tag != 0 => {
                return Err(MetadataError::InvalidVideo {
                    reason: format!(
                        "issue tag {} without symbol/track ({:?}, {:?})",
                        tag, symbol, track
                    ),
                });
            }
            (_, Some(meps_document_id), _, track) => VideoAddress::Document {
                meps_document_id,
                track: track.unwrap_or(0),
            },
            (_, None, Some(key_symbol), Some(track)) => {
                VideoAddress::Publication { key_symbol, track }
            }
            (_, None, symbol, track) => {
                return Err(MetadataError::InvalidVideo {
                    reason: format!(
                        "neither document id nor symbol/track ({:?}, {:?})",
                        symbol, track
                    ),
                });
            }
        };

        Ok(Self::new(address))
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "video {}", self.address)
    }
}

/// Raw bytes of an image taken from a publication archive
#[derive(Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub payload: Vec<u8>,
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("name", &self.name)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

/// Media gathered for one meeting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingData {
    /// Meeting week as `YYYY-MM-DD`
    pub date: String,
    pub songs: Vec<String>,
    pub pictures: Vec<Asset>,
    pub videos: Vec<VideoRef>,
}

/// Combine the manually chosen first song with the study article's songs
pub fn weekend_songs(manual: &str, resolved: [String; 2]) -> Vec<String> {
    let [opening, closing] = resolved;
    vec![manual.to_string(), opening, closing]
}
