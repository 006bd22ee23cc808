//! Variant selection
//!
//! Both lookups return several encodings of the same video. Selection never fails
//! on a non-empty list: when the preferred variant is missing the lowest one is
//! taken and a warning is logged.

use tracing::warn;

use super::types::{Mp4Item, PubVideoFile};
use crate::app::models::Resolution;

/// Pick the catalog variant for `resolution_label`
///
/// Variants are ordered by ascending resolution, so the label's index is used
/// directly. An unknown label, or an index past the end of the list, selects the
/// first variant. `None` only for an empty list.
pub fn select_mp4<'a>(items: &'a [Mp4Item], resolution_label: &str) -> Option<&'a Mp4Item> {
    let index = Resolution::index_for_label(resolution_label);
    match items.get(index) {
        Some(item) => Some(item),
        None => {
            let first = items.first()?;
            warn!(
                "no variant #{} for '{}' ({} available), using the lowest",
                index,
                resolution_label,
                items.len()
            );
            Some(first)
        }
    }
}

/// Pick the dated-issue variant whose label matches and which has no burned-in subtitles
///
/// Falls back to the first variant when none qualifies. `None` only for an empty list.
pub fn select_pub_video_file<'a>(
    files: &'a [PubVideoFile],
    resolution_label: &str,
) -> Option<&'a PubVideoFile> {
    if let Some(file) = files
        .iter()
        .find(|f| f.label == resolution_label && !f.subtitled)
    {
        return Some(file);
    }

    let first = files.first()?;
    warn!(
        "no unsubtitled '{}' variant among {} file(s), using '{}'",
        resolution_label,
        files.len(),
        first.label
    );
    Some(first)
}
