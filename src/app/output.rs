//! Output directory handling
//!
//! Playlist assembly, picture writing and the optional purge of the save location.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::app::models::{Asset, VideoRef};
use crate::constants::files;

/// Playlist text: songs, then videos, then pictures sorted by name
///
/// Every entry is a file name relative to the save location, one per line, each
/// line newline-terminated.
pub fn build_playlist(songs: &[String], videos: &[VideoRef], pictures: &[Asset]) -> String {
    let mut picture_names: Vec<&str> = pictures.iter().map(|p| p.name.as_str()).collect();
    picture_names.sort_unstable();

    let mut body = String::new();
    for song in songs {
        body.push_str(song);
        body.push('.');
        body.push_str(files::SONG_EXTENSION);
        body.push('\n');
    }
    for video in videos {
        body.push_str(&video.name);
        body.push('\n');
    }
    for name in picture_names {
        body.push_str(name);
        body.push('\n');
    }
    body
}

/// Write `playlist.m3u` into `dir`, returning its path
pub async fn write_playlist(
    dir: &Path,
    songs: &[String],
    videos: &[VideoRef],
    pictures: &[Asset],
) -> io::Result<PathBuf> {
    let path = dir.join(files::PLAYLIST_FILE_NAME);
    tokio::fs::write(&path, build_playlist(songs, videos, pictures)).await?;
    info!("Wrote playlist {}", path.display());
    Ok(path)
}

/// Write every picture into `dir` under its own name
pub async fn write_pictures(dir: &Path, pictures: &[Asset]) -> io::Result<()> {
    for picture in pictures {
        let path = dir.join(&picture.name);
        info!("Saving picture {}", picture.name);
        tokio::fs::write(&path, &picture.payload).await?;
    }
    Ok(())
}

/// Delete everything inside `dir`, keeping `dir` itself
///
/// Returns the number of entries removed; a missing directory counts as empty.
pub async fn purge_directory(dir: &Path) -> io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
        debug!("Removed {}", path.display());
        removed += 1;
    }
    Ok(removed)
}

/// Create `dir` (and parents) if it does not exist yet
pub async fn ensure_directory(dir: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(dir).await
}
