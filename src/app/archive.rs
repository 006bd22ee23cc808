//! Publication archive extraction
//!
//! A publication archive is a ZIP file whose entry `contents` is itself a ZIP file.
//! The metadata database and every image live inside `contents`. Entries are found
//! with glob patterns (`mwb*.db`) or exact names (`picture1.jpg`); the first entry in
//! archive order that matches wins.

use std::io::{Cursor, Read};

use regex::Regex;
use tracing::debug;

use crate::constants::archive::CONTENTS_ENTRY;
use crate::constants::limits;
use crate::errors::{ArchiveError, ArchiveResult};

/// Glob pattern matched against full entry names
///
/// `*` matches any run of characters, `?` exactly one; everything else is literal.
#[derive(Debug, Clone)]
pub struct EntryPattern {
    pattern: String,
    regex: Regex,
}

impl EntryPattern {
    /// Compile a glob pattern
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::InvalidPattern` if the translated expression is rejected
    pub fn new(pattern: &str) -> ArchiveResult<Self> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|source| ArchiveError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// Return the bytes of the first entry of `zip_bytes` matching `pattern`
///
/// # Errors
///
/// Returns `ArchiveError::Malformed` if the bytes are not a readable ZIP archive and
/// `ArchiveError::EntryNotFound` if nothing matches
pub fn extract_entry(zip_bytes: &[u8], pattern: &str) -> ArchiveResult<Vec<u8>> {
    let pattern = EntryPattern::new(pattern)?;
    let mut archive = zip::ZipArchive::new(Cursor::new(zip_bytes))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() || !pattern.matches(entry.name()) {
            continue;
        }

        debug!("extracting '{}' for pattern '{}'", entry.name(), pattern.as_str());
        return read_entry(&mut entry);
    }

    Err(ArchiveError::EntryNotFound {
        pattern: pattern.as_str().to_string(),
    })
}

/// Return the bytes of the entry of `zip_bytes` named exactly `name`
///
/// # Errors
///
/// Returns `ArchiveError::EntryNotFound` if no entry has that name
pub fn extract_named(zip_bytes: &[u8], name: &str) -> ArchiveResult<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(zip_bytes))?;
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ArchiveError::EntryNotFound {
                pattern: name.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    read_entry(&mut entry)
}

/// Decompress one entry; the header size is only a capacity hint
fn read_entry(entry: &mut zip::read::ZipFile<'_>) -> ArchiveResult<Vec<u8>> {
    let hint = entry.size().min(limits::MAX_PREALLOC_BYTES) as usize;
    let mut payload = Vec::with_capacity(hint);
    entry
        .read_to_end(&mut payload)
        .map_err(|source| ArchiveError::Corrupt {
            entry: entry.name().to_string(),
            source,
        })?;
    Ok(payload)
}

/// Extract an entry from the `contents` archive nested inside `archive_bytes`
///
/// # Errors
///
/// Returns `ArchiveError::EntryNotFound` if `contents` is absent or nothing inside it
/// matches, `ArchiveError::Malformed` if either layer is not a ZIP archive
pub fn extract(archive_bytes: &[u8], pattern: &str) -> ArchiveResult<Vec<u8>> {
    PublicationArchive::open(archive_bytes)?.extract(pattern)
}

/// A publication archive with its nested `contents` already unpacked
pub struct PublicationArchive {
    contents: Vec<u8>,
}

impl PublicationArchive {
    /// Unpack the `contents` entry of a publication archive
    pub fn open(archive_bytes: &[u8]) -> ArchiveResult<Self> {
        let contents = extract_entry(archive_bytes, CONTENTS_ENTRY)?;
        debug!("unpacked contents ({} bytes)", contents.len());
        Ok(Self { contents })
    }

    /// First entry inside `contents` matching `pattern`
    pub fn extract(&self, pattern: &str) -> ArchiveResult<Vec<u8>> {
        extract_entry(&self.contents, pattern)
    }

    /// Entry inside `contents` named exactly `name`, wildcards taken literally
    pub fn extract_named(&self, name: &str) -> ArchiveResult<Vec<u8>> {
        extract_named(&self.contents, name)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    use zip::write::FileOptions;

    /// Build a ZIP archive from (name, payload) pairs
    pub(crate) fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, payload) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(payload).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn fixture() -> Vec<u8> {
        let contents = zip_of(&[
            ("picture1.jpg", b"\xff\xd8jpeg-bytes"),
            ("mwb-sample.db", b"SQLite format 3\0sample"),
        ]);
        zip_of(&[("manifest.json", b"{}"), ("contents", &contents)])
    }

    #[test]
    fn test_extract_database_by_pattern() {
        let blob = fixture();
        let db = extract(&blob, "mwb*.db").unwrap();
        assert_eq!(db, b"SQLite format 3\0sample");
    }

    #[test]
    fn test_extract_missing_pattern() {
        let blob = fixture();
        let err = extract(&blob, "xyz*.db").unwrap_err();
        assert!(matches!(err, ArchiveError::EntryNotFound { ref pattern } if pattern == "xyz*.db"));
    }

    #[test]
    fn test_extract_exact_name_from_open_archive() {
        let blob = fixture();
        let archive = PublicationArchive::open(&blob).unwrap();
        assert_eq!(archive.extract("picture1.jpg").unwrap(), b"\xff\xd8jpeg-bytes");
        // '.' is literal, not a wildcard
        assert!(archive.extract("picture1xjpg").is_err());
    }

    #[test]
    fn test_missing_contents() {
        let blob = zip_of(&[("other", b"data")]);
        let err = extract(&blob, "mwb*.db").unwrap_err();
        assert!(matches!(err, ArchiveError::EntryNotFound { ref pattern } if pattern == "contents"));
    }

    #[test]
    fn test_malformed_layers() {
        assert!(matches!(
            extract(b"not a zip at all", "mwb*.db").unwrap_err(),
            ArchiveError::Malformed(_)
        ));

        let blob = zip_of(&[("contents", b"also not a zip")]);
        assert!(matches!(
            extract(&blob, "mwb*.db").unwrap_err(),
            ArchiveError::Malformed(_)
        ));
    }

    /// Flip one byte in the middle of the first entry's stored data
    fn corrupt_first_entry(blob: &[u8]) -> Vec<u8> {
        let u16_at = |at: usize| u16::from_le_bytes([blob[at], blob[at + 1]]) as usize;
        let compressed = u32::from_le_bytes([blob[18], blob[19], blob[20], blob[21]]) as usize;
        let data_start = 30 + u16_at(26) + u16_at(28);

        let mut corrupted = blob.to_vec();
        corrupted[data_start + compressed / 2] ^= 0xff;
        corrupted
    }

    #[test]
    fn test_corrupt_entry_data_is_parse_error() {
        let payload = b"SQLite format 3\0 workbook rows ".repeat(64);
        let blob = zip_of(&[("mwb_E_202403.db", payload.as_slice())]);
        let err = extract_entry(&corrupt_first_entry(&blob), "mwb*.db").unwrap_err();
        assert!(matches!(err, ArchiveError::Corrupt { ref entry, .. } if entry == "mwb_E_202403.db"));

        // Corruption in the outer layer's `contents` entry
        let contents = zip_of(&[("mwb_E_202403.db", payload.as_slice())]);
        let outer = corrupt_first_entry(&zip_of(&[("contents", contents.as_slice())]));
        let err = crate::errors::AppError::from(extract(&outer, "mwb*.db").unwrap_err());
        assert_eq!(err.kind(), crate::errors::ErrorKind::Parse);
    }

    #[test]
    fn test_named_lookup_takes_wildcards_literally() {
        let contents = zip_of(&[("picture1.jpg", b"one"), ("pic*.jpg", b"starred")]);
        let archive = PublicationArchive::open(&zip_of(&[("contents", &contents)])).unwrap();

        assert_eq!(archive.extract_named("pic*.jpg").unwrap(), b"starred");
        assert_eq!(archive.extract_named("picture1.jpg").unwrap(), b"one");
        assert!(matches!(
            archive.extract_named("pic?ure1.jpg").unwrap_err(),
            ArchiveError::EntryNotFound { .. }
        ));
        // The glob form matches the first entry instead
        assert_eq!(archive.extract("pic*.jpg").unwrap(), b"one");
    }

    #[test]
    fn test_first_match_wins() {
        let contents = zip_of(&[("w_E_202401.db", b"first"), ("w_E_202402.db", b"second")]);
        let blob = zip_of(&[("contents", &contents)]);
        assert_eq!(extract(&blob, "w*.db").unwrap(), b"first");
    }

    #[test]
    fn test_pattern_matching() {
        let pattern = EntryPattern::new("mwb*.db").unwrap();
        assert!(pattern.matches("mwb_E_202403.db"));
        assert!(pattern.matches("mwb.db"));
        assert!(!pattern.matches("w_E_202403.db"));
        assert!(!pattern.matches("mwb_E_202403.db-journal"));

        let single = EntryPattern::new("img?.png").unwrap();
        assert!(single.matches("img1.png"));
        assert!(!single.matches("img12.png"));
    }
}
