//! Tests for the publication metadata database
//!
//! Fixture databases are built with sqlx in a temporary directory and then handed
//! to `MetadataStore` as raw bytes, the same way extracted archive entries are.

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tempfile::TempDir;

use super::*;
use crate::app::models::VideoAddress;

const SCHEMA: &[&str] = &[
    "CREATE TABLE Document (DocumentId INTEGER PRIMARY KEY, Class INTEGER NOT NULL, Title TEXT)",
    "CREATE TABLE DatedText (DatedTextId INTEGER PRIMARY KEY, DocumentId INTEGER NOT NULL, FirstDateOffset INTEGER NOT NULL, LastDateOffset INTEGER)",
    "CREATE TABLE Multimedia (MultimediaId INTEGER PRIMARY KEY, KeySymbol TEXT, Track INTEGER, IssueTagNumber INTEGER, MepsDocumentId INTEGER, MimeType TEXT, FilePath TEXT, CategoryType INTEGER)",
    "CREATE TABLE DocumentMultimedia (DocumentMultimediaId INTEGER PRIMARY KEY, DocumentId INTEGER NOT NULL, MultimediaId INTEGER NOT NULL, BeginParagraphOrdinal INTEGER)",
];

/// Build a SQLite database from statements and return its bytes
pub(crate) async fn build_database(statements: &[&str]) -> Vec<u8> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fixture.db");
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    for statement in SCHEMA.iter().chain(statements) {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;

    tokio::fs::read(&path).await.unwrap()
}

/// Workbook database: documents 10 and 11 cover 2024-03-04, 12 covers 2024-03-11
pub(crate) async fn midweek_database() -> Vec<u8> {
    build_database(&[
        "INSERT INTO Document VALUES (10, 106, 'Treasures'), (11, 106, 'Living'), (12, 106, 'Next week')",
        "INSERT INTO DatedText (DocumentId, FirstDateOffset, LastDateOffset) VALUES (10, 20240304, 20240310), (11, 20240304, 20240310), (12, 20240311, 20240317)",
        "INSERT INTO Multimedia VALUES
            (1, 'sjjm', 101, 0, NULL, 'video/mp4', NULL, NULL),
            (2, 'sjjm', 205, 0, NULL, 'video/mp4', NULL, NULL),
            (3, NULL, NULL, NULL, NULL, 'image/jpeg', 'b.jpg', 8),
            (4, NULL, NULL, NULL, NULL, 'image/jpeg', 'a.jpg', 8),
            (5, NULL, NULL, NULL, NULL, 'image/jpeg', 'cover.jpg', 9),
            (6, 'th', 5, 20240300, NULL, 'video/mp4', NULL, NULL),
            (7, NULL, NULL, 0, 502013267, 'video/mp4', NULL, NULL),
            (8, 'sjjm', 150, 0, NULL, 'video/mp4', NULL, NULL)",
        "INSERT INTO DocumentMultimedia (DocumentId, MultimediaId, BeginParagraphOrdinal) VALUES
            (10, 1, 1), (10, 3, 2), (10, 6, 3), (10, 5, 4),
            (11, 4, 1), (11, 7, 2), (11, 2, 3), (11, 3, 4),
            (12, 8, 1)",
    ])
    .await
}

/// Study edition database: article 20 for 2024-03-04, article 21 for 2024-03-11
pub(crate) async fn weekly_database() -> Vec<u8> {
    build_database(&[
        "INSERT INTO Document VALUES (20, 40, 'Study 1'), (21, 40, 'Study 2'), (22, 13, 'Cover story')",
        "INSERT INTO DatedText (DocumentId, FirstDateOffset, LastDateOffset) VALUES (20, 20240304, 20240310), (21, 20240311, 20240317), (22, 20240304, 20240310)",
        "INSERT INTO Multimedia VALUES
            (1, 'sjjm', 55, 0, NULL, 'video/mp4', NULL, NULL),
            (2, 'sjjm', 90, 0, NULL, 'video/mp4', NULL, NULL),
            (3, NULL, NULL, NULL, NULL, 'image/jpeg', 'w_pic.jpg', 8),
            (4, 'sjjm', 12, 0, NULL, 'video/mp4', NULL, NULL),
            (5, NULL, NULL, NULL, NULL, 'image/jpeg', 'other.jpg', 8),
            (6, 'sjjm', 99, 0, NULL, 'video/mp4', NULL, NULL)",
        "INSERT INTO DocumentMultimedia (DocumentId, MultimediaId, BeginParagraphOrdinal) VALUES
            (20, 2, 20), (20, 1, 1), (20, 3, 5),
            (21, 4, 1),
            (22, 5, 1), (22, 6, 2)",
    ])
    .await
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

#[tokio::test]
async fn test_midweek_queries() {
    let store = MetadataStore::open(&midweek_database().await).await.unwrap();

    let docs: Vec<Document> = store
        .documents_for_midweek()
        .await
        .unwrap()
        .into_iter()
        .filter(|d| d.date == march(4))
        .collect();
    assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![10, 11]);

    let songs = store.songs_for_midweek(&docs).await.unwrap();
    assert_eq!(songs, vec!["101", "205"]);

    let images = store.image_names(&docs).await.unwrap();
    assert_eq!(images, vec!["b.jpg", "a.jpg"]);

    let videos = store.videos_for_midweek(&docs).await.unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(
        videos[0].address,
        VideoAddress::DatedIssue {
            key_symbol: "th".to_string(),
            issue_tag_number: 20240300,
            track: 5,
        }
    );
    assert_eq!(
        videos[1].address,
        VideoAddress::Document {
            meps_document_id: 502013267,
            track: 0,
        }
    );

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_weekend_queries() {
    let store = MetadataStore::open(&weekly_database().await).await.unwrap();

    let (ids, dates) = store.documents_for_weekend().await.unwrap();
    assert_eq!(ids, vec![20, 21]);
    assert_eq!(dates, vec![march(4), march(11)]);

    let songs = store.songs_for_weekend(march(4)).await.unwrap();
    assert_eq!(songs, ["55".to_string(), "90".to_string()]);

    let images = store
        .image_names(&[Document {
            id: 20,
            date: march(4),
        }])
        .await
        .unwrap();
    assert_eq!(images, vec!["w_pic.jpg"]);

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_weekend_song_errors() {
    let store = MetadataStore::open(&weekly_database().await).await.unwrap();

    let err = store.songs_for_weekend(march(18)).await.unwrap_err();
    assert!(matches!(err, MetadataError::NoDocumentForDate { .. }));

    let err = store.songs_for_weekend(march(11)).await.unwrap_err();
    assert!(matches!(err, MetadataError::MissingSongs { found: 1, .. }));

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_temporary_directory_released() {
    let store = MetadataStore::open(&midweek_database().await).await.unwrap();
    let dir = store.directory().to_path_buf();
    assert!(dir.join(DATABASE_FILE_NAME).exists());
    store.close().await.unwrap();
    assert!(!dir.exists());

    // Dropping without close releases the directory too
    let store = MetadataStore::open(&midweek_database().await).await.unwrap();
    let dir = store.directory().to_path_buf();
    drop(store);
    assert!(!dir.exists());
}

#[tokio::test]
async fn test_open_rejects_garbage() {
    let result = MetadataStore::open(b"definitely not sqlite").await;
    match result {
        Err(MetadataError::Database(_)) => {}
        Ok(store) => {
            // SQLite opens lazily on some builds; the first query must fail
            assert!(store.documents_for_midweek().await.is_err());
        }
        Err(other) => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_date_offsets() {
    assert_eq!(parse_date_offset(20240304).unwrap(), march(4));
    assert_eq!(date_offset(march(11)), 20240311);
    assert!(parse_date_offset(20241345).is_err());
    assert!(parse_date_offset(0).is_err());
}
