//! End-to-end tests for the fetch pipeline against a mock media server
//!
//! The server answers the catalog lookup for the archive, songs and document
//! videos, the dated-issue lookup, and serves the archive and media files.

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use super::*;
use crate::app::archive::tests::zip_of;
use crate::app::client::ClientConfig;
use crate::app::metadata::tests::{midweek_database, weekly_database};
use crate::app::models::VideoAddress;
use crate::app::progress::RecordingProgress;
use crate::errors::ErrorKind;

const MEDIA_BYTES: &[u8] = b"not really a video";

fn test_client() -> MediaClient {
    MediaClient::with_config(ClientConfig {
        max_retries: 0,
        retry_base_delay: Duration::from_millis(1),
        rate_limit_rps: 1000,
        ..Default::default()
    })
    .unwrap()
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn mp4_variants(base: &str, stem: &str) -> serde_json::Value {
    json!(["240p", "360p", "480p", "720p"]
        .iter()
        .map(|label| json!({
            "label": label,
            "file": {"url": format!("{}/media/{}_r{}.mp4", base, stem, label.to_uppercase())},
            "filesize": MEDIA_BYTES.len(),
        }))
        .collect::<Vec<_>>())
}

/// Song lookups answer with variants named after the requested track
fn song_lookup(base: String) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
    move |request: &Request| {
        let track = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "track")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        ResponseTemplate::new(200).set_body_json(json!({
            "files": {"E": {"MP4": mp4_variants(&base, &format!("sjjm_E_{}", track))}}
        }))
    }
}

async fn mount_archive(server: &MockServer, symbol: &str, issue: &str, archive: Vec<u8>) {
    let file_name = format!("{}_E_{}.jwpub", symbol, issue);
    Mock::given(method("GET"))
        .and(path("/GETPUBMEDIALINKS"))
        .and(query_param("pub", symbol))
        .and(query_param("issue", issue))
        .and(query_param("fileformat", "JWPUB"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": {"E": {"JWPUB": [{
                "file": {"url": format!("{}/files/{}", server.uri(), file_name)},
                "filesize": archive.len(),
            }]}}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/files/{}", file_name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_songs(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/GETPUBMEDIALINKS"))
        .and(query_param("pub", "sjjm"))
        .respond_with(song_lookup(server.uri()))
        .mount(server)
        .await;
}

async fn mount_midweek_videos(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/GETPUBMEDIALINKS"))
        .and(query_param("docid", "502013267"))
        .and(query_param("track", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": {"E": {"MP4": mp4_variants(&server.uri(), "doc_502013267")}}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/apis/mediator/v1/media-items/E/pub-th_202403_5_VIDEO"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "media": [{"files": [
                {"progressiveDownloadURL": format!("{}/media/th_E_05_r720P_sub.mp4", server.uri()),
                 "filesize": MEDIA_BYTES.len(), "label": "720p", "subtitled": true},
                {"progressiveDownloadURL": format!("{}/media/th_E_05_r720P.mp4", server.uri()),
                 "filesize": MEDIA_BYTES.len(), "label": "720p", "subtitled": false}
            ]}]
        })))
        .mount(server)
        .await;
}

async fn mount_media(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/media/.+\.mp4$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(MEDIA_BYTES.to_vec()))
        .expect(expected)
        .mount(server)
        .await;
}

async fn midweek_archive() -> Vec<u8> {
    let db = midweek_database().await;
    let contents = zip_of(&[
        ("mwb_E_202403.db", db.as_slice()),
        ("b.jpg", b"picture b"),
        ("a.jpg", b"picture a"),
        ("cover.jpg", b"cover"),
    ]);
    zip_of(&[("manifest.json", b"{}"), ("contents", contents.as_slice())])
}

async fn weekly_archive() -> Vec<u8> {
    let db = weekly_database().await;
    let contents = zip_of(&[
        ("w_E_202401.db", db.as_slice()),
        ("w_pic.jpg", b"weekend picture"),
        ("other.jpg", b"other"),
    ]);
    zip_of(&[("contents", contents.as_slice())])
}

async fn read(dir: &TempDir, name: &str) -> Vec<u8> {
    tokio::fs::read(dir.path().join(name)).await.unwrap()
}

#[tokio::test]
async fn test_midweek_end_to_end() {
    let server = MockServer::start().await;
    mount_archive(&server, "mwb", "202403", midweek_archive().await).await;
    mount_songs(&server).await;
    mount_midweek_videos(&server).await;
    mount_media(&server, 4).await;

    let dir = TempDir::new().unwrap();
    let client = test_client();
    let progress = RecordingProgress::new();
    let fetcher = MeetingFetcher::new(&client, LocatorConfig::with_base(&server.uri()), &progress);

    let mut session = Session::new(march(6), dir.path())
        .with_other_media(true)
        .with_playlist(true);
    let stats = fetcher.fetch(&mut session, MeetingKind::Midweek).await.unwrap();

    assert_eq!(session.songs, vec!["101", "205"]);
    assert_eq!(session.videos.len(), 2);
    assert_eq!(session.videos[0].name, "th_E_05_r720P.mp4");
    assert_eq!(session.videos[1].name, "doc_502013267_r720P.mp4");
    assert_eq!(
        session.pictures.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        vec!["b.jpg", "a.jpg"]
    );

    assert_eq!(read(&dir, "101.mp4").await, MEDIA_BYTES);
    assert_eq!(read(&dir, "205.mp4").await, MEDIA_BYTES);
    assert_eq!(read(&dir, "th_E_05_r720P.mp4").await, MEDIA_BYTES);
    assert_eq!(read(&dir, "a.jpg").await, b"picture a");
    assert!(!dir.path().join("cover.jpg").exists());
    assert_eq!(
        String::from_utf8(read(&dir, "playlist.m3u").await).unwrap(),
        "101.mp4\n205.mp4\nth_E_05_r720P.mp4\ndoc_502013267_r720P.mp4\na.jpg\nb.jpg\n"
    );

    assert_eq!(stats.songs, 2);
    assert_eq!(stats.videos, 2);
    assert_eq!(stats.pictures, 2);
    assert_eq!(stats.bytes_downloaded, 4 * MEDIA_BYTES.len() as u64);
    assert_eq!(stats.playlist, Some(dir.path().join("playlist.m3u")));

    let titles = progress.titles();
    assert_eq!(titles.first().map(String::as_str), Some("mwb_E_202403.jwpub"));
    assert!(titles.contains(&"101.mp4".to_string()));
}

#[tokio::test]
async fn test_weekend_end_to_end() {
    let server = MockServer::start().await;
    mount_archive(&server, "w", "202401", weekly_archive().await).await;
    mount_songs(&server).await;
    mount_media(&server, 3).await;

    let dir = TempDir::new().unwrap();
    let client = test_client();
    let progress = RecordingProgress::new();
    let fetcher = MeetingFetcher::new(&client, LocatorConfig::with_base(&server.uri()), &progress);

    let mut session = Session::new(march(9), dir.path())
        .with_songs(vec!["10".to_string()])
        .with_other_media(true)
        .with_playlist(true);
    fetcher.fetch(&mut session, MeetingKind::Weekend).await.unwrap();

    assert_eq!(session.songs, vec!["10", "55", "90"]);
    assert!(session.videos.is_empty());
    assert_eq!(read(&dir, "w_pic.jpg").await, b"weekend picture");
    assert!(!dir.path().join("other.jpg").exists());
    assert_eq!(
        String::from_utf8(read(&dir, "playlist.m3u").await).unwrap(),
        "10.mp4\n55.mp4\n90.mp4\nw_pic.jpg\n"
    );
}

#[tokio::test]
async fn test_weekend_requires_manual_song() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = test_client();
    let progress = RecordingProgress::new();
    let fetcher = MeetingFetcher::new(&client, LocatorConfig::with_base(&server.uri()), &progress);

    let mut session = Session::new(march(4), dir.path());
    let err = fetcher
        .fetch(&mut session, MeetingKind::Weekend)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_weekend_article_missing_songs() {
    let server = MockServer::start().await;
    mount_archive(&server, "w", "202401", weekly_archive().await).await;
    mount_media(&server, 0).await;

    let dir = TempDir::new().unwrap();
    let client = test_client();
    let progress = RecordingProgress::new();
    let fetcher = MeetingFetcher::new(&client, LocatorConfig::with_base(&server.uri()), &progress);

    // The 2024-03-11 article only references one song
    let mut session = Session::new(march(11), dir.path()).with_songs(vec!["10".to_string()]);
    let err = fetcher
        .fetch(&mut session, MeetingKind::Weekend)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(session.songs, vec!["10"]);
}

#[tokio::test]
async fn test_dry_run_downloads_nothing() {
    let server = MockServer::start().await;
    mount_archive(&server, "mwb", "202403", midweek_archive().await).await;
    mount_songs(&server).await;
    mount_midweek_videos(&server).await;
    mount_media(&server, 0).await;

    let parent = TempDir::new().unwrap();
    let save = parent.path().join("out");
    let client = test_client();
    let progress = RecordingProgress::new();
    let fetcher = MeetingFetcher::new(&client, LocatorConfig::with_base(&server.uri()), &progress);

    let mut session = Session::new(march(4), &save)
        .with_other_media(true)
        .with_playlist(true)
        .with_purge(true)
        .with_dry_run(true);
    let stats = fetcher.fetch(&mut session, MeetingKind::Midweek).await.unwrap();

    assert!(!save.exists());
    assert_eq!(stats.bytes_downloaded, 0);
    assert_eq!(stats.playlist, None);
    assert_eq!(stats.songs, 2);
    assert_eq!(session.videos[0].name, "th_E_05_r720P.mp4");
}

#[tokio::test]
async fn test_no_documents_for_week() {
    let server = MockServer::start().await;
    mount_archive(&server, "mwb", "202403", midweek_archive().await).await;
    mount_media(&server, 0).await;

    let dir = TempDir::new().unwrap();
    let client = test_client();
    let progress = RecordingProgress::new();
    let fetcher = MeetingFetcher::new(&client, LocatorConfig::with_base(&server.uri()), &progress);

    let mut session = Session::new(march(18), dir.path());
    let err = fetcher
        .fetch(&mut session, MeetingKind::Midweek)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_linked_publication_filter() {
    let server = MockServer::start().await;
    mount_archive(&server, "mwb", "202403", midweek_archive().await).await;
    mount_songs(&server).await;
    mount_midweek_videos(&server).await;
    mount_media(&server, 3).await;

    let dir = TempDir::new().unwrap();
    let client = test_client();
    let progress = RecordingProgress::new();
    let fetcher = MeetingFetcher::new(&client, LocatorConfig::with_base(&server.uri()), &progress);

    let mut session = Session::new(march(4), dir.path())
        .with_other_media(true)
        .with_pub_symbols(vec!["lmd".to_string()]);
    fetcher.fetch(&mut session, MeetingKind::Midweek).await.unwrap();

    assert_eq!(session.videos.len(), 1);
    assert!(matches!(
        session.videos[0].address,
        VideoAddress::Document { .. }
    ));
    assert!(!dir.path().join("th_E_05_r720P.mp4").exists());
}

#[tokio::test]
async fn test_manual_songs_skip_archive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("fileformat", "JWPUB"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    mount_songs(&server).await;
    mount_media(&server, 2).await;

    let dir = TempDir::new().unwrap();
    tokio::fs::write(dir.path().join("stale.mp4"), b"old").await.unwrap();
    let client = test_client();
    let progress = RecordingProgress::new();
    let fetcher = MeetingFetcher::new(&client, LocatorConfig::with_base(&server.uri()), &progress);

    let mut session = Session::new(march(4), dir.path())
        .with_auto_fetch(false)
        .with_purge(true)
        .with_songs(vec!["7".to_string(), "151".to_string()]);
    fetcher.fetch(&mut session, MeetingKind::Midweek).await.unwrap();

    assert!(!dir.path().join("stale.mp4").exists());
    assert_eq!(read(&dir, "7.mp4").await, MEDIA_BYTES);
    assert_eq!(read(&dir, "151.mp4").await, MEDIA_BYTES);
}

#[tokio::test]
async fn test_unpublished_issue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/GETPUBMEDIALINKS"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = test_client();
    let progress = RecordingProgress::new();
    let fetcher = MeetingFetcher::new(&client, LocatorConfig::with_base(&server.uri()), &progress);

    let mut session = Session::new(march(4), dir.path());
    let err = fetcher
        .fetch(&mut session, MeetingKind::Midweek)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.category(), "media");
}
