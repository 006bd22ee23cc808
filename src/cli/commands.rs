//! Command handlers for the Meeting Media CLI
//!
//! This module connects parsed arguments and the loaded configuration to the
//! fetch pipeline and the configuration file.

use std::path::PathBuf;

use chrono::Local;
use tracing::{debug, info};

use crate::app::{FetchStats, MediaClient, MeetingFetcher, MeetingKind, Session};
use crate::cli::{ConfigAction, ConfigArgs, FetchArgs, TerminalProgress};
use crate::config::AppConfig;
use crate::errors::Result;

/// Handle the `midweek` and `weekend` commands
///
/// Builds a session from the configuration overlaid with the command-line
/// options, runs the fetch and prints a summary.
pub async fn handle_meeting(kind: MeetingKind, args: FetchArgs, config: &AppConfig) -> Result<()> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let mut session = args.apply(config.to_session(date));
    debug!("Session: {:?}", session);

    let (client_config, locator_config) = config.to_runtime_config();
    let client = MediaClient::with_config(client_config)?;
    let progress = TerminalProgress::new();
    let fetcher = MeetingFetcher::new(&client, locator_config, &progress);

    let stats = fetcher.fetch(&mut session, kind).await?;
    print_summary(&stats, &session);
    Ok(())
}

fn print_summary(stats: &FetchStats, session: &Session) {
    if stats.dry_run {
        println!("Dry run for the {} meeting, week of {}:", stats.kind, stats.week);
    } else {
        println!(
            "✅ {} meeting media for week of {} saved to {}",
            stats.kind,
            stats.week,
            session.save_location.display()
        );
    }

    if !session.songs.is_empty() {
        println!("  Songs:    {}", session.songs.join(", "));
    }
    if stats.videos > 0 {
        let names: Vec<_> = session
            .videos
            .iter()
            .map(|video| {
                if video.name.is_empty() {
                    video.to_string()
                } else {
                    video.name.clone()
                }
            })
            .collect();
        println!("  Videos:   {}", names.join(", "));
    }
    if stats.pictures > 0 {
        let names: Vec<_> = session.pictures.iter().map(|p| p.name.as_str()).collect();
        println!("  Pictures: {}", names.join(", "));
    }
    if let Some(ref playlist) = stats.playlist {
        println!("  Playlist: {}", playlist.display());
    }
    if !stats.dry_run {
        println!(
            "  {} file(s), {:.1} MB downloaded",
            stats.files(),
            stats.bytes_downloaded as f64 / 1_048_576.0
        );
    }
}

/// Handle the `config` command
pub async fn handle_config(args: ConfigArgs, config_override: Option<PathBuf>) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let path = config_file_path(config_override.clone())?;
            let config = AppConfig::load(config_override).await?;
            if path.exists() {
                println!("# {}", path.display());
            } else {
                println!("# No configuration file, showing defaults");
            }
            print!("{}", config.to_toml_string()?);
        }
        ConfigAction::Init => match config_override {
            Some(path) if path.exists() => {
                println!("Configuration already exists: {}", path.display());
            }
            Some(path) => {
                AppConfig::default().save(&path).await?;
                println!("📁 Created configuration file: {}", path.display());
            }
            None => {
                if let Some(path) = AppConfig::initialize_first_run().await? {
                    info!("Configuration file: {}", path.display());
                    println!("Configuration file: {}", path.display());
                }
            }
        },
        ConfigAction::Set { key, value } => {
            let path = config_file_path(config_override)?;
            let mut config = if path.exists() {
                AppConfig::load_from_file(&path).await?
            } else {
                AppConfig::default()
            };
            config.set(&key, &value)?;
            config.save(&path).await?;
            println!("Set {} = {} in {}", key, value, path.display());
        }
    }
    Ok(())
}

/// File a `config` command reads or writes
///
/// An explicit path wins, then the first existing file in the search order,
/// then the user default.
fn config_file_path(config_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = config_override {
        return Ok(path);
    }
    match AppConfig::find_config_file()? {
        Some(path) => Ok(path),
        None => Ok(AppConfig::default_config_path()?),
    }
}
