//! Command-line argument parsing for Meeting Media
//!
//! This module defines the CLI structure using clap derive macros: one
//! subcommand per meeting plus configuration management.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::app::{MeetingKind, Resolution, Session};
use crate::constants::files::DATE_FORMAT;

/// Meeting Media - fetch the songs, videos and pictures for a meeting
#[derive(Parser, Debug)]
#[command(
    name = "meeting-media",
    version,
    about = "Download congregation meeting media for a given week",
    long_about = "Resolves the songs, videos and pictures a meeting uses from the week's publication,
downloads them into one directory and writes a playlist in presentation order."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch media for the midweek meeting
    Midweek(FetchArgs),

    /// Fetch media for the weekend meeting (needs the public talk song via --song)
    Weekend(FetchArgs),

    /// Show or change the configuration
    Config(ConfigArgs),
}

/// Arguments shared by the meeting commands
///
/// Options left unset fall back to the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Any date in the target week (YYYY-MM-DD, default today)
    #[arg(short, long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Song number; repeat for several. The first is the weekend talk song
    #[arg(short, long = "song", value_name = "N", value_parser = parse_song)]
    pub songs: Vec<String>,

    /// Directory to save media into
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// MEPS language symbol (e.g. E, S, F)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Video resolution: 240p, 360p, 480p or 720p
    #[arg(short, long, value_parser = parse_resolution)]
    pub resolution: Option<Resolution>,

    /// Use only the songs given with --song instead of reading the publication
    #[arg(long)]
    pub manual: bool,

    /// Also fetch videos and pictures
    #[arg(long)]
    pub other_media: bool,

    /// Write a playlist of everything fetched
    #[arg(long)]
    pub playlist: bool,

    /// Empty the output directory first
    #[arg(long)]
    pub purge: bool,

    /// Dry run - resolve everything, download and write nothing
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file if none exists
    Init,

    /// Change one setting, e.g. `config set meeting.resolution 480p`
    Set {
        /// Dotted key such as meeting.language
        key: String,
        /// New value
        value: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Level forced by the verbosity flags, `None` to use the configured level
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::WARN)
        } else if self.global.very_verbose || self.global.verbose {
            Some(tracing::Level::DEBUG)
        } else {
            None
        }
    }
}

impl Commands {
    /// Meeting kind of a fetch command
    pub fn meeting_kind(&self) -> Option<MeetingKind> {
        match self {
            Commands::Midweek(_) => Some(MeetingKind::Midweek),
            Commands::Weekend(_) => Some(MeetingKind::Weekend),
            Commands::Config(_) => None,
        }
    }
}

impl FetchArgs {
    /// Overlay the command-line options on a session built from the configuration
    pub fn apply(&self, mut session: Session) -> Session {
        if !self.songs.is_empty() {
            session.songs = self.songs.clone();
        }
        if let Some(ref output) = self.output {
            session.save_location = output.clone();
        }
        if let Some(ref language) = self.language {
            session.language = language.clone();
        }
        if let Some(resolution) = self.resolution {
            session.resolution = resolution.label().to_string();
        }
        if self.manual {
            session.auto_fetch = false;
        }
        session.fetch_other_media |= self.other_media;
        session.create_playlist |= self.playlist;
        session.purge_dir |= self.purge;
        session.dry_run = self.dry_run;
        session
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn parse_song(value: &str) -> Result<String, String> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n.to_string()),
        _ => Err(format!("'{}' is not a song number", value)),
    }
}

fn parse_resolution(value: &str) -> Result<Resolution, String> {
    value.parse()
}
