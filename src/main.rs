//! Meeting Media CLI application
//!
//! Command-line interface for fetching the songs, videos and pictures used at a
//! congregation meeting.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use meeting_media::app::MeetingKind;
use meeting_media::cli::{handle_config, handle_meeting, Cli, Commands};
use meeting_media::config::{AppConfig, LoggingConfig};
use meeting_media::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config = match cli.command {
        // `config` repairs or creates the file, so a broken one must not stop it
        Commands::Config(_) => AppConfig::load(cli.global.config.clone())
            .await
            .unwrap_or_default(),
        _ => AppConfig::load(cli.global.config.clone()).await?,
    };

    init_logging(&cli, &config.logging);

    info!("Meeting Media v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(kind) = cli.command.meeting_kind() {
        info!("Executing {} command", kind);
    }

    match cli.command {
        Commands::Midweek(args) => handle_meeting(MeetingKind::Midweek, args, &config).await,
        Commands::Weekend(args) => handle_meeting(MeetingKind::Weekend, args, &config).await,
        Commands::Config(args) => handle_config(args, cli.global.config).await,
    }
}

/// Initialize logging from the CLI verbosity flags, else the configured level
fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| logging.level.clone());

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("meeting_media={}", level)))
        .unwrap_or_else(|_| EnvFilter::new("meeting_media=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(logging.colored_output)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
