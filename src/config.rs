//! Configuration management for Meeting Media
//!
//! Settings persist in a TOML file so the choices made on one run (language,
//! resolution, output directory, feature switches) carry over to the next. A
//! default file is written on first run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClientConfig, LocatorConfig, Resolution, Session};
use crate::constants::{api, config as paths, http, limits};
use crate::errors::{ConfigError, ConfigResult, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// What to fetch and where to put it
    pub meeting: MeetingConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Media API endpoints
    pub api: ApiConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Meeting settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingConfigToml {
    /// MEPS language symbol
    pub language: String,
    /// One of 240p, 360p, 480p, 720p
    pub resolution: String,
    pub save_location: PathBuf,
    pub fetch_other_media: bool,
    pub auto_fetch: bool,
    pub create_playlist: bool,
    pub purge_dir: bool,
    /// Publications whose videos may be fetched (empty = all)
    pub pub_symbols: Vec<String>,
}

impl Default for MeetingConfigToml {
    fn default() -> Self {
        Self {
            language: paths::DEFAULT_LANGUAGE.to_string(),
            resolution: Resolution::P720.label().to_string(),
            save_location: default_save_location(),
            fetch_other_media: true,
            auto_fetch: true,
            create_playlist: true,
            purge_dir: false,
            pub_symbols: Vec::new(),
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP keep-alive timeout in seconds (None = disabled)
    pub tcp_keepalive_secs: Option<u64>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// Retries on transient failures
    pub max_retries: u32,
    /// First retry delay in milliseconds
    pub retry_base_delay_ms: u64,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_keepalive_secs: Some(30),
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            max_retries: limits::MAX_RETRIES,
            retry_base_delay_ms: limits::RETRY_BASE_DELAY_MS,
        }
    }
}

/// Media API endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfigToml {
    pub media_links_url: String,
    pub media_items_url: String,
}

impl Default for ApiConfigToml {
    fn default() -> Self {
        Self {
            media_links_url: api::MEDIA_LINKS_URL.to_string(),
            media_items_url: api::MEDIA_ITEMS_URL.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
    /// Enable colored output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            colored_output: true,
        }
    }
}

fn default_save_location() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join(paths::DEFAULT_SAVE_DIR))
        .unwrap_or_else(|| PathBuf::from(paths::DEFAULT_SAVE_DIR))
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (ClientConfig, LocatorConfig) {
        (
            self.client.to_runtime_config(),
            self.api.to_runtime_config(),
        )
    }

    /// Session for the week containing `date`, carrying the persisted settings
    pub fn to_session(&self, date: NaiveDate) -> Session {
        let meeting = &self.meeting;
        Session::new(date, meeting.save_location.clone())
            .with_language(meeting.language.clone())
            .with_resolution(meeting.resolution.clone())
            .with_other_media(meeting.fetch_other_media)
            .with_auto_fetch(meeting.auto_fetch)
            .with_playlist(meeting.create_playlist)
            .with_purge(meeting.purge_dir)
            .with_pub_symbols(meeting.pub_symbols.clone())
    }

    /// Check values serde cannot
    pub fn validate(&self) -> ConfigResult<()> {
        if self.meeting.language.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "meeting.language".to_string(),
                value: self.meeting.language.clone(),
                reason: "A language symbol such as E is required".to_string(),
            });
        }
        if Resolution::from_label(&self.meeting.resolution).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "meeting.resolution".to_string(),
                value: self.meeting.resolution.clone(),
                reason: "Expected one of 240p, 360p, 480p, 720p".to_string(),
            });
        }
        if self.client.rate_limit_rps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.rate_limit_rps".to_string(),
                value: "0".to_string(),
                reason: "Rate limit must be at least 1".to_string(),
            });
        }
        if self.client.max_retries > limits::MAX_RETRIES_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "client.max_retries".to_string(),
                value: self.client.max_retries.to_string(),
                reason: format!("At most {} retries are allowed", limits::MAX_RETRIES_LIMIT),
            });
        }
        Ok(())
    }

    /// Load configuration:
    /// 1. Default values
    /// 2. Config file (explicit path, else the first one found)
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(ref path) => Some(path.clone()),
            None => Self::find_config_file()?,
        };

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                config = Self::load_from_file(&path).await?;
            } else if config_file_override.is_some() {
                return Err(ConfigError::NotFound { path }.into());
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Initialize configuration on first run
    ///
    /// Creates a default config file if none exists and notifies the user
    pub async fn initialize_first_run() -> Result<Option<PathBuf>> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            return Ok(Some(config_path));
        }

        info!("Creating default configuration file...");
        Self::default().save(&config_path).await?;

        println!("📁 Created default configuration file:");
        println!("   {}", config_path.display());
        println!("   You can customize settings by editing this file.");
        println!();

        Ok(Some(config_path))
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> ConfigResult<Option<PathBuf>> {
        let search_paths = vec![
            // Project-local config
            PathBuf::from(".").join(paths::LOCAL_CONFIG_FILE),
            // User config
            Self::default_config_path()?,
        ];

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Ok(Some(path));
            }
        }

        debug!("No config file found in standard locations");
        Ok(None)
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::MissingField {
            field: "user config directory".to_string(),
        })?;

        Ok(config_dir
            .join(paths::CONFIG_DIR_NAME)
            .join(paths::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Write the configuration to `path`, creating parent directories
    pub async fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let content = self.to_toml_string()?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Change one setting by its dotted key, e.g. `meeting.resolution`
    pub fn set(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let mut updated = self.clone();
        updated.apply(key, value)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn apply(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        match key {
            "meeting.language" => self.meeting.language = value.trim().to_string(),
            "meeting.resolution" => {
                let resolution: Resolution =
                    value.parse().map_err(|reason| ConfigError::InvalidValue {
                        field: key.to_string(),
                        value: value.to_string(),
                        reason,
                    })?;
                self.meeting.resolution = resolution.label().to_string();
            }
            "meeting.save_location" => self.meeting.save_location = PathBuf::from(value),
            "meeting.fetch_other_media" => self.meeting.fetch_other_media = parse_bool(key, value)?,
            "meeting.auto_fetch" => self.meeting.auto_fetch = parse_bool(key, value)?,
            "meeting.create_playlist" => self.meeting.create_playlist = parse_bool(key, value)?,
            "meeting.purge_dir" => self.meeting.purge_dir = parse_bool(key, value)?,
            "meeting.pub_symbols" => {
                self.meeting.pub_symbols = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "client.rate_limit_rps" => self.client.rate_limit_rps = parse_number(key, value)?,
            "client.max_retries" => self.client.max_retries = parse_number(key, value)?,
            "client.request_timeout_secs" => {
                self.client.request_timeout_secs = parse_number(key, value)?
            }
            "logging.level" => self.logging.level = value.trim().to_lowercase(),
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: key.to_string(),
                    value: value.to_string(),
                    reason: "Unknown setting".to_string(),
                })
            }
        }
        Ok(())
    }

    /// Serialized form written by `save`, with a commented header
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        let body = toml::to_string_pretty(self)?;
        Ok(format!(
            "# Meeting Media Configuration\n\
             # Edit by hand or with `meeting-media config set <key> <value>`.\n\
             # resolution: 240p | 360p | 480p | 720p\n\
             # pub_symbols: publications whose videos may be fetched (empty = all)\n\n\
             {}",
            body
        ))
    }
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: key.to_string(),
            value: value.to_string(),
            reason: "Expected true or false".to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: key.to_string(),
        value: value.to_string(),
        reason: "Expected a whole number".to_string(),
    })
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            tcp_keepalive: self.tcp_keepalive_secs.map(Duration::from_secs),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            rate_limit_rps: self.rate_limit_rps,
            max_retries: self.max_retries,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}

impl ApiConfigToml {
    /// Convert to runtime LocatorConfig
    pub fn to_runtime_config(&self) -> LocatorConfig {
        LocatorConfig {
            media_links_url: self.media_links_url.clone(),
            media_items_url: self.media_items_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();

        assert_eq!(config.meeting.language, "E");
        assert_eq!(config.meeting.resolution, "720p");
        assert_eq!(config.client.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.api.media_links_url, api::MEDIA_LINKS_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_content_round_trips() {
        let config = AppConfig::default();
        let content = config.to_toml_string().unwrap();

        assert!(content.starts_with("# Meeting Media Configuration"));
        assert!(content.contains("[meeting]"));
        assert!(content.contains("[client]"));
        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, config);
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_config_loading_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("meeting-media.toml");

        let test_config = r#"
[meeting]
language = "S"
resolution = "480p"
pub_symbols = ["lmd", "th"]

[logging]
level = "debug"
"#;
        tokio::fs::write(&config_path, test_config).await.unwrap();

        let config = AppConfig::load(Some(config_path)).await.unwrap();

        assert_eq!(config.meeting.language, "S");
        assert_eq!(config.meeting.resolution, "480p");
        assert_eq!(config.meeting.pub_symbols, vec!["lmd", "th"]);
        assert_eq!(config.logging.level, "debug");

        // Unspecified values keep their defaults
        assert!(config.meeting.auto_fetch);
        assert_eq!(config.client.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
    }

    #[tokio::test]
    async fn test_invalid_resolution_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        tokio::fs::write(&config_path, "[meeting]\nresolution = \"4k\"\n")
            .await
            .unwrap();

        let err = AppConfig::load(Some(config_path)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "meeting.resolution"
        ));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        tokio::fs::write(&config_path, "[meeting\nlanguage = ").await.unwrap();

        let err = AppConfig::load(Some(config_path)).await.unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.set("meeting.purge_dir", "yes").unwrap();
        config.set("meeting.pub_symbols", "lmd, th,").unwrap();
        config.save(&config_path).await.unwrap();

        let reloaded = AppConfig::load_from_file(&config_path).await.unwrap();
        assert_eq!(reloaded, config);
        assert!(reloaded.meeting.purge_dir);
        assert_eq!(reloaded.meeting.pub_symbols, vec!["lmd", "th"]);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(config.set("meeting.resolution", "1080p").is_err());
        assert!(config.set("meeting.auto_fetch", "maybe").is_err());
        assert!(config.set("client.rate_limit_rps", "fast").is_err());
        assert!(config.set("no.such.key", "1").is_err());
        assert!(matches!(
            config.set("client.max_retries", "40"),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "client.max_retries"
        ));
        assert_eq!(config, AppConfig::default());
        config.set("client.max_retries", "10").unwrap();
        assert_eq!(config.client.max_retries, 10);

        config.set("meeting.resolution", "360p").unwrap();
        assert_eq!(config.meeting.resolution, "360p");
    }

    #[test]
    fn test_to_session() {
        let mut config = AppConfig::default();
        config.meeting.save_location = PathBuf::from("/tmp/meeting");
        config.meeting.language = "S".to_string();

        let session = config.to_session(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(session.week, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(session.language, "S");
        assert_eq!(session.save_location, PathBuf::from("/tmp/meeting"));
        assert!(session.create_playlist);
        assert!(session.songs.is_empty());
    }

    #[test]
    fn test_runtime_conversion() {
        let mut config = AppConfig::default();
        config.client.retry_base_delay_ms = 250;
        let (client, locator) = config.to_runtime_config();
        assert_eq!(client.retry_base_delay, Duration::from_millis(250));
        assert_eq!(locator, LocatorConfig::default());
    }
}
