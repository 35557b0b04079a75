//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::{IpAddr, SocketAddr},
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    time::Duration,
};

use clap::{Args, Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite://brusio.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_POSTS_PER_PAGE: u32 = 10;
const DEFAULT_HOME_CACHE_TTL_SECS: u64 = 20;
const DEFAULT_CACHE_MAX_PAGES: usize = 64;
const DEFAULT_UPLOADS_DIR: &str = "media";
const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Command-line arguments for the Brusio binary.
#[derive(Debug, Parser)]
#[command(name = "brusio", version, about = "Brusio publishing server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BRUSIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Create a group that posts can be assigned to.
    #[command(name = "add-group")]
    AddGroup(AddGroupArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listening address, e.g. 0.0.0.0:8080.
    #[arg(long = "bind", value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long = "log-json")]
    pub log_json: bool,

    /// Override the number of posts per listing page.
    #[arg(long = "posts-per-page", value_name = "COUNT")]
    pub posts_per_page: Option<u32>,

    /// Override the home-page cache TTL in seconds; 0 disables the cache.
    #[arg(long = "home-cache-ttl-seconds", value_name = "SECS")]
    pub home_cache_ttl_seconds: Option<u64>,

    /// Override the directory where uploaded images are stored.
    #[arg(long = "uploads-dir", value_name = "PATH")]
    pub uploads_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct AddGroupArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub slug: String,
    #[arg(long, default_value = "")]
    pub description: String,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawSettings {
    pub server: RawServerSettings,
    pub database: RawDatabaseSettings,
    pub logging: RawLoggingSettings,
    pub feed: RawFeedSettings,
    pub cache: RawCacheSettings,
    pub uploads: RawUploadsSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawDatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawLoggingSettings {
    pub level: Option<String>,
    pub json: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawFeedSettings {
    pub posts_per_page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawCacheSettings {
    pub home_ttl_seconds: Option<u64>,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawUploadsSettings {
    pub directory: Option<PathBuf>,
    pub max_request_bytes: Option<usize>,
}

impl RawSettings {
    pub fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(bind) = overrides.bind {
            self.server.host = Some(bind.ip().to_string());
            self.server.port = Some(bind.port());
        }
        if let Some(url) = &overrides.database_url {
            self.database.url = Some(url.clone());
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = Some(level.clone());
        }
        if overrides.log_json {
            self.logging.json = Some(true);
        }
        if let Some(posts_per_page) = overrides.posts_per_page {
            self.feed.posts_per_page = Some(posts_per_page);
        }
        if let Some(ttl) = overrides.home_cache_ttl_seconds {
            self.cache.home_ttl_seconds = Some(ttl);
        }
        if let Some(dir) = &overrides.uploads_dir {
            self.uploads.directory = Some(dir.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub posts_per_page: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Zero disables the home-page cache.
    pub home_ttl: Duration,
    pub max_pages: NonZeroUsize,
}

impl CacheSettings {
    pub fn is_enabled(&self) -> bool {
        !self.home_ttl.is_zero()
    }
}

#[derive(Debug, Clone)]
pub struct UploadsSettings {
    pub directory: PathBuf,
    pub max_request_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub feed: FeedSettings,
    pub cache: CacheSettings,
    pub uploads: UploadsSettings,
}

impl Settings {
    pub fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let host: IpAddr = raw
            .server
            .host
            .as_deref()
            .unwrap_or(DEFAULT_HOST)
            .parse()
            .map_err(|err| ConfigError::invalid("server.host", format!("{err}")))?;
        let port = raw.server.port.unwrap_or(DEFAULT_PORT);

        let level = match raw.logging.level.as_deref() {
            None => LevelFilter::INFO,
            Some(value) => value
                .parse()
                .map_err(|err| ConfigError::invalid("logging.level", format!("{err}")))?,
        };
        let format = if raw.logging.json.unwrap_or(false) {
            LogFormat::Json
        } else {
            LogFormat::Compact
        };

        let posts_per_page = raw.feed.posts_per_page.unwrap_or(DEFAULT_POSTS_PER_PAGE);
        let posts_per_page = NonZeroU32::new(posts_per_page).ok_or_else(|| {
            ConfigError::invalid("feed.posts_per_page", "must be at least 1")
        })?;

        let max_pages = raw.cache.max_pages.unwrap_or(DEFAULT_CACHE_MAX_PAGES);
        let max_pages = NonZeroUsize::new(max_pages)
            .ok_or_else(|| ConfigError::invalid("cache.max_pages", "must be at least 1"))?;

        Ok(Self {
            server: ServerSettings {
                bind: SocketAddr::new(host, port),
            },
            database: DatabaseSettings {
                url: raw
                    .database
                    .url
                    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                max_connections: raw
                    .database
                    .max_connections
                    .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            },
            logging: LoggingSettings { level, format },
            feed: FeedSettings { posts_per_page },
            cache: CacheSettings {
                home_ttl: Duration::from_secs(
                    raw.cache
                        .home_ttl_seconds
                        .unwrap_or(DEFAULT_HOME_CACHE_TTL_SECS),
                ),
                max_pages,
            },
            uploads: UploadsSettings {
                directory: raw
                    .uploads
                    .directory
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR)),
                max_request_bytes: raw
                    .uploads
                    .max_request_bytes
                    .unwrap_or(DEFAULT_UPLOAD_LIMIT_BYTES),
            },
        })
    }
}

fn load_raw(config_file: Option<&PathBuf>) -> Result<RawSettings, ConfigError> {
    let mut builder =
        Config::builder().add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false));
    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }
    let loaded = builder
        .add_source(Environment::with_prefix("BRUSIO").separator("__"))
        .build()?;
    Ok(loaded.try_deserialize()?)
}

/// Parse the CLI and produce validated settings with CLI overrides applied.
pub fn load_with_cli() -> Result<(CliArgs, Settings), ConfigError> {
    let cli = CliArgs::parse();
    let mut raw = load_raw(cli.config_file.as_ref())?;

    match &cli.command {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::AddGroup(args)) => {
            if let Some(url) = &args.database_url {
                raw.database.url = Some(url.clone());
            }
        }
        None => {}
    }

    let settings = Settings::from_raw(raw)?;
    Ok((cli, settings))
}

#[cfg(test)]
mod tests;
