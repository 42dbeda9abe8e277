//! Configuration resolution for Octodock.
//!
//! Resolution order (lowest to highest priority):
//! 1. Built-in defaults
//! 2. Settings file (explicit path, else `~/.config/octodock/settings.json`)
//! 3. Environment variables (`OCTODOCK_*`)
//! 4. CLI arguments, applied by the binary on top of the returned value

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Octodock configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub broadcast: BroadcastConfig,
    pub rate_limit: RateLimitConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Production mode hides internal error details from responses.
    pub production: bool,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            production: false,
            max_upload_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` file path. `None` resolves to the per-user data directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-change-me".to_string(),
            token_ttl_secs: 3600,
        }
    }
}

/// Which catalog backs the media metadata index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaIndexBackend {
    #[default]
    Memory,
    Sqlite,
}

impl std::str::FromStr for MediaIndexBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Config(format!("Unknown media index backend: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MediaConfig {
    pub upload_dir: PathBuf,
    pub index: MediaIndexBackend,
    pub default_page_size: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            index: MediaIndexBackend::Memory,
            default_page_size: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BroadcastConfig {
    pub heartbeat_secs: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self { heartbeat_secs: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max: u32,
    pub message: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: 15 * 60 * 1000, // 15 minutes
            max: 100,
            message: "Too many requests, please try again later.".to_string(),
        }
    }
}

/// Load configuration with hierarchical resolution.
///
/// An explicit `path` must exist; the global settings file is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => match global_config_path() {
            Some(global) if global.exists() => load_config_file(&global)?,
            _ => Config::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Get the global settings file path.
pub fn global_config_path() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|p| p.join("octodock").join("settings.json"))
}

/// Default database location when none is configured.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".octodock").join("octodock.db"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {key}: {value}")))
}

/// Apply `OCTODOCK_*` overrides read through `lookup`.
fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(val) = lookup("OCTODOCK_ADDR") {
        config.server.addr = parse_env("OCTODOCK_ADDR", &val)?;
    }
    if let Some(val) = lookup("OCTODOCK_ENV") {
        config.server.production = val.eq_ignore_ascii_case("production");
    }
    if let Some(val) = lookup("OCTODOCK_DB_PATH") {
        config.database.path = Some(PathBuf::from(val));
    }
    if let Some(val) = lookup("OCTODOCK_JWT_SECRET") {
        config.auth.jwt_secret = val;
    }
    if let Some(val) = lookup("OCTODOCK_TOKEN_TTL") {
        config.auth.token_ttl_secs = parse_env("OCTODOCK_TOKEN_TTL", &val)?;
    }
    if let Some(val) = lookup("OCTODOCK_UPLOAD_DIR") {
        config.media.upload_dir = PathBuf::from(val);
    }
    if let Some(val) = lookup("OCTODOCK_MEDIA_INDEX") {
        config.media.index = val.parse()?;
    }
    if let Some(val) = lookup("OCTODOCK_HEARTBEAT_SECS") {
        config.broadcast.heartbeat_secs = parse_env("OCTODOCK_HEARTBEAT_SECS", &val)?;
    }
    if let Some(val) = lookup("OCTODOCK_RATE_WINDOW_MS") {
        config.rate_limit.window_ms = parse_env("OCTODOCK_RATE_WINDOW_MS", &val)?;
    }
    if let Some(val) = lookup("OCTODOCK_RATE_MAX") {
        config.rate_limit.max = parse_env("OCTODOCK_RATE_MAX", &val)?;
    }
    Ok(())
}
