//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.readpick/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::net::LogLevel;
use crate::net::transport::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::store::FileTokenStore;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReadPickConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HttpConfig {
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub log_level: Option<LogLevel>,
    pub redact_headers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    pub token_file: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub http_log: LogLevel,
    pub redact_headers: Vec<String>,
    pub token_path: PathBuf,
}

/// Flags that can override everything else.
#[derive(Debug, Default)]
pub struct CliOverrides<'a> {
    pub base_url: Option<&'a str>,
    pub http_log: Option<LogLevel>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// `~/.readpick/`
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".readpick"))
}

/// Returns the path to `~/.readpick/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.readpick/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ReadPickConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ReadPickConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ReadPickConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<ReadPickConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(ReadPickConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ReadPickConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# ReadPick Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [api]
# base_url = "http://localhost:8080"   # Or set READPICK_BASE_URL

# [http]
# connect_timeout_secs = 10
# request_timeout_secs = 30
# log_level = "none"                   # "none", "basic", "headers", "body"; or READPICK_HTTP_LOG
# redact_headers = ["Authorization"]   # Values masked in HTTP logs

# [auth]
# token_file = "auth.json"             # Relative to ~/.readpick/
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

fn parse_log_level(raw: &str) -> Option<LogLevel> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "none" => Some(LogLevel::None),
        "basic" => Some(LogLevel::Basic),
        "headers" => Some(LogLevel::Headers),
        "body" => Some(LogLevel::Body),
        other => {
            warn!("Ignoring unknown READPICK_HTTP_LOG value: {}", other);
            None
        }
    }
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ReadPickConfig, cli: &CliOverrides<'_>) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli
        .base_url
        .map(|s| s.to_string())
        .or_else(|| std::env::var("READPICK_BASE_URL").ok())
        .or_else(|| config.api.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // HTTP log level: CLI → env → config → default
    let http_log = cli
        .http_log
        .or_else(|| {
            std::env::var("READPICK_HTTP_LOG")
                .ok()
                .and_then(|v| parse_log_level(&v))
        })
        .or(config.http.log_level)
        .unwrap_or_default();

    let redact_headers = config
        .http
        .redact_headers
        .clone()
        .unwrap_or_else(|| vec![crate::net::AUTHORIZATION.to_string()]);

    ResolvedConfig {
        base_url,
        connect_timeout_secs: config
            .http
            .connect_timeout_secs
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        request_timeout_secs: config
            .http
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        http_log,
        redact_headers,
        token_path: resolve_token_path(config),
    }
}

/// Token file: config (relative to `~/.readpick/`, or absolute) → default.
fn resolve_token_path(config: &ReadPickConfig) -> PathBuf {
    if let Some(ref file) = config.auth.token_file {
        let candidate = PathBuf::from(file);
        if candidate.is_absolute() {
            return candidate;
        }
        if let Some(dir) = config_dir() {
            return dir.join(candidate);
        }
    }

    FileTokenStore::default_path().unwrap_or_else(|| PathBuf::from("auth.json"))
}
