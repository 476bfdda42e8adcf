//! Service configuration - every tunable as a TOML value
//!
//! Each section implements `Default` with the values the service has always
//! used, so running without a config file behaves exactly like the
//! built-in policy (7-day trends, 10 recent comments, 2.5 satisfaction bar,
//! ±2 sentiment thresholds, UTC calendar days).

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "FEELRATE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "feelrate.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$FEELRATE_CONFIG`
/// 2. `./feelrate.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub sentiment: SentimentConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order, falling back to
    /// defaults when a file is missing or invalid.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", CONFIG_ENV);
                        return config;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from {}, falling back",
                            CONFIG_ENV
                        );
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys produce warnings only.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of file/default values.
    ///
    /// - `FEELRATE_SERVER_ADDR` or `PORT` (binds 0.0.0.0)
    /// - `FEELRATE_DATA_DIR`
    /// - `FEELRATE_ADMIN_USERNAME`, `FEELRATE_ADMIN_PASSWORD`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("FEELRATE_SERVER_ADDR") {
            self.server.addr = addr;
        } else if let Ok(port) = std::env::var("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.addr = format!("0.0.0.0:{p}"),
                Err(_) => warn!(port = %port, "Ignoring invalid PORT"),
            }
        }
        if let Ok(dir) = std::env::var("FEELRATE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(user) = std::env::var("FEELRATE_ADMIN_USERNAME") {
            self.auth.admin_username = user;
        }
        if let Ok(password) = std::env::var("FEELRATE_ADMIN_PASSWORD") {
            self.auth.admin_password = password;
        }
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate every section, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.server.addr.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "server.addr '{}' is not a valid socket address",
                self.server.addr
            ));
        }
        if self.server.max_body_bytes == 0 {
            errors.push("server.max_body_bytes must be > 0".to_string());
        }

        if self.storage.list_limit == 0 {
            errors.push("storage.list_limit must be > 0".to_string());
        }

        let a = &self.analytics;
        if !(1..=90).contains(&a.trend_days) {
            errors.push(format!(
                "analytics.trend_days must be between 1 and 90, got {}",
                a.trend_days
            ));
        }
        if a.recent_comments_limit == 0 {
            errors.push("analytics.recent_comments_limit must be > 0".to_string());
        }
        if !a.positive_threshold.is_finite() || !(1.0..=3.0).contains(&a.positive_threshold) {
            errors.push(format!(
                "analytics.positive_threshold must be within the 1.0-3.0 rating scale, got {}",
                a.positive_threshold
            ));
        }
        if a.timezone().is_none() {
            errors.push(format!(
                "analytics.utc_offset_minutes must be within ±{} minutes, got {}",
                MAX_UTC_OFFSET_MINUTES, a.utc_offset_minutes
            ));
        }

        let s = &self.sentiment;
        if !s.positive_above.is_finite() || !s.negative_below.is_finite() {
            errors.push("sentiment thresholds must be finite numbers".to_string());
        } else if s.negative_below > s.positive_above {
            errors.push(format!(
                "sentiment.negative_below ({}) must not exceed positive_above ({})",
                s.negative_below, s.positive_above
            ));
        }

        if self.ingest.max_comment_chars == 0 {
            errors.push("ingest.max_comment_chars must be > 0".to_string());
        }

        if self.auth.admin_username.trim().is_empty() {
            errors.push("auth.admin_username must not be empty".to_string());
        }
        if self.auth.session_ttl_minutes == 0 {
            errors.push("auth.session_ttl_minutes must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address. Overridden by `FEELRATE_SERVER_ADDR`, `PORT` or `--addr`.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// Maximum accepted request body size.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_server_addr() -> String { "0.0.0.0:5000".to_string() }
fn default_max_body_bytes() -> usize { 64 * 1024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sled database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum number of records returned by the feedback listing.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

fn default_data_dir() -> PathBuf { PathBuf::from("./data") }
fn default_list_limit() -> usize { 1000 }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            list_limit: default_list_limit(),
        }
    }
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("feedback.db")
    }
}

// ============================================================================
// Analytics
// ============================================================================

/// Largest accepted UTC offset (14 hours).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Number of calendar days in the trend series, ending today.
    #[serde(default = "default_trend_days")]
    pub trend_days: u32,

    /// Cap on the recent comments list.
    #[serde(default = "default_recent_comments_limit")]
    pub recent_comments_limit: usize,

    /// Mean rating at or above which a visit counts as satisfied.
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f64,

    /// Offset used for calendar-day, week and month boundaries. 0 = UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_trend_days() -> u32 { 7 }
fn default_recent_comments_limit() -> usize { 10 }
fn default_positive_threshold() -> f64 { 2.5 }

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            trend_days: default_trend_days(),
            recent_comments_limit: default_recent_comments_limit(),
            positive_threshold: default_positive_threshold(),
            utc_offset_minutes: 0,
        }
    }
}

impl AnalyticsConfig {
    /// Reporting timezone, or `None` when the offset is out of range.
    pub fn timezone(&self) -> Option<FixedOffset> {
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return None;
        }
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
    }
}

// ============================================================================
// Sentiment
// ============================================================================

/// Sentiment labelling. Labels are stored with each record at ingestion, so
/// changing the thresholds or overrides only affects feedback received after
/// the change; existing records keep the label they were given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// Scores strictly above this are positive.
    #[serde(default = "default_positive_above")]
    pub positive_above: f64,

    /// Scores strictly below this are negative.
    #[serde(default = "default_negative_below")]
    pub negative_below: f64,

    /// Extra or replacement lexicon entries, word -> valence.
    #[serde(default)]
    pub lexicon_overrides: BTreeMap<String, i32>,
}

fn default_positive_above() -> f64 { 2.0 }
fn default_negative_below() -> f64 { -2.0 }

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            positive_above: default_positive_above(),
            negative_below: default_negative_below(),
            lexicon_overrides: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Ingest
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Longest accepted comment, in characters.
    #[serde(default = "default_max_comment_chars")]
    pub max_comment_chars: usize,
}

fn default_max_comment_chars() -> usize { 2000 }

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_comment_chars: default_max_comment_chars(),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// Admin password. Empty disables admin login.
    #[serde(default)]
    pub admin_password: String,

    /// Lifetime of an issued session.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: u64,
}

fn default_admin_username() -> String { "admin".to_string() }
fn default_session_ttl() -> u64 { 480 }

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password: String::new(),
            session_ttl_minutes: default_session_ttl(),
        }
    }
}
