//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. User config is
//! sparse: values from the file are merged on top of the stock defaults, so a
//! file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! name = "Simple Bistro"
//! tagline = "Grilled to order, every night"
//! currency = "$"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//!
//! [store]
//! backend = "memory"        # "memory" or "firestore"
//! endpoint = "https://firestore.googleapis.com/v1"
//! project_id = ""
//! database = "(default)"
//! api_key = ""
//!
//! [media]
//! backend = "memory"        # "memory" or "cloudinary"
//! endpoint = "https://api.cloudinary.com/v1_1"
//! cloud_name = ""
//! upload_preset = ""
//! folder = "restaurant"
//! max_upload_bytes = 10485760
//! api_key = ""
//! api_secret = ""
//!
//! [admin]
//! email = "admin@example.com"
//! password_sha256 = ""      # `simple-bistro hash-password` prints one
//! session_hours = 12
//! ```
//!
//! ## Credentials From the Environment
//!
//! Credentials can be kept out of the file. When set, these variables
//! override the matching keys:
//!
//! | Variable | Key |
//! |----------|-----|
//! | `STORE_API_KEY` | `store.api_key` |
//! | `STORE_ACCESS_TOKEN` | `store.access_token` (env only) |
//! | `MEDIA_UPLOAD_PRESET` | `media.upload_preset` |
//! | `MEDIA_API_KEY` | `media.api_key` |
//! | `MEDIA_API_SECRET` | `media.api_secret` |
//! | `ADMIN_PASSWORD_SHA256` | `admin.password_sha256` |
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Public-facing restaurant details.
    pub site: SiteInfo,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Content Store connection.
    pub store: StoreConfig,
    /// Media Host connection and upload limits.
    pub media: MediaConfig,
    /// The single admin identity.
    pub admin: AdminConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port must be non-zero".into()));
        }
        if self.media.max_upload_bytes == 0 {
            return Err(ConfigError::Validation(
                "media.max_upload_bytes must be non-zero".into(),
            ));
        }
        if self.admin.session_hours == 0 {
            return Err(ConfigError::Validation(
                "admin.session_hours must be non-zero".into(),
            ));
        }
        if self.store.backend == StoreBackend::Firestore && self.store.project_id.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "store.project_id is required for the firestore backend".into(),
            ));
        }
        if self.media.backend == MediaBackend::Cloudinary
            && (self.media.cloud_name.trim().is_empty() || self.media.upload_preset.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "media.cloud_name and media.upload_preset are required for the cloudinary backend"
                    .into(),
            ));
        }
        let hash = &self.admin.password_sha256;
        if !hash.is_empty() && (hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit())) {
            return Err(ConfigError::Validation(
                "admin.password_sha256 must be 64 hex characters".into(),
            ));
        }
        Ok(())
    }

    /// Override credential keys from environment-style lookups.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// wipe a key set in the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("STORE_API_KEY") {
            self.store.api_key = v;
        }
        if let Some(v) = get("STORE_ACCESS_TOKEN") {
            self.store.access_token = Some(v);
        }
        if let Some(v) = get("MEDIA_UPLOAD_PRESET") {
            self.media.upload_preset = v;
        }
        if let Some(v) = get("MEDIA_API_KEY") {
            self.media.api_key = v;
        }
        if let Some(v) = get("MEDIA_API_SECRET") {
            self.media.api_secret = v;
        }
        if let Some(v) = get("ADMIN_PASSWORD_SHA256") {
            self.admin.password_sha256 = v.to_ascii_lowercase();
        }
    }
}

/// Public-facing restaurant details shown in the page header and footer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    pub name: String,
    pub tagline: String,
    /// Prefix rendered before dish prices.
    pub currency: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: "Simple Bistro".to_string(),
            tagline: "Grilled to order, every night".to_string(),
            currency: "$".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store. Content is lost on restart.
    #[default]
    Memory,
    /// Firestore REST API.
    Firestore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Base URL of the REST API, without the `/projects/...` suffix.
    pub endpoint: String,
    pub project_id: String,
    pub database: String,
    pub api_key: String,
    /// OAuth bearer token. Only ever read from `STORE_ACCESS_TOKEN`.
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            endpoint: "https://firestore.googleapis.com/v1".to_string(),
            project_id: String::new(),
            database: "(default)".to_string(),
            api_key: String::new(),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    /// Records uploads in memory and hands back placeholder URLs.
    #[default]
    Memory,
    /// Cloudinary unsigned uploads.
    Cloudinary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    pub endpoint: String,
    pub cloud_name: String,
    pub upload_preset: String,
    /// Destination folder on the media host. Every upload lands here.
    pub folder: String,
    /// Uploads larger than this are rejected before any network call.
    pub max_upload_bytes: usize,
    /// Signed-API credentials. Only needed to delete media after a failed save.
    pub api_key: String,
    pub api_secret: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            backend: MediaBackend::Memory,
            endpoint: "https://api.cloudinary.com/v1_1".to_string(),
            cloud_name: String::new(),
            upload_preset: String::new(),
            folder: "restaurant".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            api_key: String::new(),
            api_secret: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminConfig {
    pub email: String,
    /// Lowercase hex SHA-256 of the admin password. Empty disables login.
    pub password_sha256: String,
    pub session_hours: u32,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: "admin@example.com".to_string(),
            password_sha256: String::new(),
            session_hours: 12,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, apply credential overrides from the
/// process environment, and validate.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// [`load_config`] with an explicit environment lookup.
pub fn load_config_with_env<F>(path: &Path, lookup: F) -> Result<SiteConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    let mut config = resolve_config(base, overlay)?;
    config.apply_env(lookup);
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Bistro Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# Credentials may be supplied through the environment instead of this file:
#   STORE_API_KEY, STORE_ACCESS_TOKEN, MEDIA_UPLOAD_PRESET,
#   MEDIA_API_KEY, MEDIA_API_SECRET, ADMIN_PASSWORD_SHA256

# ---------------------------------------------------------------------------
# Restaurant details
# ---------------------------------------------------------------------------
[site]
name = "Simple Bistro"
tagline = "Grilled to order, every night"
# Prefix rendered before dish prices.
currency = "$"

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
host = "127.0.0.1"
port = 3000

# ---------------------------------------------------------------------------
# Content store (posts, dishes, categories)
# ---------------------------------------------------------------------------
[store]
# "memory" keeps everything in process (lost on restart).
# "firestore" talks to the Firestore REST API.
backend = "memory"
endpoint = "https://firestore.googleapis.com/v1"
project_id = ""
database = "(default)"
api_key = ""

# ---------------------------------------------------------------------------
# Media host (image uploads)
# ---------------------------------------------------------------------------
[media]
# "memory" hands back placeholder URLs; "cloudinary" uploads for real.
backend = "memory"
endpoint = "https://api.cloudinary.com/v1_1"
cloud_name = ""
upload_preset = ""
# Every upload lands in this folder.
folder = "restaurant"
# Larger files are rejected before upload (10 MiB).
max_upload_bytes = 10485760
# Signed credentials, only used to delete an image when saving fails.
api_key = ""
api_secret = ""

# ---------------------------------------------------------------------------
# Admin login
# ---------------------------------------------------------------------------
[admin]
email = "admin@example.com"
# Lowercase hex SHA-256 of the password; run `simple-bistro hash-password`.
# Empty disables login entirely.
password_sha256 = ""
session_hours = 12
"##
}
