//! Configuration loading for the submission services
//!
//! Resolution priority for the config file path:
//! 1. Explicit path passed on the command line
//! 2. `MSUB_CONFIG` environment variable
//! 3. `./msub.toml` in the working directory
//! 4. `~/.config/msub/msub.toml`
//!
//! Individual values can then be overridden per-field from the environment
//! (`MSUB_PORT`, `MSUB_DATABASE`, `MSUB_PEOPLE_API_TOKEN`, `MSUB_TRANSFER_SECRET`).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub people_api: PeopleApiConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5730
}

/// SQLite database location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("msub.db")
}

/// Where uploaded submission files live on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    #[serde(default = "default_uploads_dir")]
    pub dir: PathBuf,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: default_uploads_dir(),
        }
    }
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

/// Editor directory service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeopleApiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
}

/// Signing parameters for the transfer metadata token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_transfer_issuer")]
    pub issuer: String,
    #[serde(default = "default_transfer_ttl")]
    pub ttl_seconds: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_transfer_issuer(),
            ttl_seconds: default_transfer_ttl(),
        }
    }
}

fn default_transfer_issuer() -> String {
    "msub".to_string()
}

fn default_transfer_ttl() -> u64 {
    // Two weeks; the receiving system reconciles asynchronously
    14 * 24 * 3600
}

/// Configured delivery locations; each present section becomes one writer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryConfig {
    pub s3: Option<S3Config>,
    pub sftp: Option<SftpConfig>,
}

/// S3-compatible object store target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    #[serde(default)]
    pub base_path: String,
    #[serde(default)]
    pub access_token: String,
}

/// SFTP drop-off target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SftpConfig {
    pub host: String,
    #[serde(default = "default_sftp_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_sftp_dir")]
    pub remote_dir: String,
    /// Local mount of the remote account root, used by the built-in connector
    #[serde(default)]
    pub mount: PathBuf,
}

fn default_sftp_port() -> u16 {
    22
}

fn default_sftp_dir() -> String {
    "/upload".to_string()
}

/// Outbound notification mail
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub relay_url: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub import_failure_recipient: String,
}

impl Config {
    /// Load configuration, following the documented path priority.
    ///
    /// Missing file is not an error; defaults apply and environment
    /// overrides are still honored.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_path) {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| Error::Config(format!("read {}: {}", path.display(), e)))?;
                let parsed: Config = toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("parse {}: {}", path.display(), e)))?;
                info!("Configuration loaded from {}", path.display());
                parsed
            }
            None => {
                warn!("No config file found, using defaults");
                Config::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Per-field environment overrides (highest priority)
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("MSUB_PORT") {
            match port.parse() {
                Ok(p) => self.service.port = p,
                Err(_) => warn!("Ignoring non-numeric MSUB_PORT: {}", port),
            }
        }
        if let Ok(path) = std::env::var("MSUB_DATABASE") {
            self.database.path = PathBuf::from(path);
        }
        if let Ok(token) = std::env::var("MSUB_PEOPLE_API_TOKEN") {
            self.people_api.token = token;
        }
        if let Ok(secret) = std::env::var("MSUB_TRANSFER_SECRET") {
            self.transfer.secret = secret;
        }
    }
}

/// First existing config file in priority order, if any
fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("MSUB_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let cwd_config = PathBuf::from("msub.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    if let Some(user_config) = dirs::config_dir().map(|d| d.join("msub").join("msub.toml")) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    None
}
