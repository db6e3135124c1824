//! Configuration loading
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest priority, applied by the binary)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable config file is not fatal: the service logs a
//! warning and starts on defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "REVDASH_CONFIG";

/// Which approval store backs the `approved` flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalBackend {
    /// Flags live in the fallback dataset file itself
    #[default]
    JsonFile,
    /// Flags live in a SQLite table
    Sqlite,
}

/// Where the effective configuration came from
#[derive(Debug)]
pub enum ConfigOrigin {
    /// No config file located
    Defaults,
    /// Parsed from this file
    File(PathBuf),
    /// A path was named but nothing exists there
    Missing(PathBuf),
    /// The file exists but could not be read or parsed
    Invalid { path: PathBuf, error: Error },
}

impl ConfigOrigin {
    /// Report the outcome through `tracing`
    pub fn log(&self) {
        match self {
            Self::Defaults => info!("No config file found, using compiled defaults"),
            Self::File(path) => info!("Loaded config from {}", path.display()),
            Self::Missing(path) => {
                info!("Config file {} not found, using defaults", path.display())
            }
            Self::Invalid { path, error } => {
                warn!("Ignoring config file {}: {} (using defaults)", path.display(), error)
            }
        }
    }
}

/// Complete service configuration as read from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
    pub hostaway: HostawayConfig,
    pub google: GoogleConfig,
    pub approvals: ApprovalConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5780".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Fallback review dataset served when the property-management API is unavailable
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("public/mock_reviews.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostawayConfig {
    pub base_url: String,
    pub account_id: Option<String>,
    /// Requests are only attempted when a key is configured
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HostawayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.hostaway.com/v1".to_string(),
            account_id: None,
            api_key: None,
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    pub backend: ApprovalBackend,
    /// Database file for the `sqlite` backend
    pub sqlite_path: PathBuf,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            backend: ApprovalBackend::JsonFile,
            sqlite_path: PathBuf::from("revdash.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `path` if given, falling back to defaults on any failure
    ///
    /// Does not log; the returned [`ConfigOrigin`] says what happened so the
    /// caller can report it once logging is up.
    pub fn load_or_default(path: Option<&Path>) -> (Self, ConfigOrigin) {
        let Some(path) = path else {
            return (Self::default(), ConfigOrigin::Defaults);
        };

        if !path.exists() {
            return (Self::default(), ConfigOrigin::Missing(path.to_path_buf()));
        }

        match Self::load(path) {
            Ok(config) => (config, ConfigOrigin::File(path.to_path_buf())),
            Err(error) => (
                Self::default(),
                ConfigOrigin::Invalid {
                    path: path.to_path_buf(),
                    error,
                },
            ),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Credentials use the variable names the hosting providers document.
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = env_value("HOSTAWAY_API_KEY") {
            self.hostaway.api_key = Some(key);
        }
        if let Some(account) = env_value("HOSTAWAY_ACCOUNT_ID") {
            self.hostaway.account_id = Some(account);
        }
        if let Some(key) = env_value("GOOGLE_PLACES_API_KEY") {
            self.google.api_key = Some(key);
        }
        if let Some(path) = env_value("REVDASH_DATASET") {
            self.dataset.path = PathBuf::from(path);
        }
        if let Some(bind) = env_value("REVDASH_BIND") {
            self.server.bind = bind;
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Locate the config file
///
/// Priority: explicit path, then `REVDASH_CONFIG`, then the per-user config
/// directory, then `/etc/revdash/config.toml`. Only existing files count.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_value(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("revdash").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/revdash/config.toml");
    system_config.exists().then_some(system_config)
}
