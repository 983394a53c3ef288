//! Configuration management for the bridge
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.
//! The resulting [`Config`] is built once at startup and never mutated.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hardware identifier of the reference Soltaro inverter
pub const DEFAULT_HWID: &str = "644fc8f0-2a4b-4867-9ce4-b6af0b778fb4";

/// Default Qendercore authentication endpoint
pub const DEFAULT_AUTH_BASE_URL: &str = "https://auth.qendercore.com:8000";

/// Default Qendercore API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.qendercore.com:8000";

const STATE_FILE_NAME: &str = ".soltaro-qendercore-state.json";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Qendercore cloud account and inverter selection
    pub qendercore: QendercoreConfig,

    /// Hubitat Maker API target device
    pub hubitat: HubitatConfig,

    /// Seconds between two poll cycles
    pub poll_seconds: u64,

    /// Where the rotating refresh token is persisted
    pub state_file: PathBuf,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Qendercore cloud settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QendercoreConfig {
    /// Account login
    pub username: String,

    /// Account password
    #[serde(skip_serializing)]
    pub password: String,

    /// Hardware identifier of the inverter to poll
    pub hwid: String,

    /// Authentication service base URL
    pub auth_base_url: String,

    /// Data API base URL
    pub api_base_url: String,

    /// Skip TLS certificate verification for the cloud API
    pub insecure_tls: bool,
}

/// Hubitat Maker API settings
///
/// All three fields are optional at load time: fetch-only runs never
/// touch the hub. [`HubitatConfig::validate`] is checked before a push.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HubitatConfig {
    /// Maker API base, e.g. `http://hubitat.local/apps/api/12`
    pub base_url: String,

    /// Maker API access token
    #[serde(skip_serializing)]
    pub access_token: String,

    /// Virtual device identifier
    pub device_id: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Directory or file path for rotated log files; empty disables file output
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Default for QendercoreConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            hwid: DEFAULT_HWID.to_string(),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            insecure_tls: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: String::new(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qendercore: QendercoreConfig::default(),
            hubitat: HubitatConfig::default(),
            poll_seconds: 300,
            state_file: default_state_file(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_state_file() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(STATE_FILE_NAME)
}

/// Expand a leading `~/` the way a shell would
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load the YAML file if present, then apply process environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Overlay settings from an environment lookup; empty values are ignored
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SOLTARO_USERNAME") {
            self.qendercore.username = v;
        }
        if let Some(v) = get("SOLTARO_PASSWORD") {
            self.qendercore.password = v;
        }
        if let Some(v) = get("SOLTARO_HWID") {
            self.qendercore.hwid = v;
        }
        if let Some(v) = get("SOLTARO_INSECURE_TLS") {
            self.qendercore.insecure_tls = parse_flag(&v);
        }
        if let Some(v) = get("SOLTARO_POLL_SECONDS") {
            self.poll_seconds = v.trim().parse().map_err(|_| {
                BridgeError::validation("SOLTARO_POLL_SECONDS", format!("not a number: {v}"))
            })?;
        }
        if let Some(v) = get("SOLTARO_STATE_FILE") {
            self.state_file = expand_home(&v);
        }
        if let Some(v) = get("SOLTARO_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = get("HUBITAT_MAKER_BASE_URL") {
            self.hubitat.base_url = v;
        }
        if let Some(v) = get("HUBITAT_MAKER_TOKEN") {
            self.hubitat.access_token = v;
        }
        if let Some(v) = get("HUBITAT_DEVICE_ID") {
            self.hubitat.device_id = v;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.qendercore.username.trim().is_empty() {
            return Err(BridgeError::validation(
                "qendercore.username",
                "Missing required setting SOLTARO_USERNAME",
            ));
        }

        if self.qendercore.password.is_empty() {
            return Err(BridgeError::validation(
                "qendercore.password",
                "Missing required setting SOLTARO_PASSWORD",
            ));
        }

        if self.qendercore.hwid.trim().is_empty() {
            return Err(BridgeError::validation(
                "qendercore.hwid",
                "Missing required setting SOLTARO_HWID",
            ));
        }

        if self.poll_seconds == 0 {
            return Err(BridgeError::validation(
                "poll_seconds",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Interval between the end of one cycle and the start of the next
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_seconds)
    }
}

impl HubitatConfig {
    /// Whether every Maker API setting is present
    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validate that a push can be attempted
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty()
            || self.access_token.is_empty()
            || self.device_id.trim().is_empty()
        {
            return Err(BridgeError::config(
                "Hubitat settings missing (HUBITAT_MAKER_BASE_URL, HUBITAT_MAKER_TOKEN, HUBITAT_DEVICE_ID)",
            ));
        }
        Ok(())
    }
}
