//! Host configuration.
//!
//! Resolution order, later wins:
//! 1. Built-in defaults
//! 2. `{config_dir}/config.json`
//! 3. `.env` (current directory, then the executable's directory)
//! 4. `UI_HOST_*` environment variables

use crate::error::config::ConfigError;

use common::{ErrorLocation, RedactedSecret};

use std::env;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_DIR_NAME: &str = "ui-host";
const CONFIG_VERSION: u32 = 1;

pub const MIN_IPC_PORT: u16 = 1024;

pub const ENV_IPC_PORT: &str = "UI_HOST_IPC_PORT";
pub const ENV_SESSION_TOKEN: &str = "UI_HOST_SESSION_TOKEN";
pub const ENV_START_URL: &str = "UI_HOST_START_URL";
pub const ENV_CHANNEL: &str = "UI_HOST_CHANNEL";
pub const ENV_CONTROL_FILE: &str = "UI_HOST_CONTROL_FILE";
pub const ENV_CONTROL_KEY: &str = "UI_HOST_CONTROL_KEY";

/// Which control channel the host listens on. Exactly one is active.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    #[default]
    Rpc,
    EncryptedFile,
}

impl ChannelMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "rpc" => Some(ChannelMode::Rpc),
            "encrypted_file" => Some(ChannelMode::EncryptedFile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_ipc_port")]
    pub ipc_port: u16,

    #[serde(default, skip_serializing)]
    pub session_token: RedactedSecret,

    #[serde(default = "default_start_url")]
    pub start_url: String,

    #[serde(default)]
    pub channel: ChannelMode,

    #[serde(default)]
    pub control_file: Option<PathBuf>,

    #[serde(default, skip_serializing)]
    pub control_key: Option<RedactedSecret>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            ipc_port: default_ipc_port(),
            session_token: RedactedSecret::default(),
            start_url: default_start_url(),
            channel: ChannelMode::default(),
            control_file: None,
            control_key: None,
        }
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_ipc_port() -> u16 {
    50051
}
fn default_start_url() -> String {
    "https://example.com".to_string()
}

impl HostConfig {
    /// Platform config directory for the host, e.g. `~/.config/ui-host`.
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME))
            .ok_or_else(|| ConfigError::DirectoryNotFound {
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Full resolution: file, `.env`, environment, then validation.
    pub fn resolve(config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(config_dir)?;
        try_load_dotenv();
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load `{config_dir}/config.json`, or defaults when the file is absent.
    ///
    /// Does not validate: environment overrides may still fill required fields.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            })?;

        let config: HostConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            })?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Apply `UI_HOST_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup(ENV_IPC_PORT) {
            self.ipc_port = port.trim().parse().map_err(|_| ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("{ENV_IPC_PORT} is not a valid port: {port}"),
            })?;
            debug!("ipc_port overridden from environment");
        }

        if let Some(token) = lookup(ENV_SESSION_TOKEN) {
            self.session_token = RedactedSecret::new(token);
            debug!("session_token overridden from environment");
        }

        if let Some(start_url) = lookup(ENV_START_URL) {
            self.start_url = start_url;
            debug!("start_url overridden from environment");
        }

        if let Some(channel) = lookup(ENV_CHANNEL) {
            self.channel =
                ChannelMode::parse(&channel).ok_or_else(|| ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!(
                        "{ENV_CHANNEL} must be 'rpc' or 'encrypted_file', got '{channel}'"
                    ),
                })?;
            debug!("channel overridden from environment");
        }

        if let Some(control_file) = lookup(ENV_CONTROL_FILE) {
            self.control_file = Some(PathBuf::from(control_file));
            debug!("control_file overridden from environment");
        }

        if let Some(control_key) = lookup(ENV_CONTROL_KEY) {
            self.control_key = Some(RedactedSecret::new(control_key));
            debug!("control_key overridden from environment");
        }

        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(validation_error(format!(
                "Invalid version: {} (expected 1-{CONFIG_VERSION})",
                self.version
            )));
        }

        if self.ipc_port < MIN_IPC_PORT {
            return Err(validation_error(format!(
                "ipc_port {} out of range ({MIN_IPC_PORT}-65535)",
                self.ipc_port
            )));
        }

        let start_url = Url::parse(&self.start_url).map_err(|e| {
            validation_error(format!("Invalid start_url '{}': {e}", self.start_url))
        })?;
        if start_url.scheme() != "https" {
            return Err(validation_error(format!(
                "start_url must use https: {}",
                self.start_url
            )));
        }

        match self.channel {
            ChannelMode::Rpc => {
                if self.session_token.is_empty() {
                    return Err(validation_error("session_token is required for the rpc channel"));
                }
            }
            ChannelMode::EncryptedFile => {
                if self.control_file.is_none() {
                    return Err(validation_error(
                        "control_file is required for the encrypted_file channel",
                    ));
                }
                if self.control_key.as_ref().is_none_or(RedactedSecret::is_empty) {
                    return Err(validation_error(
                        "control_key is required for the encrypted_file channel",
                    ));
                }
            }
        }

        Ok(())
    }
}

#[track_caller]
fn validation_error(reason: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: reason.into(),
    }
}

/// Load `.env` from the current directory, then from next to the executable.
fn try_load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from {}", path.display());
        return;
    }

    let Some(env_path) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(".env")))
    else {
        return;
    };

    if env_path.exists() {
        match dotenvy::from_path(&env_path) {
            Ok(()) => info!("Loaded .env from {}", env_path.display()),
            Err(e) => warn!("Failed to parse .env at {}: {e}", env_path.display()),
        }
    }
}
