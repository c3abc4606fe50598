use common::ErrorLocation;

use control_core::error::CoreError;
use control_core::error::config::ConfigError;
use control_core::error::file_channel::FileChannelError;
use control_core::error::ipc::IpcError;

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the host binary.
///
/// Core errors are flattened to their display text so the whole enum stays
/// serializable for status reporting.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum HostError {
    /// Error from the host itself (runtime, logger, wiring)
    #[error("Host Error: {message} {location}")]
    Host {
        message: String,
        location: ErrorLocation,
    },

    /// Configuration could not be resolved
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Control channel failed to start or stop
    #[error("Channel Error: {message} {location}")]
    Channel {
        message: String,
        location: ErrorLocation,
    },
}

impl From<ConfigError> for HostError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        HostError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<IpcError> for HostError {
    #[track_caller]
    fn from(error: IpcError) -> Self {
        HostError::Channel {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<FileChannelError> for HostError {
    #[track_caller]
    fn from(error: FileChannelError) -> Self {
        HostError::Channel {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for HostError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Config(e) => e.into(),
            other => HostError::Channel {
                message: other.to_string(),
                location: ErrorLocation::from(Location::caller()),
            },
        }
    }
}
