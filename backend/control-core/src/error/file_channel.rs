use common::ErrorLocation;
use models::ModelError;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum FileChannelError {
    #[error("Invalid Key Error: {message} {location}")]
    InvalidKey {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },

    #[error("Decrypt Error: {message} {location}")]
    Decrypt {
        message: String,
        location: ErrorLocation,
    },

    #[error("Encrypt Error: {message} {location}")]
    Encrypt {
        message: String,
        location: ErrorLocation,
    },

    #[error("Envelope Error: {message} {location}")]
    Envelope {
        message: String,
        location: ErrorLocation,
    },

    #[error("Closed Error: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },
}

impl From<IoError> for FileChannelError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        FileChannelError::Io {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for FileChannelError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        FileChannelError::Envelope {
            message: format!("Invalid JSON: {error}"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ModelError> for FileChannelError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        FileChannelError::Envelope {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
