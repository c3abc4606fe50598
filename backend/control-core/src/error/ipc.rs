use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

/// Control server transport failures.
///
/// Application-level rejections (bad token, shutting down) are never errors;
/// they travel inside response payloads.
#[derive(Debug, ThisError)]
pub enum IpcError {
    /// Listener could not be bound or queried.
    #[error("Socket Error: {message} {location}")]
    Socket {
        message: String,
        location: ErrorLocation,
    },

    /// The HTTP upgrade to WebSocket failed. Unrelated to the session handshake.
    #[error("WebSocket Upgrade Error: {message} {location}")]
    Upgrade {
        message: String,
        location: ErrorLocation,
    },

    #[error("Frame Read Error: {message} {location}")]
    FrameRead {
        message: String,
        location: ErrorLocation,
    },

    #[error("Frame Write Error: {message} {location}")]
    FrameWrite {
        message: String,
        location: ErrorLocation,
    },

    #[error("Response Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },
}

impl From<IoError> for IpcError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        IpcError::Socket {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<prost::EncodeError> for IpcError {
    #[track_caller]
    fn from(error: prost::EncodeError) -> Self {
        IpcError::Encode {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
