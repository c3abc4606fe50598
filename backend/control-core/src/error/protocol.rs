use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Malformed, unknown or unauthenticated session protocol input.
///
/// Every parser and handshake failure surfaces as this one kind so callers
/// cannot tell a bad token from a bad document.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
    #[error("Protocol Violation Error: {message} {location}")]
    Violation {
        message: String,
        location: ErrorLocation,
    },
}

impl ProtocolError {
    #[track_caller]
    pub(crate) fn violation(message: impl Into<String>) -> Self {
        ProtocolError::Violation {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ProtocolError::Violation { message, .. } => message,
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        ProtocolError::Violation {
            message: format!("Malformed JSON: {error}"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
