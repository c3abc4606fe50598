use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failure reported by a dispatcher collaborator.
#[derive(Debug, ThisError)]
pub enum DispatchError {
    #[error("Navigation Error: {message} {location}")]
    Navigation {
        message: String,
        location: ErrorLocation,
    },
}

impl DispatchError {
    #[track_caller]
    pub fn navigation(message: impl Into<String>) -> Self {
        DispatchError::Navigation {
            message: message.into(),
            location: ErrorLocation::from(std::panic::Location::caller()),
        }
    }
}
