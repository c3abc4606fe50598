use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Raised when a [`RedactedSecret`](crate::RedactedSecret) is asked to leave the process.
#[derive(Debug, ThisError)]
pub enum SecretError {
    #[error("Secret Serialization Refused Error: {message} {location}")]
    SerializationRefused {
        message: String,
        location: ErrorLocation,
    },
}
