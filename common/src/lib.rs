//! Primitives shared by every crate in the UI host workspace.
//!
//! - [`ErrorLocation`]: call-site capture attached to every error variant
//! - [`RedactedSecret`]: session tokens and channel keys that must never reach a log line

pub mod error;
pub mod redacted_secret;

pub use error::error_location::ErrorLocation;
pub use error::secret_error::SecretError;
pub use redacted_secret::RedactedSecret;
