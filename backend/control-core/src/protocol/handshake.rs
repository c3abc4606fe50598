//! Session token validation for the `HELLO` message.

use crate::error::protocol::ProtocolError;
use crate::protocol::{Message, parse};

use common::RedactedSecret;

use log::{debug, warn};

/// Characters stripped from both ends of a received token.
const TOKEN_TRIM_CHARS: [char; 4] = [' ', '\t', '\n', '\r'];

/// Check a received session token against the expected one.
///
/// The received token is trimmed of leading and trailing ASCII whitespace
/// (space, tab, newline, carriage return) and must then equal `expected`
/// byte for byte. `expected` is never trimmed, and an empty `expected`
/// rejects everything.
#[track_caller]
pub fn validate_hello(expected: &str, received: &str) -> Result<(), ProtocolError> {
    if expected.is_empty() {
        return Err(ProtocolError::violation("Expected token cannot be empty"));
    }

    let trimmed = received.trim_matches(TOKEN_TRIM_CHARS.as_slice());
    if trimmed != expected {
        return Err(ProtocolError::violation("Session token mismatch"));
    }

    Ok(())
}

/// Parse `text`, require a `HELLO` message and validate its token.
#[track_caller]
pub fn process_hello_message(expected: &str, text: &str) -> Result<(), ProtocolError> {
    match parse(text)? {
        Message::Hello { session_token } => validate_hello(expected, &session_token),
        other => Err(ProtocolError::violation(format!(
            "Expected HELLO message, got {}",
            other.message_type()
        ))),
    }
}

/// Holds the expected session token for one server or channel.
#[derive(Debug, Clone)]
pub struct Handshake {
    expected_token: RedactedSecret,
}

impl Handshake {
    pub fn new(expected_token: impl Into<RedactedSecret>) -> Self {
        Self {
            expected_token: expected_token.into(),
        }
    }

    #[track_caller]
    pub fn validate_hello(&self, received: &str) -> Result<(), ProtocolError> {
        let result = validate_hello(self.expected_token.expose(), received);
        match &result {
            Ok(()) => debug!("Session token accepted"),
            Err(e) => warn!("Session token rejected: {}", e.message()),
        }
        result
    }

    #[track_caller]
    pub fn process_hello_message(&self, text: &str) -> Result<(), ProtocolError> {
        process_hello_message(self.expected_token.expose(), text)
    }
}
