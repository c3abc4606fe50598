//! Session protocol: the JSON messages a controller sends over a secure channel.
//!
//! Two shapes are recognised:
//!
//! ```text
//! {"type":"HELLO","sessionToken":"<token>"}
//! {"type":"NAVIGATE","url":"<url>"}
//! ```
//!
//! Anything else, including malformed JSON, a non-object document, a missing
//! required field or an unknown `type`, is a [`ProtocolError`]. Unknown fields
//! are ignored. Type names are case-sensitive. When a key is repeated the last
//! occurrence wins.

pub mod handshake;

pub use handshake::{Handshake, process_hello_message, validate_hello};

use crate::error::protocol::ProtocolError;

use serde_json::{Map, Value};

pub const MESSAGE_TYPE_HELLO: &str = "HELLO";
pub const MESSAGE_TYPE_NAVIGATE: &str = "NAVIGATE";

const FIELD_TYPE: &str = "type";
const FIELD_SESSION_TOKEN: &str = "sessionToken";
const FIELD_URL: &str = "url";

/// A parsed session protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Hello { session_token: String },
    Navigate { url: String },
}

impl Message {
    pub fn message_type(&self) -> &'static str {
        match self {
            Message::Hello { .. } => MESSAGE_TYPE_HELLO,
            Message::Navigate { .. } => MESSAGE_TYPE_NAVIGATE,
        }
    }
}

/// Parse one protocol message.
///
/// # Errors
///
/// Returns [`ProtocolError::Violation`] for any input that is not one of the
/// recognised message shapes.
#[track_caller]
pub fn parse(text: &str) -> Result<Message, ProtocolError> {
    if text.trim().is_empty() {
        return Err(ProtocolError::violation("JSON string is empty"));
    }

    let value: Value = serde_json::from_str(text)?;
    let Value::Object(object) = value else {
        return Err(ProtocolError::violation("JSON must be an object"));
    };

    let message_type = string_field(&object, FIELD_TYPE)
        .ok_or_else(|| ProtocolError::violation("Missing 'type' field in message"))?;

    match message_type {
        MESSAGE_TYPE_HELLO => {
            let session_token = string_field(&object, FIELD_SESSION_TOKEN).ok_or_else(|| {
                ProtocolError::violation("Missing 'sessionToken' field in HELLO message")
            })?;
            Ok(Message::Hello {
                session_token: session_token.to_string(),
            })
        }
        MESSAGE_TYPE_NAVIGATE => {
            let url = string_field(&object, FIELD_URL)
                .ok_or_else(|| ProtocolError::violation("Missing 'url' field in NAVIGATE message"))?;
            Ok(Message::Navigate {
                url: url.to_string(),
            })
        }
        other => Err(ProtocolError::violation(format!(
            "Unknown message type: {other}"
        ))),
    }
}

// A present but non-string value counts as missing.
fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}
