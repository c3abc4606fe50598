//! JSON command envelope carried inside the encrypted file.
//!
//! ```json
//! {"commandId": "cmd-1", "type": "NAVIGATE", "payload": {"url": "https://..."}, "timestamp": 1700000000000}
//! ```
//!
//! `payload` and `timestamp` are optional. Non-string payload values are dropped.

use crate::error::file_channel::FileChannelError;

use common::ErrorLocation;
use models::{ControlCommand, ControlCommandBuilder, ControlCommandType};

use std::collections::BTreeMap;
use std::panic::Location;
use std::time::UNIX_EPOCH;

use log::debug;
use serde::Serialize;
use serde_json::Value;

const FIELD_COMMAND_ID: &str = "commandId";
const FIELD_TYPE: &str = "type";
const FIELD_PAYLOAD: &str = "payload";
const FIELD_TIMESTAMP: &str = "timestamp";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a> {
    command_id: &'a str,
    #[serde(rename = "type")]
    command_type: ControlCommandType,
    payload: Option<&'a BTreeMap<String, String>>,
    timestamp: i64,
}

/// Decode decrypted envelope bytes into a command.
///
/// # Errors
///
/// Returns [`FileChannelError::Envelope`] for malformed JSON, a missing or
/// non-string `commandId`, or an unrecognised `type`.
pub fn decode_envelope(plaintext: &[u8]) -> Result<ControlCommand, FileChannelError> {
    let value: Value = serde_json::from_slice(plaintext)?;
    let Value::Object(object) = value else {
        return Err(envelope_error("Envelope must be a JSON object"));
    };

    let command_id = object
        .get(FIELD_COMMAND_ID)
        .and_then(Value::as_str)
        .ok_or_else(|| envelope_error("Missing or invalid 'commandId'"))?;

    let type_name = object
        .get(FIELD_TYPE)
        .and_then(Value::as_str)
        .ok_or_else(|| envelope_error("Missing or invalid 'type'"))?;
    let command_type = ControlCommandType::from_wire_name(type_name)
        .ok_or_else(|| envelope_error(format!("Unknown command type: {type_name}")))?;

    let mut builder = ControlCommandBuilder::default()
        .with_command_id(command_id)
        .with_type(command_type);

    match object.get(FIELD_PAYLOAD) {
        Some(Value::Object(entries)) => {
            for (key, value) in entries {
                match value.as_str() {
                    Some(text) => builder = builder.with_payload_entry(key.as_str(), text),
                    None => debug!("Dropping non-string payload value for key '{key}'"),
                }
            }
        }
        Some(Value::Null) | None => {}
        Some(_) => debug!("Ignoring non-object payload in command {command_id}"),
    }

    if let Some(millis) = object.get(FIELD_TIMESTAMP).and_then(timestamp_millis) {
        builder = builder.with_timestamp_millis(millis);
    }

    Ok(builder.build()?)
}

/// Encode a command as envelope JSON. An empty payload is written as `null`.
pub fn encode_envelope(command: &ControlCommand) -> Result<Vec<u8>, FileChannelError> {
    let timestamp = command
        .timestamp()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0);

    let envelope = EnvelopeRef {
        command_id: command.command_id(),
        command_type: command.command_type(),
        payload: (!command.payload().is_empty()).then(|| command.payload()),
        timestamp,
    };

    Ok(serde_json::to_vec(&envelope)?)
}

// Integral milliseconds; fractional values are truncated.
fn timestamp_millis(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|millis| millis as i64))
}

#[track_caller]
fn envelope_error(message: impl Into<String>) -> FileChannelError {
    FileChannelError::Envelope {
        message: message.into(),
        location: ErrorLocation::from(Location::caller()),
    }
}
