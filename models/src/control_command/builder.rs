use crate::control_command::{ControlCommand, ControlCommandType};
use crate::error::model_error::ModelError;

use common::ErrorLocation;

use std::collections::BTreeMap;
use std::panic::Location;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Builder for validated [`ControlCommand`] instances.
///
/// Used by the file channel when decoding an envelope, where the timestamp is
/// optional and payload entries arrive one by one.
#[derive(Debug, Default)]
pub struct ControlCommandBuilder {
    command_id: Option<String>,
    command_type: Option<ControlCommandType>,
    payload: BTreeMap<String, String>,
    timestamp: Option<SystemTime>,
}

impl ControlCommandBuilder {
    pub fn with_command_id(mut self, command_id: impl Into<String>) -> Self {
        self.command_id = Some(command_id.into());
        self
    }

    pub fn with_type(mut self, command_type: ControlCommandType) -> Self {
        self.command_type = Some(command_type);
        self
    }

    pub fn with_payload_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: BTreeMap<String, String>) -> Self {
        self.payload.extend(payload);
        self
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Timestamp as milliseconds since the Unix epoch. Negative values clamp to the epoch;
    /// values past what `SystemTime` can hold fall back to now.
    pub fn with_timestamp_millis(self, millis: i64) -> Self {
        let millis = u64::try_from(millis).unwrap_or_default();
        let timestamp = UNIX_EPOCH
            .checked_add(Duration::from_millis(millis))
            .unwrap_or_else(SystemTime::now);
        self.with_timestamp(timestamp)
    }

    /// Build the command. A missing timestamp defaults to now.
    #[track_caller]
    pub fn build(self) -> Result<ControlCommand, ModelError> {
        let command_id = self.command_id.ok_or_else(|| ModelError::Validation {
            message: String::from("commandId is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if command_id.is_empty() {
            return Err(ModelError::Validation {
                message: String::from("commandId cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let command_type = self.command_type.ok_or_else(|| ModelError::Validation {
            message: String::from("type is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(ControlCommand::from_parts(
            command_id,
            command_type,
            self.payload,
            self.timestamp.unwrap_or_else(SystemTime::now),
        ))
    }
}
