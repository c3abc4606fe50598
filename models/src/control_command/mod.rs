pub mod builder;

use crate::error::model_error::ModelError;

use common::ErrorLocation;

use std::collections::BTreeMap;
use std::fmt;
use std::panic::Location;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Payload key carrying the navigation target of a `Navigate` command.
pub const PAYLOAD_URL_KEY: &str = "url";

/// Kinds of control command accepted by the host.
///
/// The wire names are the upper-case, underscore-separated forms
/// (`START`, `NAVIGATE`, `SHUTDOWN`, `HEALTH_PING`) and matching is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlCommandType {
    Start,
    Navigate,
    Shutdown,
    HealthPing,
}

impl ControlCommandType {
    pub const fn wire_name(self) -> &'static str {
        match self {
            ControlCommandType::Start => "START",
            ControlCommandType::Navigate => "NAVIGATE",
            ControlCommandType::Shutdown => "SHUTDOWN",
            ControlCommandType::HealthPing => "HEALTH_PING",
        }
    }

    /// Case-sensitive inverse of [`wire_name`](Self::wire_name).
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "START" => Some(ControlCommandType::Start),
            "NAVIGATE" => Some(ControlCommandType::Navigate),
            "SHUTDOWN" => Some(ControlCommandType::Shutdown),
            "HEALTH_PING" => Some(ControlCommandType::HealthPing),
            _ => None,
        }
    }
}

impl fmt::Display for ControlCommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Immutable control command delivered to a command receiver.
///
/// The timestamp is informational metadata and never drives ordering or dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCommand {
    command_id: String,
    command_type: ControlCommandType,
    payload: BTreeMap<String, String>,
    timestamp: SystemTime,
}

impl ControlCommand {
    /// Create a command stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Validation`] if `command_id` is empty.
    #[track_caller]
    pub fn new(
        command_id: impl Into<String>,
        command_type: ControlCommandType,
        payload: BTreeMap<String, String>,
    ) -> Result<Self, ModelError> {
        let command_id = command_id.into();
        if command_id.is_empty() {
            return Err(ModelError::Validation {
                message: String::from("commandId cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Self::from_parts(
            command_id,
            command_type,
            payload,
            SystemTime::now(),
        ))
    }

    /// Unchecked constructor for callers that already validated the id.
    pub(crate) fn from_parts(
        command_id: String,
        command_type: ControlCommandType,
        payload: BTreeMap<String, String>,
        timestamp: SystemTime,
    ) -> Self {
        Self {
            command_id,
            command_type,
            payload,
            timestamp,
        }
    }

    pub fn command_id(&self) -> &str {
        &self.command_id
    }

    pub fn command_type(&self) -> ControlCommandType {
        self.command_type
    }

    pub fn payload(&self) -> &BTreeMap<String, String> {
        &self.payload
    }

    pub fn payload_value(&self, key: &str) -> Option<&str> {
        self.payload.get(key).map(String::as_str)
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}
