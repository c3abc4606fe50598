use crate::control_command::{ControlCommand, ControlCommandType, PAYLOAD_URL_KEY};

use std::collections::BTreeMap;
use std::time::SystemTime;

use uuid::Uuid;

/// A UI command admitted by the control service.
///
/// Created on RPC worker threads, drained exactly once by the UI consumer thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load `url` in the browser.
    OpenPage { command_id: String, url: String },

    /// Begin the host's shutdown sequence.
    Shutdown,
}

impl Command {
    pub fn open_page(command_id: impl Into<String>, url: impl Into<String>) -> Self {
        Command::OpenPage {
            command_id: command_id.into(),
            url: url.into(),
        }
    }

    /// Command id for logging. `Shutdown` carries none.
    pub fn command_id(&self) -> Option<&str> {
        match self {
            Command::OpenPage { command_id, .. } => Some(command_id),
            Command::Shutdown => None,
        }
    }
}

impl From<Command> for ControlCommand {
    /// Queue commands and file-channel commands share one dispatcher.
    ///
    /// `OpenPage` keeps its id and `Shutdown` gets a generated one.
    fn from(command: Command) -> Self {
        match command {
            Command::OpenPage { command_id, url } => {
                let command_id = if command_id.is_empty() {
                    Uuid::new_v4().to_string()
                } else {
                    command_id
                };
                let mut payload = BTreeMap::new();
                payload.insert(PAYLOAD_URL_KEY.to_string(), url);
                ControlCommand::from_parts(
                    command_id,
                    ControlCommandType::Navigate,
                    payload,
                    SystemTime::now(),
                )
            }
            Command::Shutdown => ControlCommand::from_parts(
                Uuid::new_v4().to_string(),
                ControlCommandType::Shutdown,
                BTreeMap::new(),
                SystemTime::now(),
            ),
        }
    }
}
