//! Command models for the UI host control plane.
//!
//! Pure data: the values produced at a protocol boundary and consumed once by
//! the UI thread or the dispatcher. No transport or threading logic lives here.
//!
//! - [`Command`]: the closed set queued by the RPC service for the UI thread
//! - [`ControlCommand`]: the richer command delivered by the encrypted file channel

pub mod command;
pub mod control_command;
pub mod error;

pub use command::Command;
pub use control_command::builder::ControlCommandBuilder;
pub use control_command::{ControlCommand, ControlCommandType};
pub use error::model_error::ModelError;

#[cfg(test)]
mod tests;
