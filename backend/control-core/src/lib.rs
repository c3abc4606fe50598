//! Control plane of the UI host.
//!
//! Commands reach the host over one of two channels and converge on a single
//! consumer:
//!
//! - [`service`]: WebSocket/protobuf control server, feeding the [`queue::CommandQueue`]
//! - [`file_channel`]: encrypted command file, feeding the [`dispatcher`] directly
//!
//! [`connection`] is the client-side counterpart used by controllers, and
//! [`protocol`] holds the JSON session messages and token handshake.

pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod file_channel;
pub mod proto;
pub mod protocol;
pub mod queue;
pub mod service;

#[cfg(test)]
mod tests;

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CONTROL_SERVER_HOSTNAME: &str = "127.0.0.1";
pub const CONTROL_SERVER_BASE_URL: &str =
    const_format::concatcp!("ws://", CONTROL_SERVER_HOSTNAME);
