//! Client-side secure channel management.
//!
//! [`ConnectionManager`] wraps any [`MessageChannel`] with bounded retry on a
//! fixed backoff schedule and notifies [`ConnectionListener`]s of lifecycle
//! changes. [`WsMessageChannel`] is the WebSocket implementation.

mod channel;
mod listener;
mod manager;
mod retry;
mod ws_channel;

pub use channel::MessageChannel;
pub use listener::ConnectionListener;
pub use manager::{ConnectionManager, RetryStats, Sleeper, ThreadSleeper};
pub use retry::{
    BACKOFF_SCHEDULE_MS, CONNECTION_TIMEOUT_MS, ConnectBackoff, MAX_BACKOFF_MS, MAX_RETRIES,
};
pub use ws_channel::{RECEIVE_POLL_INTERVAL, WsMessageChannel, default_tls_config};
