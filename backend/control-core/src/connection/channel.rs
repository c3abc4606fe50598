use crate::error::connection::ConnectionError;

/// A bidirectional, text-framed channel to a controller.
///
/// Implementations own the socket. The [`ConnectionManager`](super::ConnectionManager)
/// serialises all calls, so `&mut self` is fine here.
pub trait MessageChannel: Send {
    /// Establish the underlying connection.
    fn connect(&mut self) -> Result<(), ConnectionError>;

    /// Whether the underlying connection is currently usable.
    fn is_connected(&self) -> bool;

    fn send(&mut self, message: &str) -> Result<(), ConnectionError>;

    /// Wait a bounded time for the next text message.
    ///
    /// Returns `Ok(None)` when nothing arrived within the channel's poll
    /// interval. Must not block indefinitely: the manager releases the channel
    /// between polls so other callers (send, disconnect) can get in.
    fn receive(&mut self) -> Result<Option<String>, ConnectionError>;

    fn close(&mut self) -> Result<(), ConnectionError>;
}
