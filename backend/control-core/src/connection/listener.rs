/// Observer of [`ConnectionManager`](super::ConnectionManager) lifecycle events.
///
/// Success path: `on_connecting`, `on_connected`. Exhaustion path:
/// `on_connecting`, `on_error`. `on_disconnected` follows an explicit disconnect.
/// Every method defaults to a no-op.
pub trait ConnectionListener: Send + Sync {
    fn on_connecting(&self) {}

    fn on_connected(&self) {}

    fn on_disconnected(&self) {}

    fn on_error(&self, _message: &str) {}
}
