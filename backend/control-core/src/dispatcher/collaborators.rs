//! Capabilities the dispatcher drives but never owns.

use crate::error::dispatch::DispatchError;

use models::ControlCommand;

use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

/// The embedded browser, as far as the control plane is concerned.
pub trait BrowserControl: Send + Sync {
    fn load_url(&self, url: &str) -> Result<(), DispatchError>;
}

/// Process-level shutdown coordination.
///
/// Production implementations may end the process; tests use [`ShutdownLatch`].
pub trait ShutdownSink: Send + Sync {
    /// Idempotent.
    fn request_shutdown(&self);

    fn is_shutdown_requested(&self) -> bool;
}

/// Anything that consumes decoded control commands.
pub trait ControlCommandReceiver: Send + Sync {
    fn on_command(&self, command: ControlCommand);

    fn shutdown(&self) {}
}

/// [`ShutdownSink`] that only records the request.
#[derive(Debug, Default)]
pub struct ShutdownLatch {
    requested: AtomicBool,
}

impl ShutdownLatch {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShutdownSink for ShutdownLatch {
    fn request_shutdown(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            info!("Shutdown requested");
        }
    }

    fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
