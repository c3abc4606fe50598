//! Routes control commands to the browser and shutdown collaborators.
//!
//! The dispatcher runs on whichever thread delivers the command (a file poller
//! or the UI consumer loop). It does not marshal to another thread itself.

mod collaborators;

pub use collaborators::{BrowserControl, ControlCommandReceiver, ShutdownLatch, ShutdownSink};

use models::control_command::PAYLOAD_URL_KEY;
use models::{ControlCommand, ControlCommandType};

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};

/// Applies control commands.
///
/// - `START` and `HEALTH_PING` are observed only
/// - `NAVIGATE` loads the payload `url`; a missing url or a failing browser is logged and absorbed
/// - `SHUTDOWN` reaches the [`ShutdownSink`] at most once per dispatcher
pub struct ControlCommandDispatcher {
    browser: Arc<dyn BrowserControl>,
    shutdown: Arc<dyn ShutdownSink>,
    shutdown_requested: AtomicBool,
}

impl ControlCommandDispatcher {
    pub fn new(browser: Arc<dyn BrowserControl>, shutdown: Arc<dyn ShutdownSink>) -> Self {
        Self {
            browser,
            shutdown,
            shutdown_requested: AtomicBool::new(false),
        }
    }

    fn navigate(&self, command: &ControlCommand) {
        let Some(url) = command
            .payload_value(PAYLOAD_URL_KEY)
            .filter(|url| !url.is_empty())
        else {
            warn!(
                "NAVIGATE command {} has no url, dropping",
                command.command_id()
            );
            return;
        };

        info!("Navigating to {url} (command {})", command.command_id());
        match catch_unwind(AssertUnwindSafe(|| self.browser.load_url(url))) {
            Ok(Ok(())) => debug!("Navigation to {url} issued"),
            Ok(Err(e)) => error!("Navigation to {url} failed: {e}"),
            Err(_) => error!("Browser panicked while loading {url}"),
        }
    }

    fn request_shutdown(&self, command: &ControlCommand) {
        if self.shutdown_requested.swap(true, Ordering::SeqCst) {
            info!(
                "Shutdown already requested, ignoring command {}",
                command.command_id()
            );
            return;
        }

        info!("Forwarding shutdown (command {})", command.command_id());
        self.shutdown.request_shutdown();
    }
}

impl ControlCommandReceiver for ControlCommandDispatcher {
    fn on_command(&self, command: ControlCommand) {
        debug!(
            "Dispatching {} command {}",
            command.command_type(),
            command.command_id()
        );

        match command.command_type() {
            ControlCommandType::Start | ControlCommandType::HealthPing => {
                info!(
                    "{} command {} received",
                    command.command_type(),
                    command.command_id()
                );
            }
            ControlCommandType::Navigate => self.navigate(&command),
            ControlCommandType::Shutdown => self.request_shutdown(&command),
        }
    }

    /// Advisory. The collaborators belong to the caller.
    fn shutdown(&self) {
        info!("Control command dispatcher shut down");
    }
}
