//! Wires configuration, collaborators and the active control channel.

use crate::consumer::{CONSUMER_TICK, UiConsumer};
use crate::error::HostError;

use common::ErrorLocation;

use control_core::config::{ChannelMode, HostConfig};
use control_core::dispatcher::{
    BrowserControl, ControlCommandDispatcher, ControlCommandReceiver, ShutdownSink,
};
use control_core::file_channel::FileEncryptedCommandReceiver;
use control_core::queue::CommandQueue;
use control_core::service::{ControlServerHandle, ControlService, start_control_server};

use models::{Command, ControlCommand};

use std::panic::Location;
use std::sync::Arc;
use std::thread;

use log::info;
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};

/// Command id used for the navigation to `start_url`.
pub const START_COMMAND_ID: &str = "start-url";

/// A configured but not yet running host.
pub struct Host {
    config: HostConfig,
    browser: Arc<dyn BrowserControl>,
    shutdown: Arc<dyn ShutdownSink>,
}

/// A host with its control channel open.
///
/// [`wait`](Self::wait) turns the calling thread into the UI thread.
pub struct RunningHost {
    dispatcher: Arc<ControlCommandDispatcher>,
    shutdown: Arc<dyn ShutdownSink>,
    channel: ActiveChannel,
}

enum ActiveChannel {
    Rpc {
        runtime: Runtime,
        server: ControlServerHandle,
        queue: Arc<CommandQueue>,
    },
    EncryptedFile {
        receiver: FileEncryptedCommandReceiver,
    },
}

impl Host {
    pub fn new(
        config: HostConfig,
        browser: Arc<dyn BrowserControl>,
        shutdown: Arc<dyn ShutdownSink>,
    ) -> Self {
        Self {
            config,
            browser,
            shutdown,
        }
    }

    /// Load the start page and open the configured control channel.
    ///
    /// Must not be called from inside an async runtime: the RPC channel owns
    /// its own.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if the config is invalid or the channel cannot start.
    pub fn start(self) -> Result<RunningHost, HostError> {
        self.config.validate()?;

        let dispatcher = Arc::new(ControlCommandDispatcher::new(
            Arc::clone(&self.browser),
            Arc::clone(&self.shutdown),
        ));

        info!("Loading start page {}", self.config.start_url);
        dispatcher.on_command(ControlCommand::from(Command::open_page(
            START_COMMAND_ID,
            self.config.start_url.as_str(),
        )));

        let channel = match self.config.channel {
            ChannelMode::Rpc => self.start_rpc()?,
            ChannelMode::EncryptedFile => self.start_encrypted_file(&dispatcher)?,
        };

        Ok(RunningHost {
            dispatcher,
            shutdown: self.shutdown,
            channel,
        })
    }

    fn start_rpc(&self) -> Result<ActiveChannel, HostError> {
        let runtime = RuntimeBuilder::new_multi_thread()
            .thread_name("control-rpc")
            .enable_all()
            .build()
            .map_err(|e| HostError::Host {
                message: format!("Failed to build async runtime: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let queue = Arc::new(CommandQueue::new());
        let service = ControlService::new(self.config.session_token.clone(), Arc::clone(&queue));
        let server = runtime.block_on(start_control_server(self.config.ipc_port, service))?;

        info!("RPC control channel on port {}", server.port());
        Ok(ActiveChannel::Rpc {
            runtime,
            server,
            queue,
        })
    }

    fn start_encrypted_file(
        &self,
        dispatcher: &Arc<ControlCommandDispatcher>,
    ) -> Result<ActiveChannel, HostError> {
        let (Some(path), Some(key)) = (&self.config.control_file, &self.config.control_key) else {
            return Err(HostError::Config {
                message: "control_file and control_key are required".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let receiver = FileEncryptedCommandReceiver::new(
            path.clone(),
            key.expose(),
            Arc::clone(dispatcher) as Arc<dyn ControlCommandReceiver>,
        )?;
        receiver.start()?;

        Ok(ActiveChannel::EncryptedFile { receiver })
    }
}

impl RunningHost {
    /// Bound RPC port, or `None` for the file channel.
    pub fn control_port(&self) -> Option<u16> {
        match &self.channel {
            ActiveChannel::Rpc { server, .. } => Some(server.port()),
            ActiveChannel::EncryptedFile { .. } => None,
        }
    }

    /// Run until a shutdown is requested, then close the channel.
    pub fn wait(self) -> Result<(), HostError> {
        match self.channel {
            ActiveChannel::Rpc {
                runtime,
                server,
                queue,
            } => {
                let downstream: Arc<dyn ControlCommandReceiver> = self.dispatcher;
                UiConsumer::new(queue, downstream, Arc::clone(&self.shutdown))
                    .run_until_shutdown();
                runtime.block_on(server.shutdown());
            }
            ActiveChannel::EncryptedFile { receiver } => {
                while !self.shutdown.is_shutdown_requested() {
                    thread::sleep(CONSUMER_TICK);
                }
                receiver.stop();
                self.dispatcher.shutdown();
            }
        }

        info!("UI host stopped");
        Ok(())
    }
}
