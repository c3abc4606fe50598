use ui_host::browser::LoggingBrowser;
use ui_host::error::HostError;
use ui_host::host::Host;
use ui_host::logger::{default_log_dir, initialize as LoggerInitialize};

use control_core::SERVER_VERSION;
use control_core::config::HostConfig;
use control_core::dispatcher::ShutdownLatch;

use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), HostError> {
    // Logger first so config resolution is visible
    LoggerInitialize(&default_log_dir()?)?;
    info!("UI host {SERVER_VERSION} starting");

    let config = HostConfig::resolve(&HostConfig::default_dir()?)?;
    info!("Control channel: {:?}", config.channel);

    Host::new(
        config,
        Arc::new(LoggingBrowser::new()),
        Arc::new(ShutdownLatch::new()),
    )
    .start()?
    .wait()
}
