//! Handle to a running control server.

use crate::service::control_service::ControlService;

use std::net::SocketAddr;

use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Returned by [`start_control_server`](crate::service::start_control_server).
///
/// Dropping the handle also ends the accept loop and open sessions.
pub struct ControlServerHandle {
    local_addr: SocketAddr,
    service: ControlService,
    stop_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl ControlServerHandle {
    pub(crate) fn new(
        local_addr: SocketAddr,
        service: ControlService,
        stop_tx: watch::Sender<bool>,
        accept_task: JoinHandle<()>,
    ) -> Self {
        Self {
            local_addr,
            service,
            stop_tx,
            accept_task,
        }
    }

    /// Address actually bound (useful when started on port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn service(&self) -> &ControlService {
        &self.service
    }

    /// Latch the service into shutdown, then stop accepting and close open
    /// sessions. Safe to call more than once.
    pub fn stop(&self) {
        self.service.begin_shutdown();
        if !self.stop_tx.send_replace(true) {
            info!("Control server on {} stopping", self.local_addr);
        }
    }

    /// Stop and wait for the accept loop to exit.
    pub async fn shutdown(self) {
        self.stop();
        let _ = self.accept_task.await;
        info!("Control server on {} stopped", self.local_addr);
    }
}
