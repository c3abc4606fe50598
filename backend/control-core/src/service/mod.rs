//! Control service and the WebSocket server that exposes it.

mod control_service;
mod handle;
mod server;
mod session_state;

pub use control_service::{
    ControlService, ControlSession, MSG_COMMAND_ACCEPTED, MSG_HANDSHAKE_ACCEPTED,
    MSG_HANDSHAKE_REQUIRED, MSG_INVALID_SESSION_TOKEN, MSG_MISSING_CLIENT_VERSION,
    MSG_MISSING_COMMAND_ID, MSG_MISSING_PAGE_URL, MSG_SHUTDOWN_ACKNOWLEDGED, MSG_SHUTTING_DOWN,
    MSG_STATUS_NOT_TRACKED, PAGE_STATUS_ERROR, PAGE_STATUS_UNAVAILABLE, PAGE_STATUS_UNKNOWN,
};
pub use handle::ControlServerHandle;
pub use server::start_control_server;
pub(crate) use server::accept_retry_delay;
