//! Request/response state machine behind the control server.
//!
//! Every operation returns a structured response. Rejections (shutting down,
//! unauthenticated, missing fields) are carried in the response fields and
//! never surface as transport errors.

use crate::SERVER_VERSION;
use crate::protocol::Handshake;
use crate::proto::{
    ControlRequest, ControlResponse, ErrorCode, ErrorResponse, HandshakeResponse,
    OpenPageResponse, PageStatusResponse, ShutdownResponse, control_request, control_response,
};
use crate::queue::CommandQueue;
use crate::service::session_state::SessionState;

use common::RedactedSecret;
use models::Command;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

pub const MSG_SHUTTING_DOWN: &str = "Server is shutting down";
pub const MSG_INVALID_SESSION_TOKEN: &str = "Invalid session token";
pub const MSG_MISSING_CLIENT_VERSION: &str = "Missing client version";
pub const MSG_HANDSHAKE_ACCEPTED: &str = "Handshake accepted";
pub const MSG_HANDSHAKE_REQUIRED: &str = "Handshake required";
pub const MSG_MISSING_COMMAND_ID: &str = "Missing command_id";
pub const MSG_MISSING_PAGE_URL: &str = "Missing page_url";
pub const MSG_COMMAND_ACCEPTED: &str = "Command accepted and queued for execution";
pub const MSG_STATUS_NOT_TRACKED: &str = "Page status tracking not implemented";
pub const MSG_SHUTDOWN_ACKNOWLEDGED: &str = "Shutdown acknowledged and queued for execution";

pub const PAGE_STATUS_UNAVAILABLE: &str = "UNAVAILABLE";
pub const PAGE_STATUS_ERROR: &str = "ERROR";
pub const PAGE_STATUS_UNKNOWN: &str = "UNKNOWN";

struct ServiceShared {
    handshake: Handshake,
    queue: Arc<CommandQueue>,
    shutting_down: AtomicBool,
}

/// Service-wide state shared by every session.
///
/// Cheap to clone; all clones see the same queue and shutdown latch.
#[derive(Clone)]
pub struct ControlService {
    shared: Arc<ServiceShared>,
}

impl ControlService {
    pub fn new(session_token: impl Into<RedactedSecret>, queue: Arc<CommandQueue>) -> Self {
        Self {
            shared: Arc::new(ServiceShared {
                handshake: Handshake::new(session_token),
                queue,
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn queue(&self) -> &Arc<CommandQueue> {
        &self.shared.queue
    }

    /// Latch the service into shutdown. Once set, no operation admits work.
    pub fn begin_shutdown(&self) {
        if !self.shared.shutting_down.swap(true, Ordering::SeqCst) {
            info!("Control service is shutting down, no further commands will be admitted");
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shared.shutting_down.load(Ordering::SeqCst)
    }

    /// Start a new unauthenticated session (one per client connection).
    pub fn open_session(&self) -> ControlSession {
        ControlSession {
            service: self.clone(),
            state: SessionState::new(),
        }
    }
}

/// One client's view of the service.
pub struct ControlSession {
    service: ControlService,
    state: SessionState,
}

impl ControlSession {
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn handshake(&mut self, session_token: &str, client_version: &str) -> HandshakeResponse {
        let reject = |message: &str| HandshakeResponse {
            success: false,
            message: message.to_string(),
            server_version: SERVER_VERSION.to_string(),
        };

        if self.service.is_shutting_down() {
            return reject(MSG_SHUTTING_DOWN);
        }

        if self
            .service
            .shared
            .handshake
            .validate_hello(session_token)
            .is_err()
        {
            warn!("Handshake failed: {}", MSG_INVALID_SESSION_TOKEN);
            return reject(MSG_INVALID_SESSION_TOKEN);
        }

        if client_version.is_empty() {
            warn!("Handshake failed: {}", MSG_MISSING_CLIENT_VERSION);
            return reject(MSG_MISSING_CLIENT_VERSION);
        }

        self.state.mark_authenticated();
        info!("Handshake successful with client version {}", client_version);

        HandshakeResponse {
            success: true,
            message: MSG_HANDSHAKE_ACCEPTED.to_string(),
            server_version: SERVER_VERSION.to_string(),
        }
    }

    pub fn open_page(&self, command_id: &str, page_url: &str) -> OpenPageResponse {
        info!("OpenPage request: command_id={command_id} page_url={page_url}");

        let rejection = if self.service.is_shutting_down() {
            Some(MSG_SHUTTING_DOWN)
        } else if !self.state.is_authenticated() {
            Some(MSG_HANDSHAKE_REQUIRED)
        } else if command_id.is_empty() {
            Some(MSG_MISSING_COMMAND_ID)
        } else if page_url.is_empty() {
            Some(MSG_MISSING_PAGE_URL)
        } else {
            None
        };

        if let Some(message) = rejection {
            warn!("OpenPage rejected (command_id={command_id}): {message}");
            return OpenPageResponse {
                command_id: command_id.to_string(),
                accepted: false,
                message: message.to_string(),
            };
        }

        self.service
            .queue()
            .enqueue(Command::open_page(command_id, page_url));
        info!("OpenPage accepted and queued (command_id={command_id})");

        OpenPageResponse {
            command_id: command_id.to_string(),
            accepted: true,
            message: MSG_COMMAND_ACCEPTED.to_string(),
        }
    }

    /// Placeholder status: pages are not tracked.
    pub fn page_status(&self, command_id: &str) -> PageStatusResponse {
        let (status, message) = if self.service.is_shutting_down() {
            (PAGE_STATUS_UNAVAILABLE, MSG_SHUTTING_DOWN)
        } else if !self.state.is_authenticated() {
            (PAGE_STATUS_ERROR, MSG_HANDSHAKE_REQUIRED)
        } else {
            (PAGE_STATUS_UNKNOWN, MSG_STATUS_NOT_TRACKED)
        };

        PageStatusResponse {
            command_id: command_id.to_string(),
            status: status.to_string(),
            message: message.to_string(),
            progress_percent: -1,
            timestamp_millis: 0,
        }
    }

    /// Queue a shutdown. Does not require a handshake and does not flip the
    /// service's shutdown latch; the process owning the service does that.
    pub fn shutdown(&self) -> ShutdownResponse {
        if self.service.is_shutting_down() {
            warn!("Shutdown rejected: {}", MSG_SHUTTING_DOWN);
            return ShutdownResponse {
                acknowledged: false,
                message: MSG_SHUTTING_DOWN.to_string(),
            };
        }

        self.service.queue().enqueue(Command::Shutdown);
        info!("Shutdown acknowledged and queued");

        ShutdownResponse {
            acknowledged: true,
            message: MSG_SHUTDOWN_ACKNOWLEDGED.to_string(),
        }
    }

    /// Route one decoded wire request to its operation.
    pub fn handle_request(&mut self, request: ControlRequest) -> ControlResponse {
        use control_request::Payload as Request;
        use control_response::Payload as Response;

        let payload = match request.payload {
            Some(Request::Handshake(req)) => {
                Response::Handshake(self.handshake(&req.session_token, &req.client_version))
            }
            Some(Request::OpenPage(req)) => {
                Response::OpenPage(self.open_page(&req.command_id, &req.page_url))
            }
            Some(Request::PageStatus(req)) => Response::PageStatus(self.page_status(&req.command_id)),
            Some(Request::Shutdown(_)) => Response::Shutdown(self.shutdown()),
            None => {
                warn!("Request {} carried no payload", request.request_id);
                Response::Error(ErrorResponse {
                    code: ErrorCode::InvalidMessage as i32,
                    message: "No payload in message".to_string(),
                })
            }
        };

        ControlResponse {
            request_id: request.request_id,
            payload: Some(payload),
        }
    }
}
