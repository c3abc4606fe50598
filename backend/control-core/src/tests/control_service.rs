use crate::proto::{
    ControlRequest, HandshakeRequest, OpenPageRequest, control_request, control_response,
};
use crate::queue::CommandQueue;
use crate::service::{
    ControlService, MSG_COMMAND_ACCEPTED, MSG_HANDSHAKE_ACCEPTED, MSG_HANDSHAKE_REQUIRED,
    MSG_INVALID_SESSION_TOKEN, MSG_MISSING_CLIENT_VERSION, MSG_MISSING_COMMAND_ID,
    MSG_MISSING_PAGE_URL, MSG_SHUTDOWN_ACKNOWLEDGED, MSG_SHUTTING_DOWN, PAGE_STATUS_ERROR,
    PAGE_STATUS_UNAVAILABLE, PAGE_STATUS_UNKNOWN,
};

use models::Command;

use std::sync::Arc;

const TOKEN: &str = "right";

fn service() -> (ControlService, Arc<CommandQueue>) {
    let queue = Arc::new(CommandQueue::new());
    (ControlService::new(TOKEN, Arc::clone(&queue)), queue)
}

/// **VALUE**: Verifies that OpenPage before a handshake is rejected and nothing is queued.
///
/// **WHY THIS MATTERS**: The handshake is the only authentication on the control channel. A
/// command admitted before it would let any local process drive the browser.
///
/// **BUG THIS CATCHES**: Would catch the authentication gate being skipped or ordered after
/// the enqueue.
#[test]
fn given_no_handshake_when_open_page_then_rejected_and_queue_untouched() {
    // GIVEN: A fresh session
    let (service, queue) = service();
    let session = service.open_session();

    // WHEN
    let response = session.open_page("cmd-1", "https://x");

    // THEN
    assert!(!response.accepted);
    assert_eq!(response.message, MSG_HANDSHAKE_REQUIRED);
    assert_eq!(response.command_id, "cmd-1");
    assert!(queue.is_empty());
}

/// **VALUE**: Verifies the happy path: handshake, then OpenPage lands exactly one command.
///
/// **WHY THIS MATTERS**: This is the primary control flow of the host.
///
/// **BUG THIS CATCHES**: Would catch authentication not sticking to the session, or the
/// command being queued with swapped fields.
#[test]
fn given_valid_handshake_when_open_page_then_command_is_queued() {
    // GIVEN: An authenticated session
    let (service, queue) = service();
    let mut session = service.open_session();
    let handshake = session.handshake(TOKEN, "1.0");
    assert!(handshake.success);
    assert_eq!(handshake.message, MSG_HANDSHAKE_ACCEPTED);
    assert!(!handshake.server_version.is_empty());

    // WHEN
    let response = session.open_page("cmd-2", "https://y");

    // THEN
    assert!(response.accepted);
    assert_eq!(response.command_id, "cmd-2");
    assert_eq!(response.message, MSG_COMMAND_ACCEPTED);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.dequeue(), Some(Command::open_page("cmd-2", "https://y")));
}

/// **VALUE**: Verifies the handshake failure reasons and their order.
///
/// **WHY THIS MATTERS**: Controllers surface these messages to operators; a wrong reason sends
/// them debugging the wrong thing.
///
/// **BUG THIS CATCHES**: Would catch the version check running before the token check, or a
/// failed handshake still authenticating the session.
#[test]
fn given_bad_handshakes_when_handshake_then_reports_specific_reason() {
    // GIVEN
    let (service, _queue) = service();
    let mut session = service.open_session();

    // WHEN/THEN: Wrong token wins over missing version
    let wrong = session.handshake("wrong", "");
    assert!(!wrong.success);
    assert_eq!(wrong.message, MSG_INVALID_SESSION_TOKEN);

    // WHEN/THEN: Right token, no version
    let missing_version = session.handshake(TOKEN, "");
    assert!(!missing_version.success);
    assert_eq!(missing_version.message, MSG_MISSING_CLIENT_VERSION);

    assert!(!session.is_authenticated());
}

/// **VALUE**: Verifies the RPC handshake forgives outer whitespace on the token.
///
/// **WHY THIS MATTERS**: The RPC and session-protocol handshakes share one token policy.
///
/// **BUG THIS CATCHES**: Would catch the RPC path reverting to an untrimmed comparison.
#[test]
fn given_token_with_trailing_newline_when_handshake_then_succeeds() {
    let (service, _queue) = service();
    let mut session = service.open_session();

    assert!(session.handshake("right\n", "1.0").success);
    assert!(session.is_authenticated());
}

/// **VALUE**: Verifies OpenPage field validation after authentication.
///
/// **WHY THIS MATTERS**: Commands without an id cannot be correlated and commands without a
/// URL cannot be executed; neither may reach the UI thread.
///
/// **BUG THIS CATCHES**: Would catch either check being dropped.
#[test]
fn given_authenticated_session_when_open_page_missing_fields_then_rejected() {
    // GIVEN
    let (service, queue) = service();
    let mut session = service.open_session();
    assert!(session.handshake(TOKEN, "1.0").success);

    // WHEN/THEN
    let no_id = session.open_page("", "https://x");
    assert!(!no_id.accepted);
    assert_eq!(no_id.message, MSG_MISSING_COMMAND_ID);

    let no_url = session.open_page("cmd-3", "");
    assert!(!no_url.accepted);
    assert_eq!(no_url.message, MSG_MISSING_PAGE_URL);
    assert_eq!(no_url.command_id, "cmd-3");

    assert!(queue.is_empty());
}

/// **VALUE**: Verifies authentication is per session, not per service.
///
/// **WHY THIS MATTERS**: Each client connection opens its own session. A second client must not
/// inherit the first client's handshake.
///
/// **BUG THIS CATCHES**: Would catch the authenticated flag living on the shared service.
#[test]
fn given_two_sessions_when_only_first_authenticates_then_second_is_still_rejected() {
    let (service, queue) = service();
    let mut first = service.open_session();
    let second = service.open_session();

    assert!(first.handshake(TOKEN, "1.0").success);

    assert!(first.open_page("a", "https://a").accepted);
    assert!(!second.open_page("b", "https://b").accepted);
    assert_eq!(queue.len(), 1);
}

/// **VALUE**: Verifies the shutdown latch is the first gate on all four operations.
///
/// **WHY THIS MATTERS**: Once teardown starts, nothing may be admitted. Checking the latch first
/// closes the race between accepting work and exiting.
///
/// **BUG THIS CATCHES**: Would catch any operation skipping the latch, including Shutdown and
/// an already authenticated OpenPage.
#[test]
fn given_shutting_down_when_any_operation_then_rejected_without_queueing() {
    // GIVEN: An authenticated session, then the latch
    let (service, queue) = service();
    let mut session = service.open_session();
    assert!(session.handshake(TOKEN, "1.0").success);
    service.begin_shutdown();
    assert!(service.is_shutting_down());

    // WHEN/THEN
    let handshake = session.handshake(TOKEN, "1.0");
    assert!(!handshake.success);
    assert_eq!(handshake.message, MSG_SHUTTING_DOWN);

    let open_page = session.open_page("cmd-1", "https://x");
    assert!(!open_page.accepted);
    assert_eq!(open_page.message, MSG_SHUTTING_DOWN);

    let status = session.page_status("cmd-1");
    assert_eq!(status.status, PAGE_STATUS_UNAVAILABLE);
    assert_eq!(status.message, MSG_SHUTTING_DOWN);

    let shutdown = session.shutdown();
    assert!(!shutdown.acknowledged);
    assert_eq!(shutdown.message, MSG_SHUTTING_DOWN);

    assert!(queue.is_empty());
}

/// **VALUE**: Verifies Shutdown is accepted without a handshake and does not flip the latch.
///
/// **WHY THIS MATTERS**: A controller must be able to stop a host even if its handshake keeps
/// failing. The latch belongs to the process owning the service.
///
/// **BUG THIS CATCHES**: Would catch Shutdown requiring authentication, or setting the latch
/// itself and blocking the command already queued.
#[test]
fn given_unauthenticated_session_when_shutdown_then_acknowledged_and_queued() {
    let (service, queue) = service();
    let session = service.open_session();

    let response = session.shutdown();

    assert!(response.acknowledged);
    assert_eq!(response.message, MSG_SHUTDOWN_ACKNOWLEDGED);
    assert_eq!(queue.dequeue(), Some(Command::Shutdown));
    assert!(!service.is_shutting_down());
}

/// **VALUE**: Verifies PageStatus answers structurally in both auth states.
///
/// **WHY THIS MATTERS**: Status queries must never fail at the transport level.
///
/// **BUG THIS CATCHES**: Would catch the placeholder values changing or the auth check missing.
#[test]
fn given_sessions_when_page_status_then_returns_placeholder_or_error() {
    let (service, _queue) = service();
    let mut session = service.open_session();

    let unauthenticated = session.page_status("cmd-9");
    assert_eq!(unauthenticated.status, PAGE_STATUS_ERROR);
    assert_eq!(unauthenticated.message, MSG_HANDSHAKE_REQUIRED);
    assert_eq!(unauthenticated.command_id, "cmd-9");

    assert!(session.handshake(TOKEN, "1.0").success);
    let status = session.page_status("cmd-9");
    assert_eq!(status.status, PAGE_STATUS_UNKNOWN);
    assert_eq!(status.progress_percent, -1);
    assert_eq!(status.timestamp_millis, 0);
}

#[test]
fn given_wire_requests_when_handle_request_then_routes_and_echoes_request_id() {
    let (service, queue) = service();
    let mut session = service.open_session();

    let handshake = session.handle_request(ControlRequest {
        request_id: 7,
        payload: Some(control_request::Payload::Handshake(HandshakeRequest {
            session_token: TOKEN.to_string(),
            client_version: "1.0".to_string(),
        })),
    });
    assert_eq!(handshake.request_id, 7);
    assert!(matches!(
        handshake.payload,
        Some(control_response::Payload::Handshake(ref r)) if r.success
    ));

    let open_page = session.handle_request(ControlRequest {
        request_id: 8,
        payload: Some(control_request::Payload::OpenPage(OpenPageRequest {
            command_id: "cmd-8".to_string(),
            page_url: "https://z".to_string(),
        })),
    });
    assert_eq!(open_page.request_id, 8);
    assert!(matches!(
        open_page.payload,
        Some(control_response::Payload::OpenPage(ref r)) if r.accepted
    ));
    assert_eq!(queue.len(), 1);

    let empty = session.handle_request(ControlRequest {
        request_id: 9,
        payload: None,
    });
    assert!(matches!(
        empty.payload,
        Some(control_response::Payload::Error(_))
    ));
}
