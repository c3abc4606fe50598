use crate::helpers::{
    TEST_SESSION_TOKEN, connect_to_server, handshake, receive_response, request,
    start_test_server,
};

use control_core::proto::{
    OpenPageRequest, PageStatusRequest, ShutdownRequest, control_request, control_response,
};
use control_core::service::{MSG_HANDSHAKE_REQUIRED, MSG_SHUTTING_DOWN};

use models::Command;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

fn open_page(command_id: &str, url: &str) -> control_request::Payload {
    control_request::Payload::OpenPage(OpenPageRequest {
        command_id: command_id.to_string(),
        page_url: url.to_string(),
    })
}

/// **VALUE**: Verifies OpenPage over the wire is rejected before a handshake.
///
/// **WHY THIS MATTERS**: This is the end-to-end authentication guarantee of the control server.
///
/// **BUG THIS CATCHES**: Would catch sessions sharing authentication state, or the server
/// answering with a transport error instead of a structured rejection.
#[tokio::test]
async fn given_no_handshake_when_open_page_over_wire_then_rejected_and_queue_empty() {
    // GIVEN
    let (handle, queue) = start_test_server().await;
    let mut ws = connect_to_server(handle.port()).await;

    // WHEN
    let response = request(&mut ws, 5, open_page("cmd-1", "https://x")).await;

    // THEN
    assert_eq!(response.request_id, 5);
    match response.payload {
        Some(control_response::Payload::OpenPage(resp)) => {
            assert!(!resp.accepted);
            assert_eq!(resp.message, MSG_HANDSHAKE_REQUIRED);
        }
        other => panic!("Expected OpenPageResponse, got {other:?}"),
    }
    assert!(queue.is_empty());
}

/// **VALUE**: Verifies the authenticated path end to end.
///
/// **WHY THIS MATTERS**: Handshake then OpenPage is the host's main job.
///
/// **BUG THIS CATCHES**: Would catch the server creating a new session per frame instead of
/// per connection.
#[tokio::test]
async fn given_handshake_when_open_page_over_wire_then_command_queued() {
    // GIVEN
    let (handle, queue) = start_test_server().await;
    let mut ws = connect_to_server(handle.port()).await;
    let auth = handshake(&mut ws, TEST_SESSION_TOKEN).await;
    assert!(auth.success, "Handshake should succeed: {}", auth.message);

    // WHEN
    let response = request(&mut ws, 2, open_page("cmd-2", "https://y")).await;

    // THEN
    match response.payload {
        Some(control_response::Payload::OpenPage(resp)) => {
            assert!(resp.accepted);
            assert_eq!(resp.command_id, "cmd-2");
        }
        other => panic!("Expected OpenPageResponse, got {other:?}"),
    }
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.dequeue(), Some(Command::open_page("cmd-2", "https://y")));
}

/// **VALUE**: Verifies an undecodable frame gets an error response and the connection survives.
///
/// **WHY THIS MATTERS**: A single corrupt frame from a buggy controller must not tear down its
/// authenticated session.
///
/// **BUG THIS CATCHES**: Would catch the connection closing on decode errors.
#[tokio::test]
async fn given_garbage_frame_when_sent_then_error_response_and_session_continues() {
    // GIVEN
    let (handle, _queue) = start_test_server().await;
    let mut ws = connect_to_server(handle.port()).await;
    assert!(handshake(&mut ws, TEST_SESSION_TOKEN).await.success);

    // WHEN: Invalid protobuf (truncated varint)
    ws.send(Message::Binary(vec![0xff, 0xff, 0xff].into()))
        .await
        .unwrap();

    // THEN: Error response
    let response = receive_response(&mut ws).await;
    assert!(matches!(
        response.payload,
        Some(control_response::Payload::Error(_))
    ));

    // AND: Still authenticated on the same connection
    let status = request(
        &mut ws,
        3,
        control_request::Payload::PageStatus(PageStatusRequest {
            command_id: "cmd-x".to_string(),
        }),
    )
    .await;
    match status.payload {
        Some(control_response::Payload::PageStatus(resp)) => assert_eq!(resp.status, "UNKNOWN"),
        other => panic!("Expected PageStatusResponse, got {other:?}"),
    }
}

/// **VALUE**: Verifies stopping the server latches shutdown and closes open sessions.
///
/// **WHY THIS MATTERS**: Once teardown starts, no command may be admitted through any open
/// connection.
///
/// **BUG THIS CATCHES**: Would catch `stop()` closing the listener without flipping the latch,
/// or being unsafe to call twice.
#[tokio::test]
async fn given_running_server_when_stopped_then_latched_and_connection_closed() {
    // GIVEN
    let (handle, queue) = start_test_server().await;
    let mut ws = connect_to_server(handle.port()).await;
    assert!(handshake(&mut ws, TEST_SESSION_TOKEN).await.success);

    // WHEN
    handle.stop();
    handle.stop();

    // THEN
    assert!(handle.service().is_shutting_down());

    let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("Server should close the connection");
    assert!(
        matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))),
        "got {next:?}"
    );

    let session = handle.service().open_session();
    assert_eq!(session.shutdown().message, MSG_SHUTTING_DOWN);
    assert!(queue.is_empty());

    handle.shutdown().await;
}

#[tokio::test]
async fn given_unauthenticated_client_when_shutdown_over_wire_then_acknowledged() {
    let (handle, queue) = start_test_server().await;
    let mut ws = connect_to_server(handle.port()).await;

    let response = request(
        &mut ws,
        9,
        control_request::Payload::Shutdown(ShutdownRequest {}),
    )
    .await;

    match response.payload {
        Some(control_response::Payload::Shutdown(resp)) => assert!(resp.acknowledged),
        other => panic!("Expected ShutdownResponse, got {other:?}"),
    }
    assert_eq!(queue.dequeue(), Some(Command::Shutdown));
}
