use crate::helpers::start_echo_server;

use control_core::CONTROL_SERVER_BASE_URL;
use control_core::connection::{
    ConnectionListener, ConnectionManager, MessageChannel, WsMessageChannel, default_tls_config,
};
use control_core::error::connection::ConnectionError;
use control_core::protocol::{Message, parse};

use std::io::Read;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<&'static str>>,
}

impl ConnectionListener for EventLog {
    fn on_connecting(&self) {
        self.events.lock().unwrap().push("connecting");
    }

    fn on_connected(&self) {
        self.events.lock().unwrap().push("connected");
    }

    fn on_disconnected(&self) {
        self.events.lock().unwrap().push("disconnected");
    }
}

/// **VALUE**: Verifies the manager drives a real WebSocket: connect, send, receive, disconnect.
///
/// **WHY THIS MATTERS**: The trait-level tests use a scripted channel. This proves the concrete
/// channel honours the same contract over a socket.
///
/// **BUG THIS CATCHES**: Would catch text frames being sent as binary, `is_connected` staying
/// false after the handshake, or close leaving the manager ready.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_echo_server_when_manager_sends_hello_then_receives_it_back() {
    // GIVEN
    let port = start_echo_server().await;
    let url = format!("{CONTROL_SERVER_BASE_URL}:{port}");

    // WHEN: Blocking client work on a blocking thread
    let (echoed, events, ready_after) = tokio::task::spawn_blocking(move || {
        let manager = ConnectionManager::new(WsMessageChannel::new(url));
        let log = Arc::new(EventLog::default());
        manager.add_listener(log.clone());

        manager.connect().expect("connect should succeed");
        manager
            .send_message(r#"{"type":"HELLO","sessionToken":"abc"}"#)
            .expect("send should succeed");
        let echoed = manager.receive_message().expect("receive should succeed");
        manager.disconnect();

        let events = log.events.lock().unwrap().clone();
        (echoed, events, manager.is_ready())
    })
    .await
    .unwrap();

    // THEN
    assert_eq!(
        parse(&echoed).unwrap(),
        Message::Hello {
            session_token: "abc".to_string()
        }
    );
    assert_eq!(events, vec!["connecting", "connected", "disconnected"]);
    assert!(!ready_after);
}

#[test]
fn given_unopened_channel_when_send_then_not_connected() {
    let mut channel = WsMessageChannel::new("ws://127.0.0.1:9");

    assert!(!channel.is_connected());
    assert!(matches!(
        channel.send("x"),
        Err(ConnectionError::NotConnected { .. })
    ));
    assert!(channel.close().is_ok());
}

#[test]
fn given_non_ws_url_when_connect_then_transport_error() {
    let mut channel = WsMessageChannel::new("https://127.0.0.1:9");

    assert!(matches!(
        channel.connect(),
        Err(ConnectionError::Transport { .. })
    ));
}

/// **VALUE**: Verifies a `wss://` URL is dialled through the TLS connector.
///
/// **WHY THIS MATTERS**: Remote controllers connect over TLS; a plaintext upgrade request sent
/// to a TLS endpoint fails with an opaque error, or worse, leaks the request in the clear.
///
/// **BUG THIS CATCHES**: Would catch `wss` being rejected as an unsupported scheme, or being
/// accepted but sent as plain HTTP.
#[test]
fn given_wss_url_when_connect_then_tls_client_hello_sent() {
    // GIVEN: A raw TCP listener that records the first byte the client writes
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut first = [0u8; 1];
        stream.read_exact(&mut first).unwrap();
        first[0]
    });

    // WHEN: Connecting with wss; the listener hangs up after one byte
    let mut channel = WsMessageChannel::new(format!("wss://127.0.0.1:{port}"))
        .with_connect_timeout(Duration::from_secs(2));
    let result = channel.connect();

    // THEN: The handshake failed, but only after a TLS handshake record went out
    assert!(
        matches!(result, Err(ConnectionError::Transport { .. })),
        "got {result:?}"
    );
    assert_eq!(server.join().unwrap(), 0x16, "expected a TLS handshake record");
    assert!(!channel.is_connected());
}

#[test]
fn given_bundled_roots_when_default_tls_config_built_then_succeeds() {
    assert!(default_tls_config().is_ok());
}
