//! Test helpers for control-core integration tests.
//!
//! - Starting a control server on a free port
//! - Sending/receiving protobuf frames over WebSocket
//! - A plain echo WebSocket server for channel tests
//! - Downstream receivers that record what they were given

use control_core::CONTROL_SERVER_BASE_URL;
use control_core::dispatcher::ControlCommandReceiver;
use control_core::proto::{
    ControlRequest, ControlResponse, HandshakeRequest, HandshakeResponse, control_request,
    control_response,
};
use control_core::queue::CommandQueue;
use control_core::service::{ControlServerHandle, ControlService, start_control_server};

use models::ControlCommand;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use prost::Message as ProstMessage;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub const TEST_SESSION_TOKEN: &str = "test-token-12345";
pub const TEST_CLIENT_VERSION: &str = "1.0";

pub type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start a control server on a free loopback port.
pub async fn start_test_server() -> (ControlServerHandle, Arc<CommandQueue>) {
    let queue = Arc::new(CommandQueue::new());
    let service = ControlService::new(TEST_SESSION_TOKEN, Arc::clone(&queue));
    let handle = start_control_server(0, service)
        .await
        .expect("Failed to start control server");
    (handle, queue)
}

pub async fn connect_to_server(port: u16) -> ClientStream {
    let url = format!("{CONTROL_SERVER_BASE_URL}:{port}");
    let (ws_stream, _) = connect_async(&url)
        .await
        .expect("Failed to connect to control server");
    ws_stream
}

pub async fn send_protobuf<T: ProstMessage>(ws: &mut ClientStream, message: &T) {
    let mut buf = Vec::new();
    message.encode(&mut buf).expect("Failed to encode protobuf");
    ws.send(Message::Binary(buf.into()))
        .await
        .expect("Failed to send message");
}

pub async fn receive_response(ws: &mut ClientStream) -> ControlResponse {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("Timed out waiting for response")
        .expect("No message received")
        .expect("Error receiving message");

    let bytes = msg.into_data();
    ControlResponse::decode(&bytes[..]).expect("Failed to decode protobuf")
}

pub async fn request(
    ws: &mut ClientStream,
    request_id: u64,
    payload: control_request::Payload,
) -> ControlResponse {
    send_protobuf(
        ws,
        &ControlRequest {
            request_id,
            payload: Some(payload),
        },
    )
    .await;
    receive_response(ws).await
}

pub async fn handshake(ws: &mut ClientStream, token: &str) -> HandshakeResponse {
    let response = request(
        ws,
        1,
        control_request::Payload::Handshake(HandshakeRequest {
            session_token: token.to_string(),
            client_version: TEST_CLIENT_VERSION.to_string(),
        }),
    )
    .await;

    match response.payload {
        Some(control_response::Payload::Handshake(resp)) => resp,
        other => panic!("Expected HandshakeResponse, got {other:?}"),
    }
}

/// Echo server for text frames. Returns its port.
pub async fn start_echo_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind echo server");
    let port = listener.local_addr().expect("No local addr").port();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(msg)) = ws.next().await {
                    if msg.is_text() && ws.send(msg).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    port
}

/// Downstream receiver that records every command.
#[derive(Default)]
pub struct RecordingReceiver {
    commands: Mutex<Vec<ControlCommand>>,
}

impl RecordingReceiver {
    pub fn commands(&self) -> Vec<ControlCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Poll until at least `count` commands arrived or `timeout` elapsed.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> Vec<ControlCommand> {
        let deadline = Instant::now() + timeout;
        loop {
            let commands = self.commands();
            if commands.len() >= count || Instant::now() >= deadline {
                return commands;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

impl ControlCommandReceiver for RecordingReceiver {
    fn on_command(&self, command: ControlCommand) {
        self.commands.lock().unwrap().push(command);
    }
}
