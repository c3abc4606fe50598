use ui_host::browser::LoggingBrowser;
use ui_host::error::HostError;
use ui_host::host::Host;

use common::RedactedSecret;

use control_core::CONTROL_SERVER_BASE_URL;
use control_core::config::{ChannelMode, HostConfig};
use control_core::dispatcher::{ShutdownLatch, ShutdownSink};
use control_core::file_channel::FileEncryptedCommandWriter;
use control_core::proto::{
    ControlRequest, ControlResponse, HandshakeRequest, OpenPageRequest, ShutdownRequest,
    control_request, control_response,
};

use models::{ControlCommandBuilder, ControlCommandType};

use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::{SinkExt, StreamExt};
use prost::Message as ProstMessage;
use tempfile::TempDir;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const TOKEN: &str = "host-test-token";
const START_URL: &str = "https://start.example";
const HOST_EXIT_TIMEOUT: Duration = Duration::from_secs(5);

fn free_port() -> u16 {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn rpc_config() -> HostConfig {
    HostConfig {
        ipc_port: free_port(),
        session_token: RedactedSecret::new(TOKEN),
        start_url: START_URL.to_string(),
        ..HostConfig::default()
    }
}

fn wait_until(mut done: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    done()
}

async fn call(
    ws: &mut tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    request_id: u64,
    payload: control_request::Payload,
) -> ControlResponse {
    let mut buf = Vec::new();
    ControlRequest {
        request_id,
        payload: Some(payload),
    }
    .encode(&mut buf)
    .unwrap();
    ws.send(Message::Binary(buf.into())).await.unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("Timed out waiting for response")
        .expect("Connection closed")
        .expect("WebSocket error");
    ControlResponse::decode(&frame.into_data()[..]).unwrap()
}

/// **VALUE**: Drives a whole RPC session against a running host: handshake, open a page,
/// shut down.
///
/// **WHY THIS MATTERS**: This is the production path. The server thread enqueues, the UI
/// thread drains, the dispatcher reaches the browser and the shutdown collaborator.
///
/// **BUG THIS CATCHES**: Would catch the consumer loop never starting, the start page being
/// skipped, `wait()` never returning after a Shutdown, or the server outliving the host.
#[test]
fn given_rpc_host_when_controller_opens_page_and_shuts_down_then_host_exits() {
    // GIVEN
    let browser = Arc::new(LoggingBrowser::new());
    let latch = Arc::new(ShutdownLatch::new());
    let running = Host::new(rpc_config(), browser.clone(), latch.clone())
        .start()
        .expect("Host should start");
    let port = running.control_port().expect("RPC host has a port");
    let host_thread = thread::spawn(move || running.wait());

    // WHEN
    let client = tokio::runtime::Runtime::new().unwrap();
    client.block_on(async {
        let (mut ws, _) = connect_async(format!("{CONTROL_SERVER_BASE_URL}:{port}"))
            .await
            .unwrap();

        let response = call(
            &mut ws,
            1,
            control_request::Payload::Handshake(HandshakeRequest {
                session_token: format!(" {TOKEN}\n"),
                client_version: "1.0".to_string(),
            }),
        )
        .await;
        assert!(matches!(
            response.payload,
            Some(control_response::Payload::Handshake(ref r)) if r.success
        ));

        let response = call(
            &mut ws,
            2,
            control_request::Payload::OpenPage(OpenPageRequest {
                command_id: "c1".to_string(),
                page_url: "https://page.example".to_string(),
            }),
        )
        .await;
        assert!(matches!(
            response.payload,
            Some(control_response::Payload::OpenPage(ref r)) if r.accepted
        ));

        // Let the UI thread navigate before asking it to stop
        let browser = browser.clone();
        tokio::task::spawn_blocking(move || {
            wait_until(|| browser.history().len() == 2, Duration::from_secs(2))
        })
        .await
        .unwrap();

        let response = call(
            &mut ws,
            3,
            control_request::Payload::Shutdown(ShutdownRequest {}),
        )
        .await;
        assert!(matches!(
            response.payload,
            Some(control_response::Payload::Shutdown(ref r)) if r.acknowledged
        ));
    });

    // THEN
    assert!(wait_until(|| host_thread.is_finished(), HOST_EXIT_TIMEOUT));
    assert!(host_thread.join().unwrap().is_ok());
    assert!(latch.is_shutdown_requested());
    assert_eq!(
        browser.history(),
        vec![START_URL, "https://page.example"]
    );

    // AND: The port is released
    assert!(
        client
            .block_on(connect_async(format!("{CONTROL_SERVER_BASE_URL}:{port}")))
            .is_err()
    );
}

/// **VALUE**: Drives the encrypted file channel end to end through a running host.
///
/// **WHY THIS MATTERS**: In file mode there is no queue; the poller thread feeds the
/// dispatcher directly and `wait()` must notice the shutdown latch.
///
/// **BUG THIS CATCHES**: Would catch the receiver never being started, or `wait()`
/// ignoring a shutdown that arrived over the file.
#[test]
fn given_file_host_when_navigate_then_shutdown_written_then_host_exits() {
    // GIVEN
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("control.bin");
    let key = BASE64.encode([7u8; 32]);
    let config = HostConfig {
        channel: ChannelMode::EncryptedFile,
        control_file: Some(path.clone()),
        control_key: Some(RedactedSecret::new(key.as_str())),
        start_url: START_URL.to_string(),
        ..HostConfig::default()
    };

    let browser = Arc::new(LoggingBrowser::new());
    let latch = Arc::new(ShutdownLatch::new());
    let running = Host::new(config, browser.clone(), latch.clone())
        .start()
        .expect("Host should start");
    assert_eq!(running.control_port(), None);
    let host_thread = thread::spawn(move || running.wait());

    let writer = FileEncryptedCommandWriter::new(&path, &key).unwrap();

    // WHEN: Navigate
    let navigate = ControlCommandBuilder::default()
        .with_command_id("n1")
        .with_type(ControlCommandType::Navigate)
        .with_payload_entry("url", "https://file.example")
        .build()
        .unwrap();
    writer.send(&navigate).unwrap();
    assert!(wait_until(
        || browser.history().len() == 2,
        Duration::from_secs(3)
    ));

    // WHEN: Shutdown, on a strictly newer mtime
    let shutdown = ControlCommandBuilder::default()
        .with_command_id("s1")
        .with_type(ControlCommandType::Shutdown)
        .build()
        .unwrap();
    writer.send(&shutdown).unwrap();
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(std::time::SystemTime::now() + Duration::from_secs(5))
        .unwrap();

    // THEN
    assert!(wait_until(|| host_thread.is_finished(), HOST_EXIT_TIMEOUT));
    assert!(host_thread.join().unwrap().is_ok());
    assert!(latch.is_shutdown_requested());
    assert_eq!(
        browser.history(),
        vec![START_URL, "https://file.example"]
    );
}

#[test]
fn given_rpc_config_without_token_when_start_then_config_error() {
    let config = HostConfig {
        ipc_port: free_port(),
        ..HostConfig::default()
    };

    let result = Host::new(
        config,
        Arc::new(LoggingBrowser::new()),
        Arc::new(ShutdownLatch::new()),
    )
    .start();

    assert!(matches!(result, Err(HostError::Config { .. })));
}
