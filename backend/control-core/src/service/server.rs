//! Control server: localhost WebSocket transport for [`ControlService`].
//!
//! - Binds `127.0.0.1` only and drops non-loopback peers
//! - Binary protobuf frames ([`ControlRequest`] in, [`ControlResponse`] out)
//! - One [`ControlSession`](crate::service::ControlSession) per connection
//! - An undecodable frame gets an [`ErrorResponse`] and the connection stays open

use crate::CONTROL_SERVER_HOSTNAME;
use crate::error::ipc::IpcError;
use crate::proto::{ControlRequest, ControlResponse, ErrorCode, ErrorResponse, control_response};
use crate::service::control_service::ControlService;
use crate::service::handle::ControlServerHandle;

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use prost::Message as ProstMessage;
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn as TokioSpawn;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

type WsWriter = SplitSink<WebSocketStream<TcpStream>, Message>;

const ACCEPT_RETRY_BASE: Duration = Duration::from_millis(100);
const ACCEPT_RETRY_MAX: Duration = Duration::from_secs(1);

/// Pause after the `consecutive_errors`-th failed accept in a row.
///
/// Accept errors such as `EMFILE` repeat until something else frees a
/// descriptor, so retrying immediately spins a core.
pub(crate) fn accept_retry_delay(consecutive_errors: u32) -> Duration {
    let exponent = consecutive_errors.saturating_sub(1).min(16);
    ACCEPT_RETRY_BASE
        .saturating_mul(1u32 << exponent)
        .min(ACCEPT_RETRY_MAX)
}

/// Start serving `service` on `127.0.0.1:<port>`. Port 0 picks a free port.
///
/// # Errors
///
/// Returns [`IpcError::Socket`] if the port cannot be bound.
pub async fn start_control_server(
    port: u16,
    service: ControlService,
) -> Result<ControlServerHandle, IpcError> {
    let address = format!("{CONTROL_SERVER_HOSTNAME}:{port}");
    let listener = TcpListener::bind(&address).await?;
    let local_addr = listener.local_addr()?;

    info!("Control server listening on {}", local_addr);

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let accept_service = service.clone();

    let accept_task = TokioSpawn(async move {
        let mut consecutive_errors: u32 = 0;
        loop {
            tokio::select! {
                _ = stop_rx.changed() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        consecutive_errors = 0;
                        info!("Client connecting from {}", addr);
                        let session_service = accept_service.clone();
                        let session_stop = stop_rx.clone();
                        TokioSpawn(async move {
                            if let Err(e) = handle_connection(stream, addr, session_service, session_stop).await {
                                error!("Connection {} ended with error: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        consecutive_errors = consecutive_errors.saturating_add(1);
                        let delay = accept_retry_delay(consecutive_errors);
                        error!("Failed to accept connection: {}, retrying in {:?}", e, delay);
                        tokio::select! {
                            _ = stop_rx.changed() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                },
            }
        }
        info!("Control server accept loop exited");
    });

    Ok(ControlServerHandle::new(
        local_addr,
        service,
        stop_tx,
        accept_task,
    ))
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    service: ControlService,
    mut stop_rx: watch::Receiver<bool>,
) -> Result<(), IpcError> {
    if !addr.ip().is_loopback() {
        warn!("Rejected non-loopback connection from {}", addr);
        return Ok(());
    }

    let ws_stream = accept_async(stream).await.map_err(|e| IpcError::Upgrade {
        message: format!("WebSocket handshake failed: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let (mut write, mut read) = ws_stream.split();
    let mut session = service.open_session();

    loop {
        if *stop_rx.borrow() {
            break;
        }

        let msg = tokio::select! {
            _ = stop_rx.changed() => break,
            msg = read.next() => msg,
        };

        match msg {
            Some(Ok(Message::Binary(data))) => {
                let request = match ControlRequest::decode(&data[..]) {
                    Ok(request) => request,
                    Err(e) => {
                        error!("Failed to decode protobuf from {}: {}", addr, e);
                        send_error_response(
                            &mut write,
                            0,
                            ErrorCode::InvalidMessage,
                            "Invalid protobuf message",
                        )
                        .await?;
                        continue;
                    }
                };

                let response = session.handle_request(request);
                send_response(&mut write, &response).await?;
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => warn!("Client {} sent non-binary message, ignoring", addr),
            Some(Err(e)) => {
                return Err(IpcError::FrameRead {
                    message: format!("Error reading message: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }

    let _ = write.close().await;
    info!("Client {} disconnected", addr);
    Ok(())
}

async fn send_response(write: &mut WsWriter, response: &ControlResponse) -> Result<(), IpcError> {
    let mut buf = Vec::with_capacity(response.encoded_len());
    response.encode(&mut buf)?;

    write
        .send(Message::Binary(buf.into()))
        .await
        .map_err(|e| IpcError::FrameWrite {
            message: format!("Failed to send response: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}

async fn send_error_response(
    write: &mut WsWriter,
    request_id: u64,
    code: ErrorCode,
    message: &str,
) -> Result<(), IpcError> {
    let response = ControlResponse {
        request_id,
        payload: Some(control_response::Payload::Error(ErrorResponse {
            code: code as i32,
            message: message.to_string(),
        })),
    };
    send_response(write, &response).await
}
