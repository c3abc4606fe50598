pub mod config;
pub mod connection;
pub mod dispatch;
pub mod file_channel;
pub mod ipc;
pub mod protocol;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),

    #[error(transparent)]
    Connection(#[from] connection::ConnectionError),

    #[error(transparent)]
    FileChannel(#[from] file_channel::FileChannelError),

    #[error(transparent)]
    Ipc(#[from] ipc::IpcError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Dispatch(#[from] dispatch::DispatchError),
}
