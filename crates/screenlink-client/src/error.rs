use screenlink_core::ProtocolError;
use thiserror::Error;

/// Everything that can end a connection. Either way the state machine
/// reacts the same: drop the socket, report `Disconnected`, reconnect.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
