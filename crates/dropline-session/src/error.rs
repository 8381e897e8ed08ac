//! Error types for the session layer.

use dropline_protocol::ProtocolError;
use dropline_transport::ConnectionId;

/// Errors that can occur while managing the client session.
///
/// None of these reach the view layer: the state machine turns every
/// failure into status text. They exist so the connection manager and
/// config can report precisely what went wrong to their caller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// There is no live connection to send on.
    #[error("no active connection")]
    NotConnected,

    /// The connection exists but hasn't finished opening. Only the
    /// initial create/join command is deferred until open; anything
    /// else sent early is refused.
    #[error("connection {0} is not open yet")]
    NotReady(ConnectionId),

    /// Connections run as Tokio tasks, and there is no runtime to
    /// spawn them on.
    #[error("no Tokio runtime to run the connection on")]
    NoRuntime,

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A command could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
