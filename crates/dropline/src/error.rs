//! Unified error type for the Dropline client.

use dropline_protocol::ProtocolError;
use dropline_session::SessionError;
use dropline_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The running client never surfaces these to the view: failures during
/// a session become status text. This type covers what can go wrong
/// around it, such as building a client from a bad config.
#[derive(Debug, thiserror::Error)]
pub enum DroplineError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (config, connection state).
    #[error(transparent)]
    Session(#[from] SessionError),
}
