//! Error types for the protocol layer.
//!
//! Each crate in Dropline defines its own error enum. A `ProtocolError`
//! always means the problem is in turning commands into bytes or bytes
//! into events, never in networking or session bookkeeping.

/// Errors that can occur in the protocol layer.
///
/// `#[derive(thiserror::Error)]` generates the `std::error::Error`
/// implementation; each `#[error("...")]` attribute is the text that
/// shows up when the error is printed or logged.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a command into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The payload is not parseable structured data, lacks a recognized
    /// `type` discriminator, or fails shape validation (bad board, bad
    /// seat number, and so on).
    ///
    /// Receivers treat this as non-fatal: log it and drop the message.
    #[cfg(feature = "json")]
    #[error("malformed message: {0}")]
    Malformed(serde_json::Error),

    /// The message parsed but breaks a protocol rule.
    ///
    /// Also used as the error type of the `TryFrom` conversions that
    /// validate wire values, so serde can surface a readable reason.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

