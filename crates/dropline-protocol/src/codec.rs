//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The rest of the client doesn't care HOW messages are serialized, it
//! just needs something that implements [`Codec`]. The match server
//! speaks JSON, so [`JsonCodec`] is the one actually used.
//!
//! [`encode_command`] and [`decode_event`] are the two entry points the
//! connection layer calls: they pin the codec to the outbound and
//! inbound vocabularies and run the event-level validation.

use serde::{Serialize, de::DeserializeOwned};

use crate::{ClientCommand, ProtocolError, ServerEvent};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share with the background connection task
///   (Tokio may run it on any worker thread).
/// - `'static` → the codec owns everything it needs, so it can live
///   inside a long-lived task.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the decoded value
/// doesn't borrow from the input buffer, so the frame can be dropped
/// right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Malformed` if the bytes are not valid
    /// structured data or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use dropline_protocol::{ClientCommand, Codec, GameMode, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec
///     .encode(&ClientCommand::CreateRoom { mode: GameMode::Ai })
///     .unwrap();
/// assert_eq!(bytes, br#"{"type":"create_room","data":{"mode":"ai"}}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        // Shape validation (board, seats, winner) runs inside serde via
        // the `try_from` conversions, so those failures land here too.
        serde_json::from_slice(data).map_err(ProtocolError::Malformed)
    }
}

// ---------------------------------------------------------------------------
// Vocabulary helpers
// ---------------------------------------------------------------------------

/// Encodes an outbound command into wire bytes.
///
/// # Errors
/// Propagates the codec's encode error.
pub fn encode_command<C: Codec>(codec: &C, command: &ClientCommand) -> Result<Vec<u8>, ProtocolError> {
    codec.encode(command)
}

/// Decodes wire bytes into an inbound event and validates it.
///
/// # Errors
/// Returns a malformed-message error when the payload is not parseable,
/// has no recognized `type`, or violates the event's shape rules.
pub fn decode_event<C: Codec>(codec: &C, data: &[u8]) -> Result<ServerEvent, ProtocolError> {
    codec.decode::<ServerEvent>(data)?.validate()
}
