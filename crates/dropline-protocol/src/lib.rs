//! Wire protocol for Dropline.
//!
//! This crate defines the "language" the client and the match server
//! speak:
//!
//! - **Types** ([`ClientCommand`], [`ServerEvent`], [`GameState`],
//!   [`Board`], etc.): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding
//!   or decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw frames) and the
//! session state machine. It knows nothing about connections or screens.
//!
//! ```text
//! Transport (bytes) → Protocol (ServerEvent) → Session (state machine)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, decode_event, encode_command};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Assignment, Board, CellValue, ClientCommand, Departure, GameMode, GameState,
    PlayerNum, Rejection, RoomId, ServerEvent, Winner,
};
