//! Client session layer for Dropline.
//!
//! This crate is the client's brain:
//!
//! 1. **Connection management**: one live connection at a time, with
//!    the initial command deferred until open ([`ConnectionManager`])
//! 2. **Turn evaluation**: whose move it is and what to tell the player
//!    ([`is_my_turn`], [`status_for`])
//! 3. **Session orchestration**: screens, identity, game state and
//!    status text, driven by user intents and server events
//!    ([`SessionStateMachine`])
//!
//! # How it fits in the stack
//!
//! ```text
//! View / runtime (above)  ← sends Intents, renders SessionSnapshots
//!     ↕
//! Session Layer (this crate)  ← owns all client state
//!     ↕
//! Protocol + Transport (below)  ← wire types, codec, WebSocket
//! ```
//!
//! The state machine never blocks. Connection tasks report back through
//! an mpsc channel, and whoever owns the machine feeds those events in
//! one at a time.

mod config;
mod error;
mod machine;
mod manager;
mod state;
pub mod text;
mod turn;

pub use config::ClientConfig;
pub use error::SessionError;
pub use machine::SessionStateMachine;
pub use manager::{ConnectionEvent, ConnectionEventKind, ConnectionManager, Readiness};
pub use state::{Intent, Screen, Session, SessionPhase, SessionSnapshot};
pub use turn::{is_my_turn, status_for};
