//! # Dropline
//!
//! Client for server-authoritative Connect Four matches.
//!
//! The match server owns every game: it validates moves, detects wins,
//! and pushes the full board after each turn. Dropline is the other
//! side of that conversation. It opens one WebSocket per session,
//! sends create/join/move commands, and turns whatever the server says
//! into a [`SessionSnapshot`](dropline_session::SessionSnapshot) for a
//! view to render.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dropline::prelude::*;
//! use tokio::sync::{mpsc, watch};
//!
//! # async fn demo() -> Result<(), DroplineError> {
//! let client = Client::builder()
//!     .server_url("ws://localhost:8000/ws")
//!     .build()?;
//!
//! let (intents, intents_rx) = mpsc::channel(16);
//! let (view_tx, mut view) = watch::channel(SessionSnapshot::default());
//! tokio::spawn(client.run(intents_rx, view_tx));
//!
//! intents.send(Intent::StartAi).await.ok();
//! view.changed().await.ok();
//! println!("{}", view.borrow().status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | crate | role |
//! |---|---|
//! | `dropline-protocol` | wire types and JSON codec |
//! | `dropline-transport` | connector traits, WebSocket client |
//! | `dropline-session` | connection manager, turn rules, state machine |

mod client;
mod error;

pub use client::{Client, ClientBuilder};
pub use error::DroplineError;

/// Re-exports the types most clients need.
pub mod prelude {
    pub use crate::{Client, ClientBuilder, DroplineError};
    pub use dropline_protocol::{
        Board, CellValue, GameMode, GameState, PlayerNum, RoomId, Winner,
    };
    pub use dropline_session::{
        ClientConfig, Intent, Screen, Session, SessionPhase, SessionSnapshot, text,
    };
}
