//! Session types: screens, phases, identity, intents, and the snapshot
//! handed to the view layer.

use dropline_protocol::{GameMode, GameState, PlayerNum, RoomId};

// ---------------------------------------------------------------------------
// Screen
// ---------------------------------------------------------------------------

/// Which view is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Main menu: play the AI or go to the multiplayer menu.
    #[default]
    Menu,
    /// Create a room or join one by ID.
    MultiplayerMenu,
    /// The board, from the moment a connection is requested.
    Game,
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where the session is in its lifecycle.
///
/// ```text
/// Menu ──(StartAi)────────────────┐
///   │                             ▼
///   └─(GoToMultiplayerMenu)→ MultiplayerMenu ──(CreateRoom/JoinRoom)→ AwaitingAssignment
///                                                                          │
///                                               (room_created/room_joined) ▼
///                                                                       InGame
/// ```
///
/// A finished game is still `InGame`, with `game_over` set on the state.
/// `LeaveGame` returns to `Menu` from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Menu,
    MultiplayerMenu,
    /// Connection requested; the server hasn't assigned room and seat yet.
    AwaitingAssignment,
    /// Room and seat are known.
    InGame,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Identity for one connection's lifetime: which room, which seat, which
/// mode. Assigned by the server and never changed until the session is
/// torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub room_id: RoomId,
    pub player_num: PlayerNum,
    pub mode: GameMode,
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// Something the user asked for, forwarded by the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// "Play with AI" (from the menu).
    StartAi,
    /// "Play with a friend" (from the menu).
    GoToMultiplayerMenu,
    /// "Create a room" (from the multiplayer menu).
    CreateRoom,
    /// "Join room" with whatever the user typed (from the multiplayer
    /// menu). Surrounding whitespace is ignored.
    JoinRoom(String),
    /// A click on a board column.
    MakeMove(usize),
    /// "Leave game & go to menu". Valid from any screen.
    LeaveGame,
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// A read-only copy of everything the view needs to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub screen: Screen,
    pub phase: SessionPhase,
    pub status: String,
    pub mode: Option<GameMode>,
    pub session: Option<Session>,
    pub game: Option<GameState>,
    /// Whether the board should accept clicks (`is_my_turn`).
    pub board_enabled: bool,
}

impl SessionSnapshot {
    /// The room ID to offer for copying: only for multiplayer rooms,
    /// where a friend needs it to join.
    pub fn shareable_room_id(&self) -> Option<&RoomId> {
        self.session
            .as_ref()
            .filter(|s| s.mode == GameMode::Multiplayer)
            .map(|s| &s.room_id)
    }

    /// The local seat, once assigned.
    pub fn player_num(&self) -> Option<PlayerNum> {
        self.session.as_ref().map(|s| s.player_num)
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            screen: Screen::Menu,
            phase: SessionPhase::Menu,
            status: crate::text::WELCOME.to_string(),
            mode: None,
            session: None,
            game: None,
            board_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(mode: GameMode) -> SessionSnapshot {
        SessionSnapshot {
            screen: Screen::Game,
            phase: SessionPhase::InGame,
            mode: Some(mode),
            session: Some(Session {
                room_id: RoomId::new("r1"),
                player_num: PlayerNum::One,
                mode,
            }),
            ..SessionSnapshot::default()
        }
    }

    #[test]
    fn test_default_snapshot_is_menu() {
        let snap = SessionSnapshot::default();
        assert_eq!(snap.screen, Screen::Menu);
        assert_eq!(snap.status, crate::text::WELCOME);
        assert_eq!(snap.player_num(), None);
    }

    #[test]
    fn test_room_id_is_shareable_only_in_multiplayer() {
        let multi = snapshot_with(GameMode::Multiplayer);
        assert_eq!(multi.shareable_room_id(), Some(&RoomId::new("r1")));

        let ai = snapshot_with(GameMode::Ai);
        assert_eq!(ai.shareable_room_id(), None);
        assert_eq!(ai.player_num(), Some(PlayerNum::One));
    }
}
