//! The session state machine: the orchestrator between the user, the
//! connection, and the view.
//!
//! It owns every piece of client state (screen, mode, session identity,
//! game state, status text) and is the only thing that mutates it.
//! Inputs arrive one at a time from a single loop:
//!
//! - user [`Intent`]s, via [`SessionStateMachine::handle_intent`]
//! - connection events, via [`SessionStateMachine::handle_connection_event`]
//! - the "room not found" recovery deadline, via
//!   [`SessionStateMachine::fire_recovery`]
//!
//! No handler blocks and no two run at once, so there is no locking.
//! Every failure ends up as status text; nothing is returned to the view
//! as an error.

use dropline_protocol::{
    Assignment, ClientCommand, Codec, GameMode, GameState, Rejection, RoomId, ServerEvent,
};
use dropline_transport::Connector;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::manager::{ConnectionEvent, ConnectionEventKind, ConnectionManager};
use crate::state::{Intent, Screen, Session, SessionPhase, SessionSnapshot};
use crate::{ClientConfig, text, turn};

/// Client-side session orchestrator.
///
/// See the module docs for the input model and [`SessionPhase`] for the
/// lifecycle.
pub struct SessionStateMachine<K: Connector, C: Codec> {
    config: ClientConfig,
    connections: ConnectionManager<K, C>,
    screen: Screen,
    mode: Option<GameMode>,
    session: Option<Session>,
    game: Option<GameState>,
    status: String,
    /// When the pending "room not found" recovery is due.
    recovery: Option<Instant>,
}

impl<K: Connector, C: Codec> SessionStateMachine<K, C> {
    /// Creates a machine on the menu screen.
    ///
    /// Connection events for every connection it opens are sent to
    /// `events`; feed them back through
    /// [`handle_connection_event`](Self::handle_connection_event).
    pub fn new(
        connector: K,
        codec: C,
        config: ClientConfig,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Self {
        Self {
            config,
            connections: ConnectionManager::new(connector, codec, events),
            screen: Screen::Menu,
            mode: None,
            session: None,
            game: None,
            status: text::WELCOME.to_string(),
            recovery: None,
        }
    }

    // -- Accessors --

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Derived lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        match (self.screen, &self.session) {
            (Screen::Menu, _) => SessionPhase::Menu,
            (Screen::MultiplayerMenu, _) => SessionPhase::MultiplayerMenu,
            (Screen::Game, None) => SessionPhase::AwaitingAssignment,
            (Screen::Game, Some(_)) => SessionPhase::InGame,
        }
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn game_state(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn connections(&self) -> &ConnectionManager<K, C> {
        &self.connections
    }

    /// Whether the local player may move now.
    pub fn is_my_turn(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| turn::is_my_turn(self.game.as_ref(), s.player_num))
    }

    /// When the pending recovery should fire, if one is scheduled.
    pub fn recovery_deadline(&self) -> Option<Instant> {
        self.recovery
    }

    /// Copies the view-relevant state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            screen: self.screen,
            phase: self.phase(),
            status: self.status.clone(),
            mode: self.mode,
            session: self.session.clone(),
            game: self.game.clone(),
            board_enabled: self.is_my_turn(),
        }
    }

    // -- User intents --

    /// Applies a user intent. Intents that make no sense on the current
    /// screen are ignored.
    pub fn handle_intent(&mut self, intent: Intent) {
        match intent {
            Intent::StartAi => self.create_room(Screen::Menu, GameMode::Ai),
            Intent::GoToMultiplayerMenu => {
                if self.screen == Screen::Menu {
                    self.screen = Screen::MultiplayerMenu;
                } else {
                    self.ignore("go_to_multiplayer_menu");
                }
            }
            Intent::CreateRoom => self.create_room(Screen::MultiplayerMenu, GameMode::Multiplayer),
            Intent::JoinRoom(room_id) => self.join_room(&room_id),
            Intent::MakeMove(column) => self.make_move(column),
            Intent::LeaveGame => self.leave(),
        }
    }

    fn ignore(&self, intent: &'static str) {
        tracing::debug!(intent, screen = ?self.screen, "intent ignored on this screen");
    }

    fn create_room(&mut self, from: Screen, mode: GameMode) {
        if self.screen != from {
            return self.ignore("create_room");
        }
        self.begin_session(ClientCommand::CreateRoom { mode }, mode);
    }

    fn join_room(&mut self, raw: &str) {
        if self.screen != Screen::MultiplayerMenu {
            return self.ignore("join_room");
        }
        let room_id = raw.trim();
        if room_id.is_empty() {
            self.status = text::ENTER_ROOM_ID.to_string();
            return;
        }
        let command = ClientCommand::JoinRoom {
            room_id: RoomId::new(room_id),
        };
        self.begin_session(command, GameMode::Multiplayer);
    }

    /// Opens the session's connection; `initial` goes out once it's open.
    fn begin_session(&mut self, initial: ClientCommand, mode: GameMode) {
        self.recovery = None;
        self.session = None;
        self.game = None;

        match self.connections.open(&self.config.server_url, &initial) {
            Ok(connection) => {
                tracing::info!(%connection, ?mode, "session started");
                self.mode = Some(mode);
                self.screen = Screen::Game;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not start session");
                self.status = text::CONNECTION_ERROR.to_string();
            }
        }
    }

    fn make_move(&mut self, column: usize) {
        if self.screen != Screen::Game {
            return self.ignore("make_move");
        }
        let Some(session) = &self.session else {
            tracing::debug!(column, "move ignored: no seat assigned yet");
            return;
        };
        if !self.is_my_turn() {
            tracing::debug!(column, "move ignored: not our turn");
            return;
        }

        let command = ClientCommand::MakeMove {
            room_id: session.room_id.clone(),
            column,
            player_num: session.player_num,
        };
        // The board only changes when the server says so.
        if let Err(e) = self.connections.send(&command) {
            tracing::warn!(column, error = %e, "move not sent");
        }
    }

    /// Tears the session down and returns to the menu. Safe to call at
    /// any time, including when there is no session.
    fn leave(&mut self) {
        let closed = self.connections.close();
        self.recovery = None;
        self.mode = None;
        self.session = None;
        self.game = None;
        self.status = text::WELCOME.to_string();
        self.screen = Screen::Menu;
        tracing::info!(closed, "returned to menu");
    }

    // -- Connection events --

    /// Applies a connection event. Events from connections other than
    /// the current one are dropped.
    pub fn handle_connection_event(&mut self, event: ConnectionEvent) {
        let Some(kind) = self.connections.accept(event) else {
            return;
        };

        match kind {
            ConnectionEventKind::Opened => {}
            ConnectionEventKind::Message(event) => self.handle_event(event),
            ConnectionEventKind::Malformed(e) => {
                tracing::warn!(error = %e, "malformed message ignored");
            }
            ConnectionEventKind::TransportError(e) => {
                tracing::warn!(error = %e, "transport error");
                self.status = text::CONNECTION_ERROR.to_string();
            }
            ConnectionEventKind::Closed => self.connection_closed(),
        }
    }

    fn connection_closed(&mut self) {
        if self.screen != Screen::Game {
            return;
        }
        tracing::info!("connection lost, session over");
        self.status = text::CONNECTION_LOST.to_string();
        self.game = self.game.take().map(GameState::abandoned);
    }

    /// Applies a decoded server event.
    ///
    /// Only meaningful on the game screen; anywhere else the event is
    /// ignored.
    pub fn handle_event(&mut self, event: ServerEvent) {
        if self.screen != Screen::Game {
            tracing::debug!(event = event.kind(), "event ignored outside the game screen");
            return;
        }

        match event {
            ServerEvent::RoomCreated(assignment) => {
                if !self.assign(assignment) {
                    return;
                }
                // A board that arrived before the seat decides the text.
                if self.game.is_some() {
                    self.refresh_status();
                } else if self.mode == Some(GameMode::Multiplayer) {
                    self.status = text::WAITING_FOR_OPPONENT.to_string();
                }
            }
            ServerEvent::RoomJoined(assignment) => {
                if !self.assign(assignment) {
                    return;
                }
                if self.game.is_some() {
                    self.refresh_status();
                } else {
                    self.status = text::JOINED.to_string();
                }
            }
            ServerEvent::UpdateBoard(state) | ServerEvent::GameOver(state) => {
                self.replace_state(state);
            }
            ServerEvent::PlayerLeft(_) => {
                tracing::info!("opponent left");
                self.game = self.game.take().map(GameState::abandoned);
                self.status = text::OPPONENT_LEFT.to_string();
            }
            ServerEvent::Error(Rejection { message }) => {
                tracing::info!(%message, "request rejected by server");
                self.status = text::server_error(&message);
                if message == text::ROOM_NOT_FOUND {
                    self.recovery = Some(Instant::now() + self.config.recovery_delay);
                }
            }
        }
    }

    /// Records the server-assigned identity. Returns `false` if the
    /// session already has one: identity never changes mid-session.
    fn assign(&mut self, assignment: Assignment) -> bool {
        if let Some(existing) = &self.session {
            tracing::warn!(
                room_id = %existing.room_id,
                offered = %assignment.room_id,
                "ignoring second room assignment"
            );
            return false;
        }
        let mode = self.mode.unwrap_or(GameMode::Multiplayer);
        tracing::info!(room_id = %assignment.room_id, player = %assignment.player_num, "seat assigned");
        self.session = Some(Session {
            room_id: assignment.room_id,
            player_num: assignment.player_num,
            mode,
        });
        true
    }

    fn replace_state(&mut self, state: GameState) {
        if let Some(previous) = &self.game {
            if previous.board.dimensions() != state.board.dimensions() {
                tracing::warn!(
                    expected = ?previous.board.dimensions(),
                    got = ?state.board.dimensions(),
                    "ignoring board with a different shape"
                );
                return;
            }
        }
        self.game = Some(state);
        self.refresh_status();
    }

    fn refresh_status(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let status = turn::status_for(self.game.as_ref(), session.player_num, self.is_my_turn());
        self.status = status.to_string();
    }

    // -- Recovery --

    /// Runs the pending "room not found" recovery: closes the connection,
    /// drops the half-started session, and shows the multiplayer menu.
    /// The error text stays visible.
    ///
    /// Returns `false` if nothing was pending.
    pub fn fire_recovery(&mut self) -> bool {
        if self.recovery.take().is_none() {
            return false;
        }
        if self.screen != Screen::Game {
            return false;
        }
        self.connections.close();
        self.mode = None;
        self.session = None;
        self.game = None;
        self.screen = Screen::MultiplayerMenu;
        tracing::info!("back to multiplayer menu after failed join");
        true
    }
}
