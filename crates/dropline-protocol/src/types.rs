//! Core protocol types for Dropline's wire format.
//!
//! Everything in this module either travels "on the wire" (commands we
//! send, events the match server pushes) or is part of the authoritative
//! game state carried inside those events.
//!
//! The server is the source of truth. These types exist so that bad data
//! is rejected at the decode boundary instead of leaking into the view.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// An opaque room identifier assigned by the match server.
///
/// This is a "newtype wrapper" around `String`: you can't accidentally
/// pass a player name where a room ID is expected, and function
/// signatures read better.
///
/// `#[serde(transparent)]` makes `RoomId("a1b2c3d4")` serialize as just
/// `"a1b2c3d4"`, not `{ "0": "a1b2c3d4" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps a room identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A seat at the board: which of the two players a client represents.
///
/// On the wire a seat is a plain number (`1` or `2`). The
/// `try_from`/`into` attributes route serde through the `u8` conversions
/// below, so any other number fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayerNum {
    /// The first seat (`1`). Always the room creator.
    One,
    /// The second seat (`2`). The joiner, or the AI.
    Two,
}

impl PlayerNum {
    /// Returns the seat number as sent on the wire.
    pub fn get(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Returns the other seat.
    pub fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl TryFrom<u8> for PlayerNum {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(ProtocolError::InvalidMessage(format!(
                "player number must be 1 or 2, got {other}"
            ))),
        }
    }
}

impl From<PlayerNum> for u8 {
    fn from(seat: PlayerNum) -> Self {
        seat.get()
    }
}

impl fmt::Display for PlayerNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.get())
    }
}

/// The outcome of a finished game.
///
/// The wire encodes this as a number: `0` is a draw, `1`/`2` the
/// winning seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Winner {
    /// Nobody won: the board filled up.
    Draw,
    /// The given seat connected four.
    Player(PlayerNum),
}

impl TryFrom<u8> for Winner {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Draw),
            other => PlayerNum::try_from(other).map(Self::Player).map_err(|_| {
                ProtocolError::InvalidMessage(format!(
                    "winner must be 0, 1 or 2, got {other}"
                ))
            }),
        }
    }
}

impl From<Winner> for u8 {
    fn from(winner: Winner) -> Self {
        match winner {
            Winner::Draw => 0,
            Winner::Player(seat) => seat.get(),
        }
    }
}

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// Who the local player is up against.
///
/// `#[serde(rename_all = "lowercase")]` produces `"ai"` and
/// `"multiplayer"`, which is what the match server expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Play against the server's AI.
    Ai,
    /// Play against another human who joins by room ID.
    Multiplayer,
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// The content of a single board cell. Wire values: `0`, `1`, `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CellValue {
    #[default]
    Empty,
    PlayerOne,
    PlayerTwo,
}

impl CellValue {
    /// Returns the seat owning this cell, if any.
    pub fn owner(self) -> Option<PlayerNum> {
        match self {
            Self::Empty => None,
            Self::PlayerOne => Some(PlayerNum::One),
            Self::PlayerTwo => Some(PlayerNum::Two),
        }
    }
}

impl TryFrom<u8> for CellValue {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Empty),
            1 => Ok(Self::PlayerOne),
            2 => Ok(Self::PlayerTwo),
            other => Err(ProtocolError::InvalidMessage(format!(
                "cell value must be 0, 1 or 2, got {other}"
            ))),
        }
    }
}

impl From<CellValue> for u8 {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Empty => 0,
            CellValue::PlayerOne => 1,
            CellValue::PlayerTwo => 2,
        }
    }
}

/// A rectangular grid of cells, stored row-major.
///
/// The shape is whatever the server sends (6×7 in practice); nothing
/// here hard-codes it. On the wire the board is a list of rows:
///
/// ```text
/// [[0,0,0,0,0,0,0],
///  ...
///  [0,0,0,1,2,0,0]]
/// ```
///
/// Decoding goes through [`Board::from_rows`], which rejects empty
/// boards and ragged rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<CellValue>>", into = "Vec<Vec<CellValue>>")]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<CellValue>,
}

impl Board {
    /// Creates an all-empty board of the given shape.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if either dimension is 0.
    pub fn empty(rows: usize, cols: usize) -> Result<Self, ProtocolError> {
        if rows == 0 || cols == 0 {
            return Err(ProtocolError::InvalidMessage(format!(
                "board must have at least one cell, got {rows}x{cols}"
            )));
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![CellValue::Empty; rows * cols],
        })
    }

    /// Builds a board from a list of rows.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if there are no rows,
    /// the first row is empty, or the rows differ in length.
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Result<Self, ProtocolError> {
        let cols = rows.first().map_or(0, Vec::len);
        if cols == 0 {
            return Err(ProtocolError::InvalidMessage(
                "board must have at least one cell".into(),
            ));
        }
        if let Some((index, row)) =
            rows.iter().enumerate().find(|(_, row)| row.len() != cols)
        {
            return Err(ProtocolError::InvalidMessage(format!(
                "board row {index} has {} cells, expected {cols}",
                row.len()
            )));
        }

        let height = rows.len();
        Ok(Self {
            rows: height,
            cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the cell at `(row, col)`, or `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<CellValue> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col).copied()
    }

    /// Iterates the board top row first.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.cells.chunks(self.cols)
    }

    /// Places `cell` at `(row, col)`. Returns `false` when out of range.
    pub fn set(&mut self, row: usize, col: usize, cell: CellValue) -> bool {
        if row >= self.rows || col >= self.cols {
            return false;
        }
        self.cells[row * self.cols + col] = cell;
        true
    }
}

impl TryFrom<Vec<Vec<CellValue>>> for Board {
    type Error = ProtocolError;

    fn try_from(rows: Vec<Vec<CellValue>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Board> for Vec<Vec<CellValue>> {
    fn from(board: Board) -> Self {
        board.iter_rows().map(<[CellValue]>::to_vec).collect()
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The authoritative state of a match, as pushed by the server.
///
/// Replaced wholesale whenever an `update_board` or `game_over` event
/// arrives. Every decoded state satisfies `winner.is_some() == game_over`.
/// The only states that break it are built locally by
/// [`GameState::abandoned`]: a game that ended because the opponent or
/// the connection went away, without a decided outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireGameState", into = "WireGameState")]
pub struct GameState {
    pub board: Board,
    pub current_turn: PlayerNum,
    pub game_over: bool,
    pub winner: Option<Winner>,
}

impl GameState {
    /// A game in progress.
    pub fn in_progress(board: Board, current_turn: PlayerNum) -> Self {
        Self {
            board,
            current_turn,
            game_over: false,
            winner: None,
        }
    }

    /// A finished game with a decided outcome.
    pub fn finished(board: Board, current_turn: PlayerNum, winner: Winner) -> Self {
        Self {
            board,
            current_turn,
            game_over: true,
            winner: Some(winner),
        }
    }

    /// Ends the game without an outcome, keeping the board and turn.
    pub fn abandoned(self) -> Self {
        Self {
            game_over: true,
            winner: None,
            ..self
        }
    }
}

/// What the server actually sends for a game state.
///
/// The server always includes `winner`, using `0` while the game is
/// still running. Decoding maps that to `None`.
#[derive(Serialize, Deserialize)]
struct WireGameState {
    board: Board,
    current_turn: PlayerNum,
    game_over: bool,
    #[serde(default)]
    winner: Option<Winner>,
}

impl TryFrom<WireGameState> for GameState {
    type Error = ProtocolError;

    fn try_from(wire: WireGameState) -> Result<Self, Self::Error> {
        if !wire.game_over {
            return Ok(Self::in_progress(wire.board, wire.current_turn));
        }
        let winner = wire.winner.ok_or_else(|| {
            ProtocolError::InvalidMessage("finished game without a winner".into())
        })?;
        Ok(Self::finished(wire.board, wire.current_turn, winner))
    }
}

impl From<GameState> for WireGameState {
    fn from(state: GameState) -> Self {
        Self {
            board: state.board,
            current_turn: state.current_turn,
            game_over: state.game_over,
            winner: state.winner,
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound commands
// ---------------------------------------------------------------------------

/// Client → Server commands.
///
/// `#[serde(tag = "type", content = "data")]` produces "adjacently
/// tagged" JSON:
///
/// ```text
/// { "type": "make_move", "data": { "room_id": "a1b2", "column": 3, "player_num": 1 } }
/// ```
///
/// `rename_all = "snake_case"` turns `CreateRoom` into `"create_room"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    /// "Open a new room for me." The server answers with `room_created`.
    CreateRoom { mode: GameMode },

    /// "Seat me in this existing room." Answered by `room_joined` or an
    /// `error` such as `Room not found`.
    JoinRoom { room_id: RoomId },

    /// "Drop my disc into this column."
    MakeMove {
        room_id: RoomId,
        column: usize,
        player_num: PlayerNum,
    },
}

impl ClientCommand {
    /// The wire discriminator, handy for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::MakeMove { .. } => "make_move",
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

/// Identity handed out by the server after a create or join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub room_id: RoomId,
    pub player_num: PlayerNum,
}

/// Payload of `player_left`. The server may attach a message; the
/// client shows its own notice instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Payload of `error`: a request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub message: String,
}

/// Server → Client events. Same adjacently tagged shape as
/// [`ClientCommand`].
///
/// An unknown `type` fails to decode, which the receiver reports as a
/// malformed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Identity assigned after `create_room`.
    RoomCreated(Assignment),
    /// Identity assigned after `join_room`.
    RoomJoined(Assignment),
    /// Mid-game state refresh.
    UpdateBoard(GameState),
    /// Terminal state: `game_over` is true and `winner` is set.
    GameOver(GameState),
    /// The opponent disconnected.
    PlayerLeft(Departure),
    /// A request was rejected.
    Error(Rejection),
}

impl ServerEvent {
    /// The wire discriminator, handy for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoomCreated(_) => "room_created",
            Self::RoomJoined(_) => "room_joined",
            Self::UpdateBoard(_) => "update_board",
            Self::GameOver(_) => "game_over",
            Self::PlayerLeft(_) => "player_left",
            Self::Error(_) => "error",
        }
    }

    /// Checks rules that span the whole event rather than one field.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] for a `game_over` event
    /// whose state is not finished.
    pub fn validate(self) -> Result<Self, ProtocolError> {
        if let Self::GameOver(state) = &self {
            if !state.game_over {
                return Err(ProtocolError::InvalidMessage(
                    "game_over event carries an unfinished game".into(),
                ));
            }
        }
        Ok(self)
    }
}

// =========================================================================
// Tests
// =========================================================================
