//! User-facing status texts.

/// Shown on the menu and after leaving a game.
pub const WELCOME: &str = "Welcome to Connect Four!";
/// Join was requested with a blank room ID.
pub const ENTER_ROOM_ID: &str = "Please enter a Room ID.";
/// A multiplayer room was created and nobody has joined yet.
pub const WAITING_FOR_OPPONENT: &str = "Room created. Share the ID! Waiting for opponent...";
/// The server seated us in an existing room.
pub const JOINED: &str = "Successfully joined the room!";
pub const YOUR_TURN: &str = "Your turn!";
pub const WAITING_FOR_MOVE: &str = "Waiting for opponent's move...";
pub const WIN: &str = "Congratulations, you win! 🎉";
pub const LOSS: &str = "You lost. Better luck next time!";
pub const DRAW: &str = "It's a draw!";
pub const OPPONENT_LEFT: &str = "The other player has disconnected. Game over.";
pub const CONNECTION_LOST: &str = "Connection lost. Please refresh.";
pub const CONNECTION_ERROR: &str = "Connection error. Could not connect to the server.";

/// Prefix for server-side rejections.
pub const ERROR_PREFIX: &str = "Error: ";

/// The rejection text that triggers the delayed return to the
/// multiplayer menu.
pub const ROOM_NOT_FOUND: &str = "Room not found";

/// Formats a server rejection for display.
pub fn server_error(message: &str) -> String {
    format!("{ERROR_PREFIX}{message}")
}
