//! Turn evaluation: whose move it is, and what to tell the player.
//!
//! Both functions are pure. They look only at the authoritative
//! [`GameState`] and the local seat, so they can be tested without a
//! connection or a state machine.

use dropline_protocol::{GameState, PlayerNum, Winner};

use crate::text;

/// Returns `true` when the local player may move right now.
///
/// `false` while there is no game yet, once the game is over, or while
/// the opponent has the turn.
pub fn is_my_turn(state: Option<&GameState>, player: PlayerNum) -> bool {
    state.is_some_and(|s| !s.game_over && s.current_turn == player)
}

/// Derives the status line for a game state.
///
/// | state | text |
/// |---|---|
/// | none yet | welcome |
/// | over, draw | draw |
/// | over, we won | win |
/// | over, otherwise | loss |
/// | running, our turn | your turn |
/// | running, their turn | waiting |
///
/// A game that is over without a winner (the opponent left, the
/// connection dropped) falls into the loss row; the state machine
/// never asks for a status in those cases and sets its own notice.
pub fn status_for(state: Option<&GameState>, player: PlayerNum, my_turn: bool) -> &'static str {
    let Some(state) = state else {
        return text::WELCOME;
    };

    if state.game_over {
        return match state.winner {
            Some(Winner::Draw) => text::DRAW,
            Some(Winner::Player(seat)) if seat == player => text::WIN,
            _ => text::LOSS,
        };
    }

    if my_turn { text::YOUR_TURN } else { text::WAITING_FOR_MOVE }
}
