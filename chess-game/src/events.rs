use crate::status::GameStatus;
use chess_core::{Color, Move};

/// The domain-level outcome of a [`crate::Game`] operation (spec §4.10).
///
/// These are the facts a game produces; turning them into framed wire
/// messages and deciding their recipients is the Session Hub's job, not the
/// aggregate's.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum GameEvent {
    MoveExecuted {
        mov: Move,
        fen: String,
        status: GameStatus,
        side_to_move: Color,
        is_check: bool,
    },
    DrawOffered {
        by: Color,
    },
    DrawAccepted {
        status: GameStatus,
    },
    DrawRejected,
    GameResigned {
        by: Color,
        status: GameStatus,
    },
}
