use chess_core::{rules, Position};
use serde::{Deserialize, Serialize};

/// The lifecycle state of a [`crate::Game`] (spec §4.5).
///
/// `CHECK` is deliberately absent here: it is a transient condition of a
/// position, surfaced to clients as `MoveExecuted.is_check`, not a status
/// that halts play (spec §4.5, last line).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    InProgress,
    Checkmate,
    Stalemate,
    Draw,
    Resigned,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }

    /// Recomputes status from `position` alone, in the precedence order
    /// CHECKMATE > STALEMATE > DRAW (fifty-move) > DRAW (insufficient
    /// material) > IN_PROGRESS (spec §4.5).
    pub fn recompute(position: &Position) -> GameStatus {
        if rules::is_checkmate(position) {
            GameStatus::Checkmate
        } else if rules::is_stalemate(position) {
            GameStatus::Stalemate
        } else if rules::is_fifty_move_rule(position) {
            GameStatus::Draw
        } else if rules::is_insufficient_material(position) {
            GameStatus::Draw
        } else {
            GameStatus::InProgress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_position_is_in_progress() {
        assert_eq!(GameStatus::recompute(&Position::initial()), GameStatus::InProgress);
    }

    #[test]
    fn checkmate_outranks_every_other_status() {
        let pos = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert_eq!(GameStatus::recompute(&pos), GameStatus::Checkmate);
    }

    #[test]
    fn only_in_progress_and_resigned_and_checkmate_etc_are_terminal_correctly() {
        assert!(!GameStatus::InProgress.is_terminal());
        assert!(GameStatus::Checkmate.is_terminal());
        assert!(GameStatus::Stalemate.is_terminal());
        assert!(GameStatus::Draw.is_terminal());
        assert!(GameStatus::Resigned.is_terminal());
    }
}
