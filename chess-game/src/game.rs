use crate::events::GameEvent;
use crate::player::Player;
use crate::status::GameStatus;
use chess_core::{rules, Color, Move, Position};
use common::{Error, GameId, PlayerId, UserId};

/// A single game of chess: two players, a position, its history, and the
/// state machine described in spec §4.5.
///
/// Invariants upheld by construction and by every mutator: `white.side ==
/// Color::White` and `black.side == Color::Black`; `white.user_id !=
/// black.user_id`; `status` is terminal iff no further move can be
/// appended; at most one draw offer is pending at a time.
///
/// Not `Serialize`: `Position` has no wire format of its own (it round-trips
/// through FEN instead). HTTP/wire layers build their own DTOs out of a
/// `Game`'s fields rather than serializing it directly.
#[derive(Debug, Clone)]
pub struct Game {
    pub id: GameId,
    pub white: Player,
    pub black: Player,
    pub position: Position,
    pub status: GameStatus,
    pub history: Vec<Move>,
    pub draw_offered_by: Option<Color>,
}

impl Game {
    /// Creates a fresh game with a new id, fresh player records, and the
    /// starting position.
    pub fn new(white_user: UserId, black_user: UserId) -> Self {
        Game {
            id: GameId::new(),
            white: Player::new(white_user, Color::White),
            black: Player::new(black_user, Color::Black),
            position: Position::initial(),
            status: GameStatus::InProgress,
            history: Vec::new(),
            draw_offered_by: None,
        }
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        [&self.white, &self.black].into_iter().find(|p| p.id == player_id)
    }

    fn opponent_of(&self, side: Color) -> &Player {
        match side {
            Color::White => &self.black,
            Color::Black => &self.white,
        }
    }

    fn require_participant(&self, player_id: PlayerId) -> Result<&Player, Error> {
        self.player(player_id).ok_or(Error::NotAParticipant)
    }

    fn require_active(&self) -> Result<(), Error> {
        if self.status.is_terminal() {
            Err(Error::GameTerminal)
        } else {
            Ok(())
        }
    }

    /// `true` iff `player_id` identifies a participant whose side is
    /// currently to move.
    pub fn is_player_turn(&self, player_id: PlayerId) -> bool {
        self.player(player_id)
            .is_some_and(|p| p.side == self.position.side_to_move())
    }

    pub fn make_move(&mut self, player_id: PlayerId, mov: Move) -> Result<GameEvent, Error> {
        self.require_active()?;
        let player = self.require_participant(player_id)?;

        if player.side != self.position.side_to_move() {
            return Err(Error::NotYourTurn);
        }

        if !rules::is_move_legal(&self.position, mov) {
            return Err(Error::InvalidEncoding(format!("{mov} is not a legal move")));
        }

        self.position = self.position.make_move(mov);
        self.history.push(mov);
        self.draw_offered_by = None;
        self.status = GameStatus::recompute(&self.position);

        Ok(GameEvent::MoveExecuted {
            mov,
            fen: self.position.to_fen(),
            status: self.status,
            side_to_move: self.position.side_to_move(),
            is_check: rules::is_in_check(&self.position, self.position.side_to_move()),
        })
    }

    /// Offering again while an offer from the same side is still pending is
    /// treated as idempotent (the spec's error taxonomy has no dedicated
    /// code for it); offering while the opponent's offer is pending is
    /// rejected with the same error accept/reject use for a missing offer,
    /// since this actor cannot offer and has nothing of their own to act on.
    pub fn offer_draw(&mut self, player_id: PlayerId) -> Result<GameEvent, Error> {
        self.require_active()?;
        let side = self.require_participant(player_id)?.side;

        match self.draw_offered_by {
            Some(s) if s == side => {}
            Some(_) => return Err(Error::NoDrawOffer),
            None => self.draw_offered_by = Some(side),
        }

        Ok(GameEvent::DrawOffered { by: side })
    }

    pub fn accept_draw(&mut self, player_id: PlayerId) -> Result<GameEvent, Error> {
        let offeror = self.draw_offered_by.ok_or(Error::NoDrawOffer)?;
        let player = self.require_participant(player_id)?;

        if player.side == offeror {
            return Err(Error::OwnDrawOffer);
        }

        self.status = GameStatus::Draw;
        self.draw_offered_by = None;
        Ok(GameEvent::DrawAccepted { status: self.status })
    }

    pub fn reject_draw(&mut self, player_id: PlayerId) -> Result<GameEvent, Error> {
        let offeror = self.draw_offered_by.ok_or(Error::NoDrawOffer)?;
        let player = self.require_participant(player_id)?;

        if player.side == offeror {
            return Err(Error::OwnDrawOffer);
        }

        self.draw_offered_by = None;
        Ok(GameEvent::DrawRejected)
    }

    pub fn resign(&mut self, player_id: PlayerId) -> Result<GameEvent, Error> {
        self.require_active()?;
        let player = self.require_participant(player_id)?;
        let side = player.side;

        self.status = GameStatus::Resigned;
        self.draw_offered_by = None;
        Ok(GameEvent::GameResigned { by: side, status: self.status })
    }

    /// The opponent's [`Player`] record relative to `player_id`, used by
    /// the Session Hub to route notifications like `PlayerDisconnected`.
    pub fn opponent(&self, player_id: PlayerId) -> Option<&Player> {
        let player = self.player(player_id)?;
        Some(self.opponent_of(player.side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_game() -> Game {
        Game::new(UserId::new(), UserId::new())
    }

    #[test]
    fn white_moves_first() {
        let mut game = fresh_game();
        let white = game.white.id;
        assert!(game.is_player_turn(white));
        assert!(game.make_move(white, "e2e4".parse().unwrap()).is_ok());
    }

    #[test]
    fn black_cannot_move_out_of_turn() {
        let mut game = fresh_game();
        let black = game.black.id;
        assert_eq!(game.make_move(black, "e7e5".parse().unwrap()), Err(Error::NotYourTurn));
    }

    #[test]
    fn non_participant_is_rejected() {
        let mut game = fresh_game();
        let stranger = PlayerId::new();
        assert_eq!(game.make_move(stranger, "e2e4".parse().unwrap()), Err(Error::NotAParticipant));
    }

    #[test]
    fn scholars_mate_ends_the_game_in_checkmate() {
        let mut game = fresh_game();
        let (white, black) = (game.white.id, game.black.id);

        game.make_move(white, "e2e4".parse().unwrap()).unwrap();
        game.make_move(black, "e7e5".parse().unwrap()).unwrap();
        game.make_move(white, "f1c4".parse().unwrap()).unwrap();
        game.make_move(black, "b8c6".parse().unwrap()).unwrap();
        game.make_move(white, "d1h5".parse().unwrap()).unwrap();
        game.make_move(black, "g8f6".parse().unwrap()).unwrap();
        let event = game.make_move(white, "h5f7".parse().unwrap()).unwrap();

        assert_eq!(game.status, GameStatus::Checkmate);
        assert!(matches!(event, GameEvent::MoveExecuted { status: GameStatus::Checkmate, .. }));
    }

    #[test]
    fn draw_offer_accept_flow() {
        let mut game = fresh_game();
        let (white, black) = (game.white.id, game.black.id);

        game.make_move(white, "e2e4".parse().unwrap()).unwrap();
        game.make_move(black, "e7e5".parse().unwrap()).unwrap();
        game.offer_draw(white).unwrap();
        assert_eq!(game.accept_draw(black), Ok(GameEvent::DrawAccepted { status: GameStatus::Draw }));
        assert_eq!(game.status, GameStatus::Draw);
    }

    #[test]
    fn cannot_accept_your_own_draw_offer() {
        let mut game = fresh_game();
        let white = game.white.id;
        game.offer_draw(white).unwrap();
        assert_eq!(game.accept_draw(white), Err(Error::OwnDrawOffer));
    }

    #[test]
    fn draw_offer_rejected_leaves_game_in_progress() {
        let mut game = fresh_game();
        let (white, black) = (game.white.id, game.black.id);
        game.make_move(white, "e2e4".parse().unwrap()).unwrap();
        game.make_move(black, "e7e5".parse().unwrap()).unwrap();
        game.offer_draw(black).unwrap();
        game.reject_draw(white).unwrap();
        assert!(game.draw_offered_by.is_none());
        game.make_move(white, "d2d4".parse().unwrap()).unwrap();
        assert_eq!(game.status, GameStatus::InProgress);
    }

    #[test]
    fn resign_ends_the_game() {
        let mut game = fresh_game();
        let white = game.white.id;
        let event = game.resign(white).unwrap();
        assert_eq!(game.status, GameStatus::Resigned);
        assert_eq!(event, GameEvent::GameResigned { by: Color::White, status: GameStatus::Resigned });
    }

    #[test]
    fn moves_after_resignation_are_rejected() {
        let mut game = fresh_game();
        let (white, black) = (game.white.id, game.black.id);
        game.resign(white).unwrap();
        assert_eq!(game.make_move(black, "e7e5".parse().unwrap()), Err(Error::GameTerminal));
    }
}
