use crate::bitboard::Bitboard;
use crate::castling::CastlingRights;
use crate::color::Color;
use crate::mov::Move;
use crate::piece::{Piece, Promotion, Role};
use crate::square::{File, Rank, Square};
use crate::zobrist::{PositionZobrist, Zobrist};
use common::Error;
use std::fmt;

/// An immutable chess position: twelve piece bitboards, side to move,
/// castling rights, the en-passant target square, and the two move counters
/// (spec §3).
///
/// The only mutator is [`Position::make_move`], which returns a new
/// `Position` rather than mutating in place; it assumes the move is already
/// legal (legality is [`crate::rules`]'s responsibility) and is a no-op
/// no-move detector only insofar as an empty source square leaves the
/// position unchanged.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Position {
    pieces: [[Bitboard; 6]; 2],
    side: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Position {
    /// The FIDE starting position.
    pub fn initial() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("hardcoded starting FEN is well-formed")
    }

    pub fn side_to_move(&self) -> Color {
        self.side
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        for &color in &Color::ALL {
            for &role in &Role::ALL {
                if self.pieces[color.index()][role.index()].contains(sq) {
                    return Some(Piece::new(color, role));
                }
            }
        }
        None
    }

    #[inline]
    pub fn is_occupied(&self, sq: Square) -> bool {
        self.occupied().contains(sq)
    }

    pub fn occupied(&self) -> Bitboard {
        self.by_color(Color::White) | self.by_color(Color::Black)
    }

    pub fn by_color(&self, color: Color) -> Bitboard {
        self.pieces[color.index()]
            .iter()
            .fold(Bitboard::EMPTY, |acc, &bb| acc | bb)
    }

    pub fn by_role(&self, role: Role) -> Bitboard {
        self.pieces[Color::White.index()][role.index()]
            | self.pieces[Color::Black.index()][role.index()]
    }

    pub fn by_piece(&self, piece: Piece) -> Bitboard {
        self.pieces[piece.color.index()][piece.role.index()]
    }

    pub fn king_square(&self, color: Color) -> Square {
        self.by_piece(Piece::new(color, Role::King))
            .into_iter()
            .next()
            .expect("every reachable position has exactly one king per side")
    }

    fn piece_bb_mut(&mut self, piece: Piece) -> &mut Bitboard {
        &mut self.pieces[piece.color.index()][piece.role.index()]
    }

    fn place(&mut self, sq: Square, piece: Piece) {
        self.piece_bb_mut(piece).set(sq);
    }

    fn remove(&mut self, sq: Square, piece: Piece) {
        self.piece_bb_mut(piece).clear(sq);
    }

    /// Applies `mov`, assumed legal in this position, and returns the
    /// resulting position. If `mov.from` is unoccupied this is a no-op
    /// (callers must establish legality via [`crate::rules`] first).
    pub fn make_move(&self, mov: Move) -> Position {
        let Some(moving) = self.piece_at(mov.from) else {
            return self.clone();
        };

        let mut next = self.clone();
        let captured = next.piece_at(mov.to);
        let is_en_passant_capture = moving.role == Role::Pawn
            && captured.is_none()
            && Some(mov.to) == self.en_passant
            && mov.from.file() != mov.to.file();

        next.remove(mov.from, moving);
        if let Some(captured_piece) = captured {
            next.remove(mov.to, captured_piece);
        }

        if is_en_passant_capture {
            let captured_sq = Square::from_coords(mov.to.file(), mov.from.rank());
            next.remove(captured_sq, Piece::new(!self.side, Role::Pawn));
        }

        let destination_piece = match mov.promotion {
            Some(promo) if moving.role == Role::Pawn && mov.to.rank().index() == self.side.promotion_rank() => {
                Piece::new(self.side, promo.role())
            }
            _ => moving,
        };
        next.place(mov.to, destination_piece);

        // Castling: a king move of exactly two files relocates the rook.
        if moving.role == Role::King {
            let df = mov.to.file().index() as i8 - mov.from.file().index() as i8;
            if df == 2 {
                let rook_from = Square::from_coords(File::H, mov.from.rank());
                let rook_to = Square::from_coords(File::new(5), mov.from.rank());
                let rook = Piece::new(self.side, Role::Rook);
                next.remove(rook_from, rook);
                next.place(rook_to, rook);
            } else if df == -2 {
                let rook_from = Square::from_coords(File::A, mov.from.rank());
                let rook_to = Square::from_coords(File::new(3), mov.from.rank());
                let rook = Piece::new(self.side, Role::Rook);
                next.remove(rook_from, rook);
                next.place(rook_to, rook);
            }
        }

        // Castling-rights update.
        if moving.role == Role::King {
            next.castling.clear_color(self.side);
        }
        for (sq, color) in [
            (Square::from_coords(File::A, Rank::new(self.side.back_rank())), self.side),
            (Square::from_coords(File::H, Rank::new(self.side.back_rank())), self.side),
        ] {
            if mov.from == sq || mov.to == sq {
                if sq.file() == File::A {
                    next.castling.remove(CastlingRights::queenside(color));
                } else {
                    next.castling.remove(CastlingRights::kingside(color));
                }
            }
        }
        // A captured rook on its home square also clears that right.
        if let Some(captured_piece) = captured {
            if captured_piece.role == Role::Rook {
                let opponent = !self.side;
                if mov.to == Square::from_coords(File::A, Rank::new(opponent.back_rank())) {
                    next.castling.remove(CastlingRights::queenside(opponent));
                } else if mov.to == Square::from_coords(File::H, Rank::new(opponent.back_rank())) {
                    next.castling.remove(CastlingRights::kingside(opponent));
                }
            }
        }

        // New en-passant target: set only on a pawn's initial two-square push.
        next.en_passant = None;
        if moving.role == Role::Pawn {
            let dr = mov.to.rank().index() as i8 - mov.from.rank().index() as i8;
            if dr.abs() == 2 {
                let mid_rank = (mov.from.rank().index() as i8 + self.side.pawn_direction()) as u8;
                next.en_passant = Some(Square::from_coords(mov.from.file(), Rank::new(mid_rank)));
            }
        }

        // Halfmove clock: reset on capture or pawn move, else increment.
        if moving.role == Role::Pawn || captured.is_some() || is_en_passant_capture {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock += 1;
        }

        if self.side == Color::Black {
            next.fullmove_number += 1;
        }

        next.side = !self.side;
        next
    }

    pub fn zobrist(&self) -> Zobrist {
        Zobrist::of(self)
    }

    pub(crate) fn pieces_by_color_role(&self) -> &[[Bitboard; 6]; 2] {
        &self.pieces
    }

    pub fn from_fen(fen: &str) -> Result<Self, Error> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(invalid(fen));
        }

        let [placement, active, castling, ep, halfmove, fullmove] = fields[..] else {
            return Err(invalid(fen));
        };

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid(fen));
        }

        let mut pieces = [[Bitboard::EMPTY; 6]; 2];
        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = Rank::new(7 - rank_from_top as u8);
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(digit) = c.to_digit(10) {
                    if digit == 0 || digit > 8 {
                        return Err(invalid(fen));
                    }
                    file += digit as u8;
                } else {
                    let piece = Piece::from_fen_letter(c).ok_or_else(|| invalid(fen))?;
                    if file >= 8 {
                        return Err(invalid(fen));
                    }
                    let sq = Square::from_coords(File::new(file), rank);
                    pieces[piece.color.index()][piece.role.index()].set(sq);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(invalid(fen));
            }
        }

        let side = match active {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(invalid(fen)),
        };

        let mut rights = CastlingRights::empty();
        if castling != "-" {
            for c in castling.chars() {
                match c {
                    'K' => rights.insert(CastlingRights::WHITE_KINGSIDE),
                    'Q' => rights.insert(CastlingRights::WHITE_QUEENSIDE),
                    'k' => rights.insert(CastlingRights::BLACK_KINGSIDE),
                    'q' => rights.insert(CastlingRights::BLACK_QUEENSIDE),
                    _ => return Err(invalid(fen)),
                }
            }
        }

        let en_passant = if ep == "-" {
            None
        } else {
            let sq: Square = ep.parse().map_err(|_| invalid(fen))?;
            if sq.rank() != Rank::new(2) && sq.rank() != Rank::new(5) {
                return Err(invalid(fen));
            }
            Some(sq)
        };

        let halfmove_clock: u32 = halfmove.parse().map_err(|_| invalid(fen))?;
        let fullmove_number: u32 = fullmove.parse().map_err(|_| invalid(fen))?;
        if fullmove_number == 0 {
            return Err(invalid(fen));
        }

        Ok(Position {
            pieces,
            side,
            castling: rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank_from_top in 0..8u8 {
            let rank = Rank::new(7 - rank_from_top);
            let mut empty_run = 0u8;
            for file in 0..8u8 {
                let sq = Square::from_coords(File::new(file), rank);
                match self.piece_at(sq) {
                    Some(piece) => {
                        if empty_run > 0 {
                            placement.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        placement.push(piece.fen_letter());
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                placement.push((b'0' + empty_run) as char);
            }
            if rank_from_top != 7 {
                placement.push('/');
            }
        }

        let active = match self.side {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        if self.castling.has_kingside(Color::White) {
            castling.push('K');
        }
        if self.castling.has_queenside(Color::White) {
            castling.push('Q');
        }
        if self.castling.has_kingside(Color::Black) {
            castling.push('k');
        }
        if self.castling.has_queenside(Color::Black) {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = self
            .en_passant
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_owned());

        format!(
            "{placement} {active} {castling} {ep} {} {}",
            self.halfmove_clock, self.fullmove_number
        )
    }
}

fn invalid(fen: &str) -> Error {
    Error::InvalidEncoding(format!("malformed FEN `{fen}`"))
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_position_round_trips_through_fen() {
        let pos = Position::initial();
        assert_eq!(
            pos.to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        assert_eq!(Position::from_fen(&pos.to_fen()).unwrap(), pos);
    }

    #[test]
    fn malformed_fen_is_rejected() {
        assert!(Position::from_fen("not a fen").is_err());
        assert!(Position::from_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBN w KQkq - 0 1"
        )
        .is_err());
        assert!(Position::from_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"
        )
        .is_err());
    }

    #[test]
    fn simple_pawn_push_toggles_side_and_resets_halfmove_clock() {
        let pos = Position::initial();
        let next = pos.make_move(Move::quiet("e2".parse().unwrap(), "e4".parse().unwrap()));
        assert_eq!(next.side_to_move(), Color::Black);
        assert_eq!(next.halfmove_clock(), 0);
        assert_eq!(next.en_passant_square(), Some("e3".parse().unwrap()));
        assert_eq!(next.fullmove_number(), 1);
    }

    #[test]
    fn black_move_advances_fullmove_number() {
        let pos = Position::initial()
            .make_move(Move::quiet("e2".parse().unwrap(), "e4".parse().unwrap()))
            .make_move(Move::quiet("e7".parse().unwrap(), "e5".parse().unwrap()));
        assert_eq!(pos.fullmove_number(), 2);
    }

    #[test]
    fn knight_move_increments_halfmove_clock() {
        let pos = Position::initial()
            .make_move(Move::quiet("g1".parse().unwrap(), "f3".parse().unwrap()));
        assert_eq!(pos.halfmove_clock(), 1);
    }

    #[test]
    fn kingside_castling_relocates_the_rook() {
        let pos = Position::from_fen("r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQK2R w KQkq - 6 6").unwrap();
        let next = pos.make_move(Move::quiet("e1".parse().unwrap(), "g1".parse().unwrap()));
        assert_eq!(next.piece_at("g1".parse().unwrap()).unwrap().role, Role::King);
        assert_eq!(next.piece_at("f1".parse().unwrap()).unwrap().role, Role::Rook);
        assert!(next.piece_at("h1".parse().unwrap()).is_none());
        assert!(!next.castling_rights().has_kingside(Color::White));
        assert!(!next.castling_rights().has_queenside(Color::White));
    }

    #[test]
    fn promotion_replaces_the_pawn() {
        let pos = Position::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        let next = pos.make_move(Move::new(
            "a7".parse().unwrap(),
            "a8".parse().unwrap(),
            Some(Promotion::Queen),
        ));
        assert_eq!(next.piece_at("a8".parse().unwrap()).unwrap().role, Role::Queen);
    }

    #[test]
    fn en_passant_capture_removes_the_pawn_behind_the_target() {
        let pos = Position::from_fen("k7/8/8/3pP3/8/8/8/K7 w - d6 0 1").unwrap();
        let next = pos.make_move(Move::quiet("e5".parse().unwrap(), "d6".parse().unwrap()));
        assert!(next.piece_at("d5".parse().unwrap()).is_none());
        assert_eq!(next.piece_at("d6".parse().unwrap()).unwrap().role, Role::Pawn);
    }
}
