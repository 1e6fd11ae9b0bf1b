//! Pseudo-legal generation, the legality filter, and terminal-state
//! detection (spec §4.2). Free functions over [`Position`] rather than a
//! struct: the position is the only state this module needs.

use crate::attacks;
use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::mov::Move;
use crate::piece::{Piece, Promotion, Role};
use crate::position::Position;
use crate::square::{File, Rank, Square};

/// All squares attacked by `by_side`, including squares occupied by that
/// side's own pieces (an "attacked" square, not a "movable-to" square).
///
/// `king_square_override`, when given, replaces the real king square of the
/// side *not* attacking for the duration of this computation — used by
/// castling legality to expose discovered attacks along rays that would
/// otherwise be blocked by the king itself (spec §4.2).
pub fn threatened_squares(position: &Position, by_side: Color) -> Bitboard {
    threatened_squares_with(position, by_side, position.occupied())
}

fn threatened_squares_with(position: &Position, by_side: Color, occupied: Bitboard) -> Bitboard {
    let mut attacked = Bitboard::EMPTY;

    for sq in position.by_piece(Piece::new(by_side, Role::Pawn)) {
        attacked |= attacks::pawn_attacks(sq, by_side);
    }
    for sq in position.by_piece(Piece::new(by_side, Role::Knight)) {
        attacked |= attacks::knight_attacks(sq);
    }
    for sq in position.by_piece(Piece::new(by_side, Role::King)) {
        attacked |= attacks::king_attacks(sq);
    }
    for sq in position.by_piece(Piece::new(by_side, Role::Bishop)) {
        attacked |= attacks::bishop_attacks(sq, occupied);
    }
    for sq in position.by_piece(Piece::new(by_side, Role::Rook)) {
        attacked |= attacks::rook_attacks(sq, occupied);
    }
    for sq in position.by_piece(Piece::new(by_side, Role::Queen)) {
        attacked |= attacks::queen_attacks(sq, occupied);
    }

    attacked
}

pub fn is_in_check(position: &Position, side: Color) -> bool {
    let king = position.king_square(side);
    threatened_squares(position, !side).contains(king)
}

/// All pseudo-legal moves: obey piece movement rules and cannot capture a
/// friendly piece, but may leave the mover's own king in check.
pub fn pseudo_legal_moves(position: &Position) -> Vec<Move> {
    let side = position.side_to_move();
    let own = position.by_color(side);
    let enemy = position.by_color(!side);
    let occupied = position.occupied();
    let mut moves = Vec::with_capacity(48);

    for from in position.by_piece(Piece::new(side, Role::Pawn)) {
        generate_pawn_moves(position, from, side, enemy, occupied, &mut moves);
    }
    for from in position.by_piece(Piece::new(side, Role::Knight)) {
        push_targets(from, attacks::knight_attacks(from) & !own, &mut moves);
    }
    for from in position.by_piece(Piece::new(side, Role::Bishop)) {
        push_targets(from, attacks::bishop_attacks(from, occupied) & !own, &mut moves);
    }
    for from in position.by_piece(Piece::new(side, Role::Rook)) {
        push_targets(from, attacks::rook_attacks(from, occupied) & !own, &mut moves);
    }
    for from in position.by_piece(Piece::new(side, Role::Queen)) {
        push_targets(from, attacks::queen_attacks(from, occupied) & !own, &mut moves);
    }
    for from in position.by_piece(Piece::new(side, Role::King)) {
        push_targets(from, attacks::king_attacks(from) & !own, &mut moves);
    }

    generate_castling_moves(position, side, occupied, &mut moves);

    moves
}

fn push_targets(from: Square, targets: Bitboard, moves: &mut Vec<Move>) {
    for to in targets {
        moves.push(Move::quiet(from, to));
    }
}

fn generate_pawn_moves(
    position: &Position,
    from: Square,
    side: Color,
    enemy: Bitboard,
    occupied: Bitboard,
    moves: &mut Vec<Move>,
) {
    let dr = side.pawn_direction();
    let promotion_rank = side.promotion_rank();

    let mut push_move = |to: Square, moves: &mut Vec<Move>| {
        if to.rank().index() == promotion_rank {
            for promo in Promotion::ALL {
                moves.push(Move::new(from, to, Some(promo)));
            }
        } else {
            moves.push(Move::quiet(from, to));
        }
    };

    // Single push.
    if let Some(one) = from.offset(0, dr) {
        if !occupied.contains(one) {
            push_move(one, moves);

            // Double push, only from the home rank, both squares empty.
            if from.rank().index() == side.pawn_home_rank() {
                if let Some(two) = from.offset(0, 2 * dr) {
                    if !occupied.contains(two) {
                        moves.push(Move::quiet(from, two));
                    }
                }
            }
        }
    }

    // Diagonal captures, including en passant.
    for df in [-1i8, 1] {
        if let Some(to) = from.offset(df, dr) {
            if enemy.contains(to) {
                push_move(to, moves);
            } else if Some(to) == position.en_passant_square() {
                moves.push(Move::quiet(from, to));
            }
        }
    }
}

fn generate_castling_moves(
    position: &Position,
    side: Color,
    occupied: Bitboard,
    moves: &mut Vec<Move>,
) {
    let rights = position.castling_rights();
    let back = Rank::new(side.back_rank());
    let king_from = Square::from_coords(File::new(4), back);

    if position.piece_at(king_from) != Some(Piece::new(side, Role::King)) {
        return;
    }
    if is_in_check(position, side) {
        return;
    }

    // Remove the king from the occupancy used for the attack check, so a
    // slider attacking *through* the king's own square is still detected
    // (spec §4.2: "squares tested for attack use threatenedSquares with
    // the king temporarily removed to expose discovered attacks").
    let mut occupied_without_king = occupied;
    occupied_without_king.clear(king_from);
    let enemy_attacks = threatened_squares_with(position, !side, occupied_without_king);

    if rights.has_kingside(side) {
        let f = Square::from_coords(File::new(5), back);
        let g = Square::from_coords(File::new(6), back);
        if !occupied.contains(f)
            && !occupied.contains(g)
            && !enemy_attacks.contains(f)
            && !enemy_attacks.contains(g)
        {
            moves.push(Move::quiet(king_from, g));
        }
    }

    if rights.has_queenside(side) {
        let d = Square::from_coords(File::new(3), back);
        let c = Square::from_coords(File::new(2), back);
        let b = Square::from_coords(File::new(1), back);
        if !occupied.contains(d)
            && !occupied.contains(c)
            && !occupied.contains(b)
            && !enemy_attacks.contains(d)
            && !enemy_attacks.contains(c)
        {
            moves.push(Move::quiet(king_from, c));
        }
    }
}

/// Whether `mov` is legal in `position`: pseudo-legal, and applying it does
/// not leave the mover's own king in check.
pub fn is_move_legal(position: &Position, mov: Move) -> bool {
    let side = position.side_to_move();
    if !pseudo_legal_moves(position)
        .into_iter()
        .any(|m| m == mov)
    {
        return false;
    }

    let next = position.make_move(mov);
    !is_in_check(&next, side)
}

/// All legal moves from `position`. Order is unspecified.
pub fn legal_moves(position: &Position) -> Vec<Move> {
    let side = position.side_to_move();
    pseudo_legal_moves(position)
        .into_iter()
        .filter(|&m| {
            let next = position.make_move(m);
            !is_in_check(&next, side)
        })
        .collect()
}

pub fn is_checkmate(position: &Position) -> bool {
    is_in_check(position, position.side_to_move()) && legal_moves(position).is_empty()
}

pub fn is_stalemate(position: &Position) -> bool {
    !is_in_check(position, position.side_to_move()) && legal_moves(position).is_empty()
}

pub fn is_fifty_move_rule(position: &Position) -> bool {
    position.halfmove_clock() >= 100
}

pub fn is_insufficient_material(position: &Position) -> bool {
    let occupied = position.occupied();
    if occupied.len() > 4 {
        return false;
    }

    let has_heavy_or_pawn = [Role::Pawn, Role::Rook, Role::Queen]
        .into_iter()
        .any(|role| !position.by_role(role).is_empty());
    if has_heavy_or_pawn {
        return false;
    }

    let knights = position.by_role(Role::Knight).len();
    let bishops: Vec<Square> = position.by_role(Role::Bishop).collect();

    match (knights, bishops.len()) {
        // King vs king.
        (0, 0) => true,
        // King+minor vs king.
        (1, 0) | (0, 1) if occupied.len() == 3 => true,
        // King+bishop vs king+bishop, same-coloured squares.
        (0, 2) if occupied.len() == 4 => {
            let colors: Vec<bool> = bishops.iter().map(|sq| square_is_light(*sq)).collect();
            colors.windows(2).all(|w| w[0] == w[1])
        }
        _ => false,
    }
}

fn square_is_light(sq: Square) -> bool {
    (sq.file().index() + sq.rank().index()) % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_has_twenty_legal_moves() {
        assert_eq!(legal_moves(&Position::initial()).len(), 20);
    }

    #[test]
    fn scholars_mate_is_checkmate() {
        let mut pos = Position::initial();
        for mov in ["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"] {
            pos = pos.make_move(mov.parse().unwrap());
        }
        assert!(is_checkmate(&pos));
    }

    #[test]
    fn fools_mate_is_checkmate() {
        let mut pos = Position::initial();
        for mov in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            pos = pos.make_move(mov.parse().unwrap());
        }
        assert!(is_checkmate(&pos));
    }

    #[test]
    fn queen_and_king_stalemate_the_lone_king() {
        let pos = Position::from_fen("7k/8/5K2/5Q2/8/8/8/8 w - - 0 1").unwrap();
        let next = pos.make_move("f5g6".parse().unwrap());
        assert!(is_stalemate(&next));
        assert!(!is_checkmate(&next));
    }

    #[test]
    fn capturing_the_lone_knight_is_insufficient_material() {
        let pos = Position::from_fen("4k3/8/8/8/8/3n4/4K3/8 w - - 0 1").unwrap();
        let next = pos.make_move("e2d3".parse().unwrap());
        assert!(is_insufficient_material(&next));
    }

    #[test]
    fn king_and_rook_is_not_insufficient_material() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/4K3/R7 w - - 0 1").unwrap();
        assert!(!is_insufficient_material(&pos));
    }

    #[test]
    fn castling_is_blocked_while_in_check() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq - 0 1").unwrap();
        let castles: Vec<_> = legal_moves(&pos)
            .into_iter()
            .filter(|m| m.from == "e1".parse().unwrap() && (m.to == "g1".parse().unwrap() || m.to == "c1".parse().unwrap()))
            .collect();
        assert!(castles.is_empty());
    }

    #[test]
    fn castling_through_an_attacked_square_is_illegal() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/5n2/8/R3K2R w KQkq - 0 1").unwrap();
        let kingside: Vec<_> = legal_moves(&pos)
            .into_iter()
            .filter(|m| m.from == "e1".parse().unwrap() && m.to == "g1".parse().unwrap())
            .collect();
        assert!(kingside.is_empty());
    }

    #[test]
    fn every_legal_move_keeps_the_mover_out_of_check() {
        let pos = Position::initial();
        for mov in legal_moves(&pos) {
            let next = pos.make_move(mov);
            assert!(!is_in_check(&next, pos.side_to_move()));
        }
    }

    #[test]
    fn is_move_legal_agrees_with_legal_moves() {
        let pos = Position::initial();
        let legal = legal_moves(&pos);
        assert!(is_move_legal(&pos, legal[0]));
        assert!(!is_move_legal(&pos, "e1e2".parse().unwrap()));
    }

    #[test]
    fn checkmate_implies_no_stalemate_and_vice_versa() {
        let mut pos = Position::initial();
        for mov in ["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"] {
            pos = pos.make_move(mov.parse().unwrap());
        }
        assert!(!(is_checkmate(&pos) && is_stalemate(&pos)));
    }
}
