//! Material + piece-square-table evaluation (spec §4.3).

use crate::color::Color;
use crate::piece::Role;
use crate::position::Position;
use crate::square::Square;

/// Material value in centipawns, per [`Role`].
pub fn material_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 100,
        Role::Knight => 320,
        Role::Bishop => 330,
        Role::Rook => 500,
        Role::Queen => 900,
        Role::King => 20_000,
    }
}

#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
     50,  50,  50,  50,  50,  50,  50,  50,
     10,  10,  20,  30,  30,  20,  10,  10,
      5,   5,  10,  25,  25,  10,   5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      5,  10,  10, -20, -20,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10,  10,  10,  10,  10,   5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      0,   0,   0,   5,   5,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,   5,   5,   5,   0, -10,
     -5,   0,   5,   5,   5,   5,   0,  -5,
      0,   0,   5,   5,   5,   5,   0,  -5,
    -10,   5,   5,   5,   5,   5,   0, -10,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_MIDDLEGAME_PST: [i32; 64] = [
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -10, -20, -20, -20, -20, -20, -20, -10,
     20,  20,   0,   0,   0,   0,  20,  20,
     20,  30,  10,   0,   0,  10,  30,  20,
];

fn pst(role: Role, sq: Square) -> i32 {
    let table = match role {
        Role::Pawn => &PAWN_PST,
        Role::Knight => &KNIGHT_PST,
        Role::Bishop => &BISHOP_PST,
        Role::Rook => &ROOK_PST,
        Role::Queen => &QUEEN_PST,
        Role::King => &KING_MIDDLEGAME_PST,
    };
    table[sq.index() as usize]
}

/// The piece-square bonus for a piece of `color`/`role` sitting on `sq`.
///
/// Tables above are written from White's perspective (rank 1 at the start
/// of the array); Black's index is mirrored vertically (`square XOR 56`).
pub fn piece_square_value(color: Color, role: Role, sq: Square) -> i32 {
    match color {
        Color::White => pst(role, sq),
        Color::Black => pst(role, sq.mirror()),
    }
}

/// The static evaluation of `position`, in centipawns from the side to
/// move's perspective (spec §4.3).
pub fn evaluate(position: &Position) -> i32 {
    let mut score = 0i32;

    for &color in &Color::ALL {
        let sign = if color == position.side_to_move() { 1 } else { -1 };
        for &role in &Role::ALL {
            for sq in position.by_piece(crate::piece::Piece::new(color, role)) {
                score += sign * (material_value(role) + piece_square_value(color, role, sq));
            }
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_values_match_spec() {
        assert_eq!(material_value(Role::Pawn), 100);
        assert_eq!(material_value(Role::Knight), 320);
        assert_eq!(material_value(Role::Bishop), 330);
        assert_eq!(material_value(Role::Rook), 500);
        assert_eq!(material_value(Role::Queen), 900);
        assert_eq!(material_value(Role::King), 20_000);
    }

    #[test]
    fn initial_position_is_materially_balanced() {
        assert_eq!(evaluate(&Position::initial()), 0);
    }

    #[test]
    fn mirroring_is_vertical_only() {
        let white_sq: Square = "e2".parse().unwrap();
        let black_sq: Square = "e7".parse().unwrap();
        assert_eq!(
            piece_square_value(Color::White, Role::Pawn, white_sq),
            piece_square_value(Color::Black, Role::Pawn, black_sq),
        );
    }

    #[test]
    fn capturing_a_free_pawn_improves_the_evaluation() {
        let pos = Position::from_fen("4k3/8/8/4p3/4P3/8/8/4K3 w - - 0 1").unwrap();
        let after = pos.make_move("e4e5".parse().unwrap());
        // After capturing, it is Black's turn, so the score (from Black's
        // perspective) should reflect material now down a pawn for Black.
        assert!(evaluate(&after) < 0);
    }
}
