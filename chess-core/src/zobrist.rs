use crate::color::Color;
use crate::piece::Role;
use crate::position::Position;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::OnceLock;

/// A 64-bit position fingerprint (spec §3).
///
/// Two positions that are equal from the search's point of view (they
/// differ only in halfmove/fullmove counters) hash to the same value.
/// Uniqueness is not guaranteed and search correctness never depends on it.
pub type Zobrist = u64;

struct ZobristTable {
    /// `[color][role][square]`
    pieces: [[[u64; 64]; 6]; 2],
    castling: [u64; 16],
    en_passant_file: [u64; 8],
    side_to_move: u64,
}

/// The process-wide, deterministically seeded key table (spec §3, §4.3):
/// seed 42, combining piece-square occupancy, side to move, castling
/// rights, and the en-passant file.
static TABLE: OnceLock<ZobristTable> = OnceLock::new();

fn table() -> &'static ZobristTable {
    TABLE.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(42);
        ZobristTable {
            pieces: std::array::from_fn(|_| std::array::from_fn(|_| std::array::from_fn(|_| rng.gen()))),
            castling: std::array::from_fn(|_| rng.gen()),
            en_passant_file: std::array::from_fn(|_| rng.gen()),
            side_to_move: rng.gen(),
        }
    })
}

pub(crate) trait PositionZobrist {
    fn of(position: &Position) -> Zobrist;
}

impl PositionZobrist for Zobrist {
    fn of(position: &Position) -> Zobrist {
        let t = table();
        let mut hash = 0u64;

        for &color in &Color::ALL {
            for &role in &Role::ALL {
                let bb = position.pieces_by_color_role()[color.index()][role.index()];
                for sq in bb {
                    hash ^= t.pieces[color.index()][role.index()][sq.index() as usize];
                }
            }
        }

        hash ^= t.castling[position.castling_rights().index() as usize];

        if let Some(ep) = position.en_passant_square() {
            hash ^= t.en_passant_file[ep.file().index() as usize];
        }

        if position.side_to_move() == Color::Black {
            hash ^= t.side_to_move;
        }

        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_deterministic_across_calls() {
        let a = Zobrist::of(&Position::initial());
        let b = Zobrist::of(&Position::initial());
        assert_eq!(a, b);
    }

    #[test]
    fn different_positions_usually_hash_differently() {
        let initial = Position::initial();
        let after = initial.make_move("e2e4".parse().unwrap());
        assert_ne!(initial.zobrist(), after.zobrist());
    }

    #[test]
    fn halfmove_and_fullmove_counters_do_not_affect_the_hash() {
        let fen_a = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let fen_b = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 7 12";
        let a = Position::from_fen(fen_a).unwrap();
        let b = Position::from_fen(fen_b).unwrap();
        assert_eq!(a.zobrist(), b.zobrist());
    }
}
