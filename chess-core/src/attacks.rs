//! Precomputed and ray-cast attack tables (spec §4.2's "Attack detection").
//!
//! Knights, kings and pawns use small precomputed tables. Sliding pieces
//! (bishop/rook/queen) use classical ray-casting that stops at the first
//! blocker, rather than magic bitboards — the simplest approach that meets
//! the spec, and the most legible one to audit against it.

use crate::bitboard::Bitboard;
use crate::color::Color;
use crate::square::Square;
use std::sync::OnceLock;

struct Tables {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn tables() -> &'static Tables {
    TABLES.get_or_init(|| Tables {
        knight: std::array::from_fn(|i| knight_attacks_from(Square::new(i as u8))),
        king: std::array::from_fn(|i| king_attacks_from(Square::new(i as u8))),
        pawn: [
            std::array::from_fn(|i| pawn_attacks_from(Square::new(i as u8), Color::White)),
            std::array::from_fn(|i| pawn_attacks_from(Square::new(i as u8), Color::Black)),
        ],
    })
}

fn knight_attacks_from(sq: Square) -> Bitboard {
    const OFFSETS: [(i8, i8); 8] = [
        (1, 2), (2, 1), (2, -1), (1, -2),
        (-1, -2), (-2, -1), (-2, 1), (-1, 2),
    ];
    let mut bb = Bitboard::EMPTY;
    for &(df, dr) in &OFFSETS {
        if let Some(to) = sq.offset(df, dr) {
            bb.set(to);
        }
    }
    bb
}

fn king_attacks_from(sq: Square) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for df in -1i8..=1 {
        for dr in -1i8..=1 {
            if (df, dr) != (0, 0) {
                if let Some(to) = sq.offset(df, dr) {
                    bb.set(to);
                }
            }
        }
    }
    bb
}

fn pawn_attacks_from(sq: Square, color: Color) -> Bitboard {
    let dr = color.pawn_direction();
    let mut bb = Bitboard::EMPTY;
    for df in [-1i8, 1] {
        if let Some(to) = sq.offset(df, dr) {
            bb.set(to);
        }
    }
    bb
}

pub fn knight_attacks(sq: Square) -> Bitboard {
    tables().knight[sq.index() as usize]
}

pub fn king_attacks(sq: Square) -> Bitboard {
    tables().king[sq.index() as usize]
}

pub fn pawn_attacks(sq: Square, color: Color) -> Bitboard {
    tables().pawn[color.index()][sq.index() as usize]
}

const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn ray_attacks(sq: Square, occupied: Bitboard, dirs: &[(i8, i8)]) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for &(df, dr) in dirs {
        let mut cur = sq;
        while let Some(next) = cur.offset(df, dr) {
            bb.set(next);
            if occupied.contains(next) {
                break;
            }
            cur = next;
        }
    }
    bb
}

pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, &BISHOP_DIRS)
}

pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(sq, occupied, &ROOK_DIRS)
}

pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knight_in_the_corner_has_two_targets() {
        assert_eq!(knight_attacks(Square::new(0)).len(), 2);
    }

    #[test]
    fn king_in_the_center_has_eight_targets() {
        assert_eq!(king_attacks("e4".parse().unwrap()).len(), 8);
    }

    #[test]
    fn rook_attacks_stop_at_first_blocker() {
        let occupied = Bitboard::from_square("e5".parse().unwrap());
        let attacks = rook_attacks("e1".parse().unwrap(), occupied);
        assert!(attacks.contains("e5".parse().unwrap()));
        assert!(!attacks.contains("e6".parse().unwrap()));
    }

    #[test]
    fn bishop_attacks_include_captures_but_not_past_them() {
        let occupied = Bitboard::from_square("c3".parse().unwrap());
        let attacks = bishop_attacks("a1".parse().unwrap(), occupied);
        assert!(attacks.contains("c3".parse().unwrap()));
        assert!(!attacks.contains("d4".parse().unwrap()));
    }
}
