//! The chess rules kernel: board representation, legal move generation,
//! and static evaluation.

pub mod attacks;
pub mod bitboard;
pub mod castling;
pub mod color;
pub mod eval;
pub mod mov;
pub mod piece;
pub mod position;
pub mod rules;
pub mod square;
pub mod zobrist;

pub use bitboard::Bitboard;
pub use castling::CastlingRights;
pub use color::Color;
pub use mov::{InvalidMove, Move};
pub use piece::{InvalidPromotion, Piece, Promotion, Role};
pub use position::Position;
pub use square::{File, InvalidSquare, Rank, Square};
pub use zobrist::Zobrist;
