use crate::piece::InvalidPromotion;
use crate::square::InvalidSquare;
use crate::{Promotion, Square};
use derive_more::{Display, Error};
use std::fmt;
use std::str::FromStr;

/// A move in pure coordinate notation: `(from, to, promotion?)`.
///
/// Promotion is present if and only if the move brings a pawn to its last
/// rank (spec §3); this type itself does not enforce that, since whether a
/// move is a promotion depends on the position it is played in — it is
/// enforced by [`crate::rules`] move generation and by [`Position::make`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Promotion>,
}

impl Move {
    pub fn new(from: Square, to: Square, promotion: Option<Promotion>) -> Self {
        Move { from, to, promotion }
    }

    pub fn quiet(from: Square, to: Square) -> Self {
        Move::new(from, to, None)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.letter())?;
        }
        Ok(())
    }
}

/// The reason an algebraic move string (`e2e4`, `a7a8q`) failed to parse.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum InvalidMove {
    #[display(fmt = "{_0}")]
    Square(InvalidSquare),
    #[display(fmt = "{_0}")]
    Promotion(InvalidPromotion),
    #[display(fmt = "invalid move notation `{_0}`")]
    Malformed(#[error(not(source))] String),
}

impl FromStr for Move {
    type Err = InvalidMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 4 && s.len() != 5 {
            return Err(InvalidMove::Malformed(s.to_owned()));
        }

        let from = s[0..2].parse().map_err(InvalidMove::Square)?;
        let to = s[2..4].parse().map_err(InvalidMove::Square)?;
        let promotion = if s.len() == 5 {
            Some(s[4..5].parse().map_err(InvalidMove::Promotion)?)
        } else {
            None
        };

        Ok(Move::new(from, to, promotion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn move_round_trips_through_display_and_parse(m: Move) {
        assert_eq!(m.to_string().parse::<Move>().unwrap(), m);
    }

    #[test]
    fn e2e4_parses_without_promotion() {
        let m: Move = "e2e4".parse().unwrap();
        assert_eq!(m.promotion, None);
    }

    #[test]
    fn a7a8q_parses_with_queen_promotion() {
        let m: Move = "a7a8q".parse().unwrap();
        assert_eq!(m.promotion, Some(Promotion::Queen));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!("e2".parse::<Move>().is_err());
        assert!("e2e4qq".parse::<Move>().is_err());
    }
}
