use crate::Color;
use bitflags::bitflags;

bitflags! {
    /// The four castling rights, one bit each, matching spec §3's
    /// "castling rights (four bits)".
    #[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct CastlingRights: u8 {
        const WHITE_KINGSIDE  = 0b0001;
        const WHITE_QUEENSIDE = 0b0010;
        const BLACK_KINGSIDE  = 0b0100;
        const BLACK_QUEENSIDE = 0b1000;
    }
}

impl CastlingRights {
    #[inline]
    pub fn kingside(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    #[inline]
    pub fn queenside(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    #[inline]
    pub fn has_kingside(self, color: Color) -> bool {
        self.contains(Self::kingside(color))
    }

    #[inline]
    pub fn has_queenside(self, color: Color) -> bool {
        self.contains(Self::queenside(color))
    }

    /// Clears both rights belonging to `color`.
    #[inline]
    pub fn clear_color(&mut self, color: Color) {
        self.remove(Self::kingside(color) | Self::queenside(color));
    }

    /// A unique number in `0..16` identifying this exact rights pattern,
    /// used to index the Zobrist castling-key table.
    #[inline]
    pub fn index(self) -> u8 {
        self.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearing_a_color_leaves_the_other_untouched() {
        let mut rights = CastlingRights::all();
        rights.clear_color(Color::White);
        assert!(!rights.has_kingside(Color::White));
        assert!(!rights.has_queenside(Color::White));
        assert!(rights.has_kingside(Color::Black));
        assert!(rights.has_queenside(Color::Black));
    }

    #[test]
    fn index_spans_the_full_16_entry_range() {
        assert_eq!(CastlingRights::empty().index(), 0);
        assert_eq!(CastlingRights::all().index(), 15);
    }
}
