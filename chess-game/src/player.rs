use chess_core::Color;
use common::{PlayerId, UserId};
use serde::{Deserialize, Serialize};

/// One side's participation in a single game (spec §3, "Player").
///
/// A user playing two concurrent games holds two distinct `Player` records,
/// each with its own [`PlayerId`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub user_id: UserId,
    pub side: Color,
}

impl Player {
    pub fn new(user_id: UserId, side: Color) -> Self {
        Player {
            id: PlayerId::new(),
            user_id,
            side,
        }
    }

    /// `true` iff this side is played by the built-in engine rather than a
    /// registered user (spec §1: "games against other humans or a built-in
    /// engine").
    pub fn is_bot(&self) -> bool {
        self.user_id.is_bot()
    }
}
