//! The Game aggregate: a state machine layered over [`chess_core::Position`],
//! plus its repository (spec §4.5, §4.6).

mod events;
mod game;
mod player;
mod repository;
mod status;

pub use events::GameEvent;
pub use game::Game;
pub use player::Player;
pub use repository::{GameRepository, InMemoryGameRepository, SqlxGameRepository};
pub use status::GameStatus;
