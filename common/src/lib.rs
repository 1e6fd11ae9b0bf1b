//! Identifiers and error kinds shared by every layer of the chess server.

mod error;
mod ids;

pub use error::{Error, ErrorKind};
pub use ids::{GameId, PlayerId, UserId};
