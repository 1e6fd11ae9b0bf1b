use derive_more::{Display, Error};

/// The unified failure taxonomy of spec §7.
///
/// Every domain operation in the workspace returns `Result<_, Error>` (or a
/// narrower local error that converts into this one at the adapter
/// boundary); the core never panics for an expected failure mode.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum Error {
    /// Malformed FEN or move notation.
    #[display(fmt = "invalid encoding: {_0}")]
    InvalidEncoding(#[error(not(source))] String),

    /// The actor is not one of the game's two players.
    #[display(fmt = "actor is not a participant in this game")]
    NotAParticipant,

    /// The actor is a participant, but it is not their turn.
    #[display(fmt = "it is not your turn")]
    NotYourTurn,

    /// The operation requires an active game, but the game has ended.
    #[display(fmt = "the game has already ended")]
    GameTerminal,

    /// `acceptDraw`/`rejectDraw` was called with no pending offer.
    #[display(fmt = "there is no pending draw offer")]
    NoDrawOffer,

    /// A player tried to accept or reject their own draw offer.
    #[display(fmt = "you cannot respond to your own draw offer")]
    OwnDrawOffer,

    /// The search was asked for a move in a position with none.
    #[display(fmt = "the position has no legal moves")]
    NoLegalMoves,

    /// `joinMatchmaking` referenced a user the `UserDirectory` doesn't know.
    #[display(fmt = "unknown user")]
    UnknownUser,

    /// The user is already present in the matchmaking queue.
    #[display(fmt = "user is already queued")]
    AlreadyQueued,

    /// The user already holds an unexpired match.
    #[display(fmt = "user is already matched")]
    AlreadyMatched,

    /// No game exists for the given id.
    #[display(fmt = "game not found")]
    GameNotFound,

    /// No player exists for the given id.
    #[display(fmt = "player not found")]
    PlayerNotFound,

    /// A repository or network collaborator failed; not retried by the core.
    #[display(fmt = "transient failure: {_0}")]
    Transient(#[error(not(source))] String),
}

/// A coarse classification of [`Error`], used by adapters to pick a status
/// code / close code without matching on every variant.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    Conflict,
    NotFound,
    Transient,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            InvalidEncoding(_) | NotYourTurn | GameTerminal | NoDrawOffer | OwnDrawOffer
            | NoLegalMoves => ErrorKind::Validation,
            NotAParticipant => ErrorKind::Forbidden,
            AlreadyQueued | AlreadyMatched => ErrorKind::Conflict,
            GameNotFound | PlayerNotFound | UnknownUser => ErrorKind::NotFound,
            Transient(_) => ErrorKind::Transient,
        }
    }

    /// The HTTP status code spec §7 maps this error kind to.
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Transient => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_spec_table() {
        assert_eq!(Error::NotYourTurn.http_status(), 400);
        assert_eq!(Error::NotAParticipant.http_status(), 403);
        assert_eq!(Error::GameNotFound.http_status(), 404);
        assert_eq!(Error::AlreadyQueued.http_status(), 409);
        assert_eq!(Error::Transient("db down".into()).http_status(), 503);
    }
}
