use chess_core::{Color, Move};
use chess_game::GameStatus;
use common::{GameId, PlayerId};
use serde::{Deserialize, Serialize};

/// Lower-case wire rendering of [`Color`] (spec §6 uses `yourColour` as a
/// plain string, distinct from `GameStatus`'s `SCREAMING_SNAKE_CASE`).
fn colour_str(colour: Color) -> &'static str {
    match colour {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// A framed server-to-client message (spec §4.10, §6).
///
/// One JSON object per event, discriminated by `type`. Moves are carried in
/// algebraic notation (`e2e4`) rather than as a structured `{from,to}` pair,
/// matching the wire format §6 defines for moves everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    AuthSuccess,
    GameStateSync {
        game_id: GameId,
        fen: String,
        status: GameStatus,
        side_to_move: String,
        your_colour: Option<String>,
    },
    QueuePositionUpdate {
        queue_position: usize,
    },
    MoveExecuted {
        #[serde(rename = "move")]
        mov: String,
        fen: String,
        status: GameStatus,
        side_to_move: String,
        is_check: bool,
    },
    MoveRejected {
        reason: String,
    },
    DrawOffered {
        by: String,
    },
    DrawAccepted {
        status: GameStatus,
    },
    DrawRejected,
    GameResigned {
        by: String,
        status: GameStatus,
    },
    PlayerDisconnected {
        player_id: PlayerId,
    },
    PlayerReconnected {
        player_id: PlayerId,
    },
    MatchFound {
        game_id: GameId,
        your_colour: String,
    },
}

impl ServerMessage {
    pub fn game_state_sync(game_id: GameId, fen: String, status: GameStatus, side_to_move: Color, your_colour: Option<Color>) -> Self {
        ServerMessage::GameStateSync {
            game_id,
            fen,
            status,
            side_to_move: colour_str(side_to_move).to_owned(),
            your_colour: your_colour.map(|c| colour_str(c).to_owned()),
        }
    }

    pub fn move_executed(mov: Move, fen: String, status: GameStatus, side_to_move: Color, is_check: bool) -> Self {
        ServerMessage::MoveExecuted {
            mov: mov.to_string(),
            fen,
            status,
            side_to_move: colour_str(side_to_move).to_owned(),
            is_check,
        }
    }

    pub fn draw_offered(by: Color) -> Self {
        ServerMessage::DrawOffered { by: colour_str(by).to_owned() }
    }

    pub fn game_resigned(by: Color, status: GameStatus) -> Self {
        ServerMessage::GameResigned { by: colour_str(by).to_owned(), status }
    }

    pub fn match_found(game_id: GameId, your_colour: Color) -> Self {
        ServerMessage::MatchFound { game_id, your_colour: colour_str(your_colour).to_owned() }
    }

    /// Serializes to the single framed text payload sent over the wire.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ServerMessage always serializes")
    }
}

/// A framed client-to-server message (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    JoinQueue,
    LeaveQueue,
    MoveAttempt {
        from: String,
        to: String,
        promotion: Option<String>,
    },
    OfferDraw,
    AcceptDraw,
    RejectDraw,
    Resign,
}

impl ClientMessage {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_executed_round_trips_as_json() {
        let msg = ServerMessage::move_executed(
            "e2e4".parse().unwrap(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".into(),
            GameStatus::InProgress,
            Color::Black,
            false,
        );
        let json = msg.to_json();
        assert!(json.contains("\"type\":\"MoveExecuted\""));
        assert!(json.contains("\"move\":\"e2e4\""));
        let parsed: ServerMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn client_move_attempt_parses() {
        let raw = r#"{"type":"MoveAttempt","from":"e2","to":"e4","promotion":null}"#;
        let msg = ClientMessage::from_json(raw).unwrap();
        assert_eq!(msg, ClientMessage::MoveAttempt { from: "e2".into(), to: "e4".into(), promotion: None });
    }

    #[test]
    fn join_queue_parses_as_unit_variant() {
        let raw = r#"{"type":"JoinQueue"}"#;
        assert_eq!(ClientMessage::from_json(raw).unwrap(), ClientMessage::JoinQueue);
    }
}
