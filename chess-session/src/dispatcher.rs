use crate::connection::Connection;
use crate::hub::SessionHub;
use crate::message::ServerMessage;
use chess_game::GameEvent;
use common::{GameId, PlayerId};
use std::sync::Arc;

/// Translates [`GameEvent`]s into framed [`ServerMessage`]s and routes them
/// through a [`SessionHub`] (spec §4.10, C10).
///
/// This is a thin layer on top of the hub: the hub already knows how to
/// reach a game's players and spectators, so the dispatcher's only job is
/// the event-to-message mapping and picking the right hub call per event.
pub struct EventDispatcher<C> {
    hub: Arc<SessionHub<C>>,
}

impl<C: Connection + 'static> EventDispatcher<C> {
    pub fn new(hub: Arc<SessionHub<C>>) -> Self {
        EventDispatcher { hub }
    }

    /// Broadcasts a [`GameEvent`] to both players and all spectators.
    pub async fn dispatch_game_event(&self, game_id: GameId, white: PlayerId, black: PlayerId, event: &GameEvent) {
        let message = match event {
            GameEvent::MoveExecuted { mov, fen, status, side_to_move, is_check } => {
                ServerMessage::move_executed(*mov, fen.clone(), *status, *side_to_move, *is_check)
            }
            GameEvent::DrawOffered { by } => ServerMessage::draw_offered(*by),
            GameEvent::DrawAccepted { status } => ServerMessage::DrawAccepted { status: *status },
            GameEvent::DrawRejected => ServerMessage::DrawRejected,
            GameEvent::GameResigned { by, status } => ServerMessage::game_resigned(*by, *status),
        };

        self.hub.broadcast_game(game_id, white, black, &message).await;
    }

    /// `MoveRejected` only ever reaches the offending player (spec §4.10).
    pub async fn dispatch_move_rejected(&self, offender: PlayerId, reason: impl Into<String>) {
        self.hub.send_to_player(offender, &ServerMessage::MoveRejected { reason: reason.into() }).await;
    }

    /// `PlayerDisconnected`/`PlayerReconnected` reach the opponent and every
    /// spectator, never the subject themself (spec §4.10).
    pub async fn dispatch_presence(&self, game_id: GameId, opponent: PlayerId, subject: PlayerId, reconnected: bool) {
        let message = if reconnected {
            ServerMessage::PlayerReconnected { player_id: subject }
        } else {
            ServerMessage::PlayerDisconnected { player_id: subject }
        };
        self.hub.send_to_player(opponent, &message).await;
        self.hub.send_to_spectators(game_id, &message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MockConnection;
    use chess_game::GameStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_connection(sent: Arc<AtomicUsize>) -> MockConnection {
        let mut mock = MockConnection::new();
        mock.expect_send().returning(move |_| {
            sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        mock.expect_close().returning(|_| {});
        mock
    }

    #[tokio::test]
    async fn move_executed_reaches_both_players() {
        let hub = Arc::new(SessionHub::<MockConnection>::new());
        let dispatcher = EventDispatcher::new(Arc::clone(&hub));
        let (white, black) = (PlayerId::new(), PlayerId::new());
        let sent = Arc::new(AtomicUsize::new(0));
        hub.register_game(white, Arc::new(counting_connection(Arc::clone(&sent))));
        hub.register_game(black, Arc::new(counting_connection(Arc::clone(&sent))));

        let event = GameEvent::MoveExecuted {
            mov: "e2e4".parse().unwrap(),
            fen: "fen".into(),
            status: GameStatus::InProgress,
            side_to_move: chess_core::Color::Black,
            is_check: false,
        };
        dispatcher.dispatch_game_event(GameId::new(), white, black, &event).await;
        assert_eq!(sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn move_rejected_reaches_only_the_offender() {
        let hub = Arc::new(SessionHub::<MockConnection>::new());
        let dispatcher = EventDispatcher::new(Arc::clone(&hub));
        let offender = PlayerId::new();
        let sent = Arc::new(AtomicUsize::new(0));
        hub.register_game(offender, Arc::new(counting_connection(Arc::clone(&sent))));

        dispatcher.dispatch_move_rejected(offender, "not your turn").await;
        assert_eq!(sent.load(Ordering::SeqCst), 1);
    }
}
