use crate::connection::{CloseCode, Connection};
use crate::message::ServerMessage;
use crate::registry::{GroupRegistry, Registry};
use chess_core::Color;
use chess_game::GameStatus;
use common::{GameId, PlayerId, UserId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

/// The graceful-close delay spec §4.9 calls for once a game reaches a
/// terminal status, so the terminal event has time to reach the socket.
pub const TERMINAL_CLOSE_DELAY: Duration = Duration::from_secs(1);

/// Holds the three connection registries spec §4.9 describes and the
/// broadcast/lifecycle operations built on top of them.
pub struct SessionHub<C> {
    matchmaking: Registry<UserId, C>,
    game: Registry<PlayerId, C>,
    spectator: GroupRegistry<GameId, UserId, C>,
}

impl<C> Default for SessionHub<C> {
    fn default() -> Self {
        SessionHub {
            matchmaking: Registry::new(),
            game: Registry::new(),
            spectator: GroupRegistry::new(),
        }
    }
}

impl<C: Connection + 'static> SessionHub<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_matchmaking(&self, user_id: UserId, connection: Arc<C>) {
        self.matchmaking.register(user_id, connection);
    }

    pub fn unregister_matchmaking(&self, user_id: UserId) {
        self.matchmaking.unregister(user_id);
    }

    pub fn register_game(&self, player_id: PlayerId, connection: Arc<C>) {
        self.game.register(player_id, connection);
    }

    pub fn unregister_game(&self, player_id: PlayerId) {
        self.game.unregister(player_id);
    }

    pub fn register_spectator(&self, game_id: GameId, user_id: UserId, connection: Arc<C>) {
        self.spectator.register(game_id, user_id, connection);
    }

    pub fn unregister_spectator(&self, game_id: GameId, user_id: UserId) {
        self.spectator.unregister(game_id, user_id);
    }

    /// Sends `message` best-effort; a failed send unregisters the stale
    /// connection rather than propagating the error (spec §4.10: "a dead
    /// connection never blocks the game itself").
    #[instrument(skip(self, message))]
    pub(crate) async fn send_to_player(&self, player_id: PlayerId, message: &ServerMessage) {
        let Some(connection) = self.game.get(player_id) else { return };
        if connection.send(message).await.is_err() {
            warn!(?player_id, "dropping stale game connection after failed send");
            self.game.unregister(player_id);
        }
    }

    #[instrument(skip(self, message))]
    pub(crate) async fn send_to_spectators(&self, game_id: GameId, message: &ServerMessage) {
        for (user_id, connection) in self.spectator.members(game_id) {
            if connection.send(message).await.is_err() {
                warn!(?user_id, ?game_id, "dropping stale spectator connection after failed send");
                self.spectator.unregister(game_id, user_id);
            }
        }
    }

    #[instrument(skip(self, message))]
    pub(crate) async fn send_to_matchmaking(&self, user_id: UserId, message: &ServerMessage) {
        let Some(connection) = self.matchmaking.get(user_id) else { return };
        if connection.send(message).await.is_err() {
            warn!(?user_id, "dropping stale matchmaking connection after failed send");
            self.matchmaking.unregister(user_id);
        }
    }

    /// Broadcasts to both players of a game and every current spectator.
    pub async fn broadcast_game(&self, game_id: GameId, white: PlayerId, black: PlayerId, message: &ServerMessage) {
        self.send_to_player(white, message).await;
        self.send_to_player(black, message).await;
        self.send_to_spectators(game_id, message).await;
    }

    /// Handshake completion for a game socket (spec §4.9): `AuthSuccess`
    /// followed by a `GameStateSync`.
    pub async fn on_game_authenticated(
        &self,
        player_id: PlayerId,
        game_id: GameId,
        fen: String,
        status: GameStatus,
        side_to_move: Color,
        your_colour: Color,
    ) {
        self.send_to_player(player_id, &ServerMessage::AuthSuccess).await;
        self.send_to_player(
            player_id,
            &ServerMessage::game_state_sync(game_id, fen, status, side_to_move, Some(your_colour)),
        )
        .await;
    }

    /// Handshake completion for a matchmaking socket.
    pub async fn on_matchmaking_authenticated(&self, user_id: UserId, queue_position: usize) {
        self.send_to_matchmaking(user_id, &ServerMessage::AuthSuccess).await;
        self.send_to_matchmaking(user_id, &ServerMessage::QueuePositionUpdate { queue_position }).await;
    }

    pub async fn notify_match_found(&self, user_id: UserId, game_id: GameId, your_colour: Color) {
        self.send_to_matchmaking(user_id, &ServerMessage::match_found(game_id, your_colour)).await;
    }

    pub async fn notify_queue_position(&self, user_id: UserId, queue_position: usize) {
        self.send_to_matchmaking(user_id, &ServerMessage::QueuePositionUpdate { queue_position }).await;
    }

    /// Rejects an unauthenticated message and closes the connection with
    /// "policy violation", as spec §4.9 requires.
    pub async fn reject_unauthenticated(&self, connection: &C) {
        connection.close(CloseCode::PolicyViolation).await;
    }

    /// Schedules the graceful close spec §4.9 calls for once a game reaches
    /// a terminal status: a 1-second delay, then "normal" close of both
    /// players and every spectator, and the spectator group is dropped.
    pub fn schedule_terminal_close(self: &Arc<Self>, game_id: GameId, white: PlayerId, black: PlayerId)
    where
        C: 'static,
    {
        let hub = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(TERMINAL_CLOSE_DELAY).await;
            hub.close_game_connections(game_id, white, black).await;
        });
    }

    async fn close_game_connections(&self, game_id: GameId, white: PlayerId, black: PlayerId) {
        if let Some(connection) = self.game.get(white) {
            connection.close(CloseCode::Normal).await;
            self.game.unregister(white);
        }
        if let Some(connection) = self.game.get(black) {
            connection.close(CloseCode::Normal).await;
            self.game.unregister(black);
        }
        for (user_id, connection) in self.spectator.members(game_id) {
            connection.close(CloseCode::Normal).await;
            self.spectator.unregister(game_id, user_id);
        }
        self.spectator.remove_group(game_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MockConnection;
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
    async fn broadcast_reaches_both_players_and_spectators() {
        let hub: SessionHub<MockConnection> = SessionHub::new();
        let (white, black) = (PlayerId::new(), PlayerId::new());
        let game_id = GameId::new();
        let sent = Arc::new(AtomicUsize::new(0));

        hub.register_game(white, Arc::new(counting_connection(Arc::clone(&sent))));
        hub.register_game(black, Arc::new(counting_connection(Arc::clone(&sent))));
        hub.register_spectator(game_id, UserId::new(), Arc::new(counting_connection(Arc::clone(&sent))));

        hub.broadcast_game(game_id, white, black, &ServerMessage::DrawRejected).await;
        assert_eq!(sent.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_send_unregisters_the_connection() {
        let hub: SessionHub<MockConnection> = SessionHub::new();
        let player = PlayerId::new();
        let mut mock = MockConnection::new();
        mock.expect_send().returning(|_| Err(common::Error::Transient("closed".into())));
        hub.register_game(player, Arc::new(mock));

        hub.send_to_player(player, &ServerMessage::DrawRejected).await;
        assert!(hub.game.get(player).is_none());
    }

    #[tokio::test]
    async fn register_replaces_stale_connection_on_reconnect() {
        let hub: SessionHub<MockConnection> = SessionHub::new();
        let user = UserId::new();
        let sent_first = Arc::new(AtomicUsize::new(0));
        let sent_second = Arc::new(AtomicUsize::new(0));

        hub.register_matchmaking(user, Arc::new(counting_connection(Arc::clone(&sent_first))));
        hub.register_matchmaking(user, Arc::new(counting_connection(Arc::clone(&sent_second))));

        hub.notify_queue_position(user, 1).await;
        assert_eq!(sent_first.load(Ordering::SeqCst), 0);
        assert_eq!(sent_second.load(Ordering::SeqCst), 1);
    }
}
