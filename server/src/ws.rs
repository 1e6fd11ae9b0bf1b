use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chess_game::GameRepository;
use chess_matchmaking::JoinOutcome;
use chess_session::{ChannelConnection, ChannelEvent, ClientMessage, CloseCode, Connection, ServerMessage};
use common::{GameId, PlayerId, UserId};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

/// A real-time connection backed by an Axum `WebSocket`, reached through an
/// unbounded channel so the Session Hub never blocks on a slow socket write.
pub struct WsConnection {
    inner: ChannelConnection,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&self, message: &ServerMessage) -> Result<(), common::Error> {
        self.inner.send(message).await
    }

    async fn close(&self, code: CloseCode) {
        self.inner.close(code).await
    }
}

fn axum_close_code(code: CloseCode) -> u16 {
    match code {
        CloseCode::Normal => 1000,
        CloseCode::PolicyViolation => 1008,
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[instrument(skip(state, ws))]
pub async fn matchmaking_handler(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let Some(user_id) = query.token.as_deref().and_then(|t| crate::auth::verify_token(t, &state.config.jwt_secret).ok())
    else {
        return ws.on_upgrade(close_unauthenticated);
    };
    ws.on_upgrade(move |socket| handle_matchmaking_socket(socket, state, user_id))
}

async fn handle_matchmaking_socket(socket: WebSocket, state: AppState, user_id: UserId) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connection = Arc::new(WsConnection { inner: ChannelConnection::new(tx) });
    state.hub.register_matchmaking(user_id, connection);

    let (sink, mut stream) = socket.split();
    tokio::spawn(pump_channel_into_socket(sink, rx));

    let queue_position = match state.matches.get_match_status(user_id).await.ok() {
        Some(chess_matchmaking::MatchStatus::Waiting { queue_position }) => queue_position,
        _ => 0,
    };
    state.hub.on_matchmaking_authenticated(user_id, queue_position).await;

    while let Some(Ok(Message::Text(text))) = stream.next().await {
        let Ok(client_message) = ClientMessage::from_json(&text) else { continue };
        match client_message {
            ClientMessage::JoinQueue => match state.matches.join_matchmaking(user_id).await {
                Ok(JoinOutcome::Waiting { queue_position }) => {
                    state.hub.notify_queue_position(user_id, queue_position).await;
                }
                Ok(JoinOutcome::Matched { game_id, your_colour }) => {
                    state.hub.notify_match_found(user_id, game_id, your_colour).await;
                }
                Err(err) => debug!(%err, "joinMatchmaking rejected"),
            },
            ClientMessage::LeaveQueue => {
                debug!(?user_id, "leaveQueue requested over matchmaking socket");
            }
            _ => warn!(?user_id, "unexpected client message on matchmaking socket"),
        }
    }

    state.hub.unregister_matchmaking(user_id);
}

#[instrument(skip(state, ws))]
pub async fn game_handler(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
    Query(query): Query<TokenQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let Some(user_id) = query.token.as_deref().and_then(|t| crate::auth::verify_token(t, &state.config.jwt_secret).ok())
    else {
        return ws.on_upgrade(close_unauthenticated);
    };
    ws.on_upgrade(move |socket| handle_game_socket(socket, state, game_id, user_id))
}

async fn handle_game_socket(socket: WebSocket, state: AppState, game_id: GameId, user_id: UserId) {
    let Some(game) = state.games.find_by_id(game_id).await.ok().flatten() else {
        close_unauthenticated(socket).await;
        return;
    };
    let Some(player) = [&game.white, &game.black].into_iter().find(|p| p.user_id == user_id) else {
        close_unauthenticated(socket).await;
        return;
    };
    let player_id = player.id;
    let side = player.side;

    let (tx, rx) = mpsc::unbounded_channel();
    let connection = Arc::new(WsConnection { inner: ChannelConnection::new(tx) });
    state.hub.register_game(player_id, connection);

    let (sink, mut stream) = socket.split();
    tokio::spawn(pump_channel_into_socket(sink, rx));

    state
        .hub
        .on_game_authenticated(player_id, game_id, game.position.to_fen(), game.status, game.position.side_to_move(), side)
        .await;

    while let Some(Ok(Message::Text(text))) = stream.next().await {
        let Ok(client_message) = ClientMessage::from_json(&text) else { continue };
        handle_game_client_message(&state, game_id, player_id, client_message).await;
    }

    if let Some(opponent_id) = state.games.find_by_id(game_id).await.ok().flatten().and_then(|g| g.opponent(player_id).map(|p| p.id)) {
        state.dispatcher.dispatch_presence(game_id, opponent_id, player_id, false).await;
    }
    state.hub.unregister_game(player_id);
}

async fn handle_game_client_message(state: &AppState, game_id: GameId, player_id: PlayerId, message: ClientMessage) {
    let lock = state.game_locks.lock_for(game_id);
    {
        let _guard = lock.lock().await;
        let Some(mut game) = state.games.find_by_id(game_id).await.ok().flatten() else { return };
        let white = game.white.id;
        let black = game.black.id;

        let outcome = match message {
            ClientMessage::MoveAttempt { from, to, promotion } => {
                let notation = format!("{from}{to}{}", promotion.unwrap_or_default());
                match notation.parse() {
                    Ok(mov) => game.make_move(player_id, mov),
                    Err(_) => Err(common::Error::InvalidEncoding(notation)),
                }
            }
            ClientMessage::OfferDraw => game.offer_draw(player_id),
            ClientMessage::AcceptDraw => game.accept_draw(player_id),
            ClientMessage::RejectDraw => game.reject_draw(player_id),
            ClientMessage::Resign => game.resign(player_id),
            ClientMessage::JoinQueue | ClientMessage::LeaveQueue => return,
        };

        match outcome {
            Ok(event) => {
                let terminal = game.status.is_terminal();
                let _ = state.games.save(&game).await;
                state.dispatcher.dispatch_game_event(game_id, white, black, &event).await;
                if terminal {
                    state.hub.schedule_terminal_close(game_id, white, black);
                }
            }
            Err(err) => {
                state.dispatcher.dispatch_move_rejected(player_id, err.to_string()).await;
            }
        }
    }
    crate::bot::maybe_play_bot_move(state.clone(), game_id).await;
}

#[instrument(skip(state, ws))]
pub async fn spectate_handler(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
    Query(query): Query<TokenQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let Some(user_id) = query.token.as_deref().and_then(|t| crate::auth::verify_token(t, &state.config.jwt_secret).ok())
    else {
        return ws.on_upgrade(close_unauthenticated);
    };
    ws.on_upgrade(move |socket| handle_spectate_socket(socket, state, game_id, user_id))
}

async fn handle_spectate_socket(socket: WebSocket, state: AppState, game_id: GameId, user_id: UserId) {
    let Some(game) = state.games.find_by_id(game_id).await.ok().flatten() else {
        close_unauthenticated(socket).await;
        return;
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let connection = Arc::new(WsConnection { inner: ChannelConnection::new(tx) });
    state.hub.register_spectator(game_id, user_id, Arc::clone(&connection));

    let (sink, mut stream) = socket.split();
    tokio::spawn(pump_channel_into_socket(sink, rx));

    let _ = connection.send(&ServerMessage::AuthSuccess).await;
    let _ = connection
        .send(&ServerMessage::game_state_sync(game_id, game.position.to_fen(), game.status, game.position.side_to_move(), None))
        .await;

    while stream.next().await.is_some() {
        // Spectators have no client-to-server variants (spec §6); any
        // incoming frame is simply drained until the socket closes.
    }

    state.hub.unregister_spectator(game_id, user_id);
}

async fn close_unauthenticated(mut socket: WebSocket) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame { code: 1008, reason: "policy violation".into() })))
        .await;
}

async fn pump_channel_into_socket(
    mut sink: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<ChannelEvent>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            ChannelEvent::Message(message) => {
                if sink.send(Message::Text(message.to_json().into())).await.is_err() {
                    break;
                }
            }
            ChannelEvent::Closed(code) => {
                let _ = sink
                    .send(Message::Close(Some(CloseFrame { code: axum_close_code(code), reason: "".into() })))
                    .await;
                break;
            }
        }
    }
}
