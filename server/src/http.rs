use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use chess_game::{GameRepository, GameStatus};
use chess_matchmaking::JoinOutcome;
use chess_search::Difficulty;
use common::{Error, GameId, UserId};
use serde::{Deserialize, Serialize};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/games/{id}", get(get_game))
        .route("/api/games/{id}/moves", post(submit_move))
        .route("/api/games/vs-bot", post(play_vs_bot))
        .route("/api/matchmaking/queue", post(join_queue))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// The wire representation of a [`chess_game::Game`] (spec §6, "Game DTO").
///
/// `Game` itself isn't `Serialize` (its `Position` has no wire format of
/// its own), so HTTP handlers build this DTO out of its fields.
#[derive(Debug, Serialize)]
struct GameDto {
    id: GameId,
    white_user_id: UserId,
    black_user_id: UserId,
    fen: String,
    side_to_move: String,
    status: GameStatus,
}

impl From<chess_game::Game> for GameDto {
    fn from(game: chess_game::Game) -> Self {
        GameDto {
            id: game.id,
            white_user_id: game.white.user_id,
            black_user_id: game.black.user_id,
            side_to_move: game.position.side_to_move().to_string(),
            fen: game.position.to_fen(),
            status: game.status,
        }
    }
}

fn error_response(err: &Error) -> impl IntoResponse {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

async fn get_game(State(state): State<AppState>, Path(game_id): Path<GameId>) -> impl IntoResponse {
    match state.games.find_by_id(game_id).await {
        Ok(Some(game)) => (StatusCode::OK, Json(GameDto::from(game))).into_response(),
        Ok(None) => error_response(&Error::GameNotFound).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    from: String,
    to: String,
    promotion: Option<String>,
}

fn caller_user_id(headers: &HeaderMap, jwt_secret: &str) -> Result<UserId, Error> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::InvalidEncoding("missing bearer token".into()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::InvalidEncoding("malformed authorization header".into()))?;
    crate::auth::verify_token(token, jwt_secret)
}

async fn submit_move(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
    headers: HeaderMap,
    Json(body): Json<MoveRequest>,
) -> impl IntoResponse {
    let user_id = match caller_user_id(&headers, &state.config.jwt_secret) {
        Ok(user_id) => user_id,
        Err(err) => return error_response(&err).into_response(),
    };

    let lock = state.game_locks.lock_for(game_id);
    let response = {
        let _guard = lock.lock().await;

        let Ok(Some(mut game)) = state.games.find_by_id(game_id).await else {
            return error_response(&Error::GameNotFound).into_response();
        };

        let Some(player) = [&game.white, &game.black].into_iter().find(|p| p.user_id == user_id) else {
            return error_response(&Error::NotAParticipant).into_response();
        };
        let (player_id, white, black) = (player.id, game.white.id, game.black.id);

        let notation = format!("{}{}{}", body.from, body.to, body.promotion.unwrap_or_default());
        let mov = match notation.parse() {
            Ok(mov) => mov,
            Err(_) => return error_response(&Error::InvalidEncoding(notation)).into_response(),
        };

        match game.make_move(player_id, mov) {
            Ok(event) => {
                let terminal = game.status.is_terminal();
                if let Err(err) = state.games.save(&game).await {
                    return error_response(&err).into_response();
                }
                state.dispatcher.dispatch_game_event(game_id, white, black, &event).await;
                if terminal {
                    state.hub.schedule_terminal_close(game_id, white, black);
                }
                (StatusCode::OK, Json(GameDto::from(game))).into_response()
            }
            Err(err) => return error_response(&err).into_response(),
        }
    };

    crate::bot::maybe_play_bot_move(state, game_id).await;
    response
}

#[derive(Debug, Deserialize)]
struct PlayVsBotRequest {
    difficulty: Difficulty,
}

/// Creates a game against the built-in engine (spec §1), assigning colours
/// with the same random coin flip matchmaking uses. If the engine draws
/// White it moves immediately, before this request returns.
async fn play_vs_bot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PlayVsBotRequest>,
) -> impl IntoResponse {
    let user_id = match caller_user_id(&headers, &state.config.jwt_secret) {
        Ok(user_id) => user_id,
        Err(err) => return error_response(&err).into_response(),
    };

    let game = match crate::bot::create_vs_bot_game(&state, user_id, body.difficulty).await {
        Ok(game) => game,
        Err(err) => return error_response(&err).into_response(),
    };
    let game_id = game.id;

    crate::bot::maybe_play_bot_move(state.clone(), game_id).await;

    let Ok(Some(game)) = state.games.find_by_id(game_id).await else {
        return error_response(&Error::GameNotFound).into_response();
    };
    (StatusCode::CREATED, Json(GameDto::from(game))).into_response()
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
enum QueueResponse {
    #[serde(rename = "WAITING")]
    Waiting { queue_position: usize },
    #[serde(rename = "MATCHED")]
    Matched { game_id: GameId, your_color: String },
}

async fn join_queue(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let user_id = match caller_user_id(&headers, &state.config.jwt_secret) {
        Ok(user_id) => user_id,
        Err(err) => return error_response(&err).into_response(),
    };

    match state.matches.join_matchmaking(user_id).await {
        Ok(JoinOutcome::Waiting { queue_position }) => {
            (StatusCode::OK, Json(QueueResponse::Waiting { queue_position })).into_response()
        }
        Ok(JoinOutcome::Matched { game_id, your_colour }) => {
            state.hub.notify_match_found(user_id, game_id, your_colour).await;
            (StatusCode::OK, Json(QueueResponse::Matched { game_id, your_color: your_colour.to_string().to_lowercase() }))
                .into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}
