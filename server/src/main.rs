mod auth;
mod bot;
mod config;
mod http;
mod state;
mod user_directory;
mod ws;

use crate::bot::{BotGames, GameLocks};
use crate::config::{Config, Environment};
use crate::state::{AppMatchService, AppState};
use crate::user_directory::SqlxUserDirectory;
use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use chess_game::SqlxGameRepository;
use chess_matchmaking::{InMemoryMatchRepository, MatchService, MatchmakingQueue};
use chess_session::{EventDispatcher, SessionHub};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().context("loading configuration")?;
    info!(environment = ?config.environment, "starting chess server");

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .context("parsing CHESS_DATABASE_URL")?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_with(connect_options)
        .await
        .context("connecting to the database")?;

    SqlxGameRepository::init_schema(&pool).await.context("initialising game schema")?;
    SqlxUserDirectory::init_schema(&pool).await.context("initialising user schema")?;

    let games = Arc::new(SqlxGameRepository::new(pool.clone()));
    let users = Arc::new(SqlxUserDirectory::new(pool));
    let queue = Arc::new(MatchmakingQueue::new());
    let matches_repo = Arc::new(InMemoryMatchRepository::new());
    let hub: Arc<SessionHub<ws::WsConnection>> = Arc::new(SessionHub::new());
    let dispatcher = Arc::new(EventDispatcher::new(Arc::clone(&hub)));
    let matches: Arc<AppMatchService> = Arc::new(MatchService::new(queue, users, Arc::clone(&games), matches_repo));

    let state = AppState {
        config: Arc::new(config.clone()),
        games,
        hub: Arc::clone(&hub),
        dispatcher,
        matches: Arc::clone(&matches),
        bot_games: Arc::new(BotGames::new()),
        game_locks: Arc::new(GameLocks::new()),
    };

    spawn_match_cleanup_task(matches);

    let cors = build_cors_layer(&config)?;

    let app = Router::new()
        .merge(http::router())
        .route("/ws/matchmaking", get(ws::matchmaking_handler))
        .route("/ws/game/{game_id}", get(ws::game_handler))
        .route("/ws/spectate/{game_id}", get(ws::spectate_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.context("binding listen address")?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await.context("serving requests")?;

    Ok(())
}

/// Runs `cleanupExpiredMatches` periodically (spec §4.8: "must be callable
/// both on demand and periodically"), in addition to the on-demand call
/// `getMatchStatus` makes before answering.
fn spawn_match_cleanup_task(matches: Arc<AppMatchService>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            if let Err(err) = matches.cleanup_expired_matches().await {
                tracing::warn!(%err, "periodic match cleanup failed");
            }
        }
    });
}

fn build_cors_layer(config: &Config) -> Result<CorsLayer> {
    if config.cors_origins.is_empty() {
        return Ok(if config.environment == Environment::Development {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
        });
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<axum::http::HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .context("parsing CHESS_CORS_ORIGINS")?;

    Ok(CorsLayer::new().allow_origin(origins))
}
